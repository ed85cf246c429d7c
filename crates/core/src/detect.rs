//! Framework detection by distinctive signatures.
//!
//! Signatures are checked in `Framework::ALL` order and the first
//! vocabulary with any matching signature wins. Mixed files therefore
//! resolve to the earlier vocabulary; no confidence scoring is attempted.

use once_cell::sync::Lazy;
use regex::RegexSet;
use tracing::debug;

use crate::framework::Framework;

static SIGNATURES: Lazy<Vec<(Framework, RegexSet)>> = Lazy::new(|| {
    let table: [(Framework, &[&str]); 3] = [
        (Framework::Cypress, &[r"\bcy\."]),
        (
            Framework::Playwright,
            &[
                r"\btest\s*\(",
                r"\btest\.describe\s*\(",
                r"\bpage\.[A-Za-z_$]",
                r"@playwright/test",
            ],
        ),
        (
            Framework::TestRail,
            &[r"\btest_case\s*\(", r"\btestCase\s*\(", r"\bsuite\s*\(", r"@testrail"],
        ),
    ];
    table
        .into_iter()
        .map(|(framework, patterns)| {
            let set = RegexSet::new(patterns).expect("detector signatures are static and valid");
            (framework, set)
        })
        .collect()
});

/// Classify a source text, or `None` if no signature is present.
pub fn detect_framework(source: &str) -> Option<Framework> {
    let detected = SIGNATURES
        .iter()
        .find(|(_, set)| set.is_match(source))
        .map(|(framework, _)| *framework);
    debug!(?detected, len = source.len(), "detected framework");
    detected
}
