//! Advisory warnings for constructs without a direct equivalent.
//!
//! Each ordered pair has a fixed table. An entry fires once when any of
//! its triggers occurs anywhere in the source; messages keep table order.

use crate::framework::Framework;

#[derive(Debug)]
pub struct Advisory {
    pub triggers: &'static [&'static str],
    pub message: &'static str,
}

const fn advisory(triggers: &'static [&'static str], message: &'static str) -> Advisory {
    Advisory { triggers, message }
}

static CYPRESS_TO_PLAYWRIGHT: &[Advisory] = &[
    advisory(
        &["cy.intercept("],
        "Cypress intercept commands need manual conversion to Playwright route.fulfill()",
    ),
    advisory(
        &["cy.wait("],
        "Consider replacing cy.wait() with more specific Playwright waitFor conditions",
    ),
    advisory(
        &["cy.fixture("],
        "Fixture files need manual conversion to Playwright fixtures or JSON imports",
    ),
    advisory(
        &["cy.session("],
        "Session caching needs manual conversion to Playwright storageState",
    ),
];

static CYPRESS_TO_TESTRAIL: &[Advisory] = &[
    advisory(
        &["cy.intercept("],
        "Network interception commands cannot be directly converted to TestRail steps",
    ),
    advisory(&["cy.wait("], "Wait commands will need manual review in TestRail steps"),
    advisory(
        &["cy.fixture("],
        "Fixture usage will need to be handled differently in TestRail",
    ),
];

static PLAYWRIGHT_TO_CYPRESS: &[Advisory] = &[
    advisory(
        &["route.fulfill", "page.route("],
        "Playwright route.fulfill() needs manual conversion to cy.intercept()",
    ),
    advisory(
        &["waitForLoadState"],
        "Consider replacing waitForLoadState with appropriate Cypress commands",
    ),
    advisory(
        &["context."],
        "Browser context management needs manual conversion for Cypress",
    ),
    advisory(
        &["expect("],
        "Some assertions might need manual adjustment for Cypress syntax",
    ),
];

static PLAYWRIGHT_TO_TESTRAIL: &[Advisory] = &[
    advisory(
        &["route.fulfill", "page.route("],
        "Network interception commands cannot be directly converted to TestRail steps",
    ),
    advisory(
        &["waitForLoadState", "waitForTimeout", "waitForSelector"],
        "Wait commands will need manual review in TestRail steps",
    ),
    advisory(
        &["storageState"],
        "Storage state handling will need to be managed differently in TestRail",
    ),
];

static TESTRAIL_TO_CYPRESS: &[Advisory] = &[advisory(
    &["step("],
    "Some TestRail steps may require manual adjustment for Cypress syntax",
)];

static TESTRAIL_TO_PLAYWRIGHT: &[Advisory] = &[
    advisory(
        &["step("],
        "Some TestRail steps may require manual adjustment for Playwright syntax",
    ),
    advisory(
        &["Wait for", "Navigate to"],
        "Consider adding explicit waitFor statements for better reliability",
    ),
];

/// The advisory table for an ordered pair; empty for `source == target`.
pub fn table(source: Framework, target: Framework) -> &'static [Advisory] {
    use Framework::*;
    match (source, target) {
        (Cypress, Playwright) => CYPRESS_TO_PLAYWRIGHT,
        (Cypress, TestRail) => CYPRESS_TO_TESTRAIL,
        (Playwright, Cypress) => PLAYWRIGHT_TO_CYPRESS,
        (Playwright, TestRail) => PLAYWRIGHT_TO_TESTRAIL,
        (TestRail, Cypress) => TESTRAIL_TO_CYPRESS,
        (TestRail, Playwright) => TESTRAIL_TO_PLAYWRIGHT,
        _ => &[],
    }
}

/// Table warnings for `source` text converted from `from` to `to`.
pub fn generate_warnings(text: &str, from: Framework, to: Framework) -> Vec<String> {
    table(from, to)
        .iter()
        .filter(|a| a.triggers.iter().any(|t| text.contains(t)))
        .map(|a| a.message.to_string())
        .collect()
}

/// Append `extra` to `warnings`, dropping messages already present.
pub fn merge(warnings: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for message in extra {
        if !warnings.contains(&message) {
            warnings.push(message);
        }
    }
}
