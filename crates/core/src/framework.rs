//! The three test-authoring vocabularies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A test-authoring vocabulary the engine can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Browser-command style: `describe`/`it`, `cy.visit(...)`, `.should(...)`
    Cypress,
    /// Locator/await style: `test.describe`/`test`, `await page.goto(...)`
    Playwright,
    /// Step-based reporting style: `suite`/`test_case`, `step('...')`
    TestRail,
}

impl Framework {
    /// All frameworks, in detection priority order.
    pub const ALL: [Framework; 3] = [Framework::Cypress, Framework::Playwright, Framework::TestRail];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Cypress => "cypress",
            Framework::Playwright => "playwright",
            Framework::TestRail => "testrail",
        }
    }

    /// Whether the vocabulary expresses assertions as discrete steps
    /// rather than inline expressions.
    pub fn is_step_based(&self) -> bool {
        matches!(self, Framework::TestRail)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cypress" | "cy" => Ok(Framework::Cypress),
            "playwright" | "pw" => Ok(Framework::Playwright),
            "testrail" | "tr" => Ok(Framework::TestRail),
            other => Err(Error::UnknownFramework(other.to_string())),
        }
    }
}
