//! CLI Commands

pub mod convert;
pub mod detect;
pub mod pairs;

use std::process::ExitCode;

/// How a command finished, short of an IO or usage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The engine reported a failed conversion.
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::from(1),
        }
    }
}
