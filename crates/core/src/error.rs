//! Error types for the conversion engine

use thiserror::Error;

use crate::framework::Framework;

/// Result type alias using the engine Error
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error types
///
/// None of these cross the `Converter::convert` boundary; they are folded
/// into a failed `ConversionResult` instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported conversion: {from} -> {to}")]
    UnsupportedPair { from: Framework, to: Framework },

    #[error("Unknown framework: {0}")]
    UnknownFramework(String),

    #[error("Emit error: {0}")]
    Emit(#[from] std::fmt::Error),

    #[error("Invalid style option: {0}")]
    InvalidStyle(String),
}
