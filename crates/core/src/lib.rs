//! testbridge core library
//!
//! Parses Cypress, Playwright and TestRail test sources into a structural
//! model and re-emits them in another of the three vocabularies.

pub mod converter;
pub mod detect;
pub mod emit;
pub mod error;
pub mod framework;
pub mod lower;
pub mod model;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod style;
pub mod vocabulary;
pub mod warnings;

// Re-export commonly used types
pub use converter::{convert, Converter};
pub use detect::detect_framework;
pub use error::{Error, Result};
pub use framework::Framework;
pub use model::{Assertion, ConversionResult, Document, HookKind, Subject, TestCase, TestSuite};
pub use parser::StructuralParser;
pub use style::{Indent, QuoteStyle, StyleOptions};
pub use vocabulary::{Action, Expectation, Mapped};

/// testbridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
