//! Structural model produced by the parser and consumed by the converter.
//!
//! Everything here is built fresh for each conversion and owned by the
//! `Document` it came from.

use serde::Serialize;

use crate::vocabulary::{Action, Expectation, Mapped};

/// Setup/teardown hook kinds, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl HookKind {
    pub const ALL: [HookKind; 4] = [
        HookKind::BeforeAll,
        HookKind::AfterAll,
        HookKind::BeforeEach,
        HookKind::AfterEach,
    ];
}

/// Raw hook bodies of one scope, each kind in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hooks {
    pub before_all: Vec<String>,
    pub after_all: Vec<String>,
    pub before_each: Vec<String>,
    pub after_each: Vec<String>,
}

impl Hooks {
    pub fn get(&self, kind: HookKind) -> &[String] {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::AfterAll => &self.after_all,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
        }
    }

    pub fn push(&mut self, kind: HookKind, body: String) {
        match kind {
            HookKind::BeforeAll => self.before_all.push(body),
            HookKind::AfterAll => self.after_all.push(body),
            HookKind::BeforeEach => self.before_each.push(body),
            HookKind::AfterEach => self.after_each.push(body),
        }
    }

    pub fn is_empty(&self) -> bool {
        HookKind::ALL.iter().all(|&k| self.get(k).is_empty())
    }
}

/// One element query in a locator chain, e.g. `get('#login')`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub action: Action,
    /// Argument expression as written, quotes included.
    pub selector: String,
}

/// What an assertion is made about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// The page itself (URL and title checks)
    Page,
    /// An element reached through a non-empty chain of queries
    Element(Vec<Query>),
    /// A plain expression, as in `expect(count).to.equal(3)`
    Value(String),
}

impl Subject {
    /// The innermost query of an element subject.
    pub fn last_query(&self) -> Option<&Query> {
        match self {
            Subject::Element(chain) => chain.last(),
            _ => None,
        }
    }
}

/// A recognized assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assertion {
    pub subject: Subject,
    pub expectation: Mapped<Expectation>,
    pub negated: bool,
    /// Expected-value expression as written, quotes included.
    pub argument: Option<String>,
    /// The statement the assertion was recognized in.
    pub source: String,
}

/// A leaf test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub title: String,
    /// Raw, untranslated body text.
    pub body: String,
    pub assertions: Vec<Assertion>,
}

/// A named group of tests and hooks. Zero tests is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestSuite {
    pub title: String,
    pub tests: Vec<TestCase>,
    pub hooks: Hooks,
    /// Suites declared directly inside this one, in source order.
    pub suites: Vec<TestSuite>,
    /// Statements between declarations, kept verbatim in source order.
    pub passthrough: Vec<String>,
}

impl TestSuite {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Number of tests in this suite and all nested suites.
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.suites.iter().map(TestSuite::test_count).sum::<usize>()
    }
}

/// The top-level scope of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub suites: Vec<TestSuite>,
    /// Tests not wrapped by any suite.
    pub tests: Vec<TestCase>,
    pub hooks: Hooks,
    /// File-level statements outside any declaration, in source order.
    /// The source vocabulary's own import line is not kept.
    pub passthrough: Vec<String>,
    /// Titles of declarations whose body ran to end of input.
    pub unterminated: Vec<String>,
}

impl Document {
    /// True when no suite, test or hook declaration was recognized.
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty() && self.tests.is_empty() && self.hooks.is_empty()
    }
}

/// Outcome of one conversion, as handed to external callers.
///
/// `success == false` implies `converted_code` is empty and `errors` is
/// non-empty. Warnings may be present either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub success: bool,
    pub converted_code: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConversionResult {
    pub fn success(converted_code: String, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            converted_code,
            warnings,
            errors: Vec::new(),
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            converted_code: String::new(),
            warnings: Vec::new(),
            errors: vec![error.to_string()],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
