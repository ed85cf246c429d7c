//! Per-vocabulary pattern registries.
//!
//! A `Recognizer` is an immutable compiled pattern. Searching is a pure
//! function of `(text, pos)`; iteration goes through `Matches`, which owns
//! its cursor, so concurrent or nested scans never share position.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::framework::Framework;
use crate::model::HookKind;
use crate::scanner::unescape;

/// The slot a recognizer fills in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Suite,
    Test,
    Hook(HookKind),
    Step,
    Assertion,
    Command,
    /// The vocabulary's own import or reference line.
    Preamble,
    /// Anything shaped like a suite or test call, whatever its callback.
    Candidate,
}

/// One recognizer hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub slot: Slot,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset just past the match. For block declarations this is
    /// just past the opening `{`.
    pub end: usize,
    /// Unescaped title literal, if the slot has one.
    pub title: Option<String>,
    /// Captured command or verb name, if the slot has one.
    pub name: Option<String>,
    /// Whether the match ends with an opening `{`.
    pub opens_block: bool,
}

#[derive(Debug)]
pub struct Recognizer {
    slot: Slot,
    pattern: Regex,
}

impl Recognizer {
    fn new(slot: Slot, pattern: &str) -> Self {
        let pattern = Regex::new(pattern).expect("registry patterns are static and valid");
        Self { slot, pattern }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Find the first match starting at or after `pos`.
    pub fn find_at(&self, text: &str, pos: usize) -> Option<Declaration> {
        if pos > text.len() || !text.is_char_boundary(pos) {
            return None;
        }
        let caps = self.pattern.captures_at(text, pos)?;
        let whole = caps.get(0)?;
        let title = ["sq", "dq", "bq"]
            .iter()
            .find_map(|g| caps.name(g))
            .map(|m| unescape(m.as_str()));
        let name = caps.name("name").map(|m| m.as_str().to_string());
        Some(Declaration {
            slot: self.slot,
            start: whole.start(),
            end: whole.end(),
            title,
            name,
            opens_block: whole.as_str().ends_with('{'),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Iterate matches from the start of `text` with a fresh cursor.
    pub fn matches<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            recognizer: self,
            text,
            pos: 0,
        }
    }
}

/// Iterator over successive recognizer matches.
///
/// Each step advances the cursor by at least one character, even for an
/// empty match.
pub struct Matches<'r, 't> {
    recognizer: &'r Recognizer,
    text: &'t str,
    pos: usize,
}

impl Iterator for Matches<'_, '_> {
    type Item = Declaration;

    fn next(&mut self) -> Option<Declaration> {
        let found = self.recognizer.find_at(self.text, self.pos)?;
        self.pos = advance_past(self.text, found.start, found.end);
        Some(found)
    }
}

/// Next scan position after a match spanning `start..end`.
pub fn advance_past(text: &str, start: usize, end: usize) -> usize {
    if end > start {
        return end;
    }
    text[start..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| start + c.len_utf8())
}

/// All recognizers for one vocabulary.
#[derive(Debug)]
pub struct Registry {
    pub framework: Framework,
    pub suite: Recognizer,
    pub test: Recognizer,
    pub hooks: [Recognizer; 4],
    pub assertion: Recognizer,
    pub command: Recognizer,
    /// Step declarations; only step-based vocabularies have one.
    pub step: Option<Recognizer>,
    pub preamble: Recognizer,
    pub candidate: Recognizer,
}

impl Registry {
    /// The shared registry for a vocabulary.
    pub fn get(framework: Framework) -> &'static Registry {
        match framework {
            Framework::Cypress => &CYPRESS,
            Framework::Playwright => &PLAYWRIGHT,
            Framework::TestRail => &TESTRAIL,
        }
    }

    /// Recognizers for suite, test and hook declarations.
    pub fn declarations(&self) -> impl Iterator<Item = &Recognizer> {
        [&self.suite, &self.test].into_iter().chain(self.hooks.iter())
    }

    /// Earliest suite, test or hook declaration at or after `pos`.
    ///
    /// Ties at the same offset go to the longer match.
    pub fn next_declaration(&self, text: &str, pos: usize) -> Option<Declaration> {
        self.declarations()
            .filter_map(|r| r.find_at(text, pos))
            .min_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)))
    }
}

/// Quoted title literal, one named group per quote style.
const TITLE: &str = r#"\s*(?:'(?P<sq>(?:[^'\\]|\\.)*)'|"(?P<dq>(?:[^"\\]|\\.)*)"|`(?P<bq>(?:[^`\\]|\\.)*)`)"#;

/// `() => {`, `async () => {` or `function () {`
const CALLBACK: &str = r"\s*(?:async\s*)?(?:\(\s*\)\s*=>|function\s*\w*\s*\(\s*\))\s*\{";

/// `async ({ page }) => {` with any or no fixture list, `async` optional
const FIXTURE_CALLBACK: &str = r"\s*(?:async\s*)?\(\s*(?:\{[^}]*\})?\s*\)\s*=>\s*\{";

/// A call opening with a title, a variable title or a callback.
fn candidate(head: &str) -> Recognizer {
    Recognizer::new(
        Slot::Candidate,
        &format!(r#"{head}\s*\(\s*(?:['"`(]|async\b|function\b|[\w$.]+\s*,)"#),
    )
}

fn declaration(slot: Slot, head: &str, callback: &str) -> Recognizer {
    Recognizer::new(slot, &format!(r"{head}\s*\({TITLE}\s*,{callback}"))
}

fn hook(kind: HookKind, head: &str, callback: &str) -> Recognizer {
    Recognizer::new(Slot::Hook(kind), &format!(r"{head}\s*\({callback}"))
}

static CYPRESS: Lazy<Registry> = Lazy::new(|| Registry {
    framework: Framework::Cypress,
    suite: declaration(Slot::Suite, r"\b(?:describe|context)(?:\.only|\.skip)?", CALLBACK),
    test: declaration(Slot::Test, r"\b(?:it|specify)(?:\.only|\.skip)?", CALLBACK),
    hooks: [
        hook(HookKind::BeforeAll, r"\bbefore", CALLBACK),
        hook(HookKind::AfterAll, r"\bafter", CALLBACK),
        hook(HookKind::BeforeEach, r"\bbeforeEach", CALLBACK),
        hook(HookKind::AfterEach, r"\bafterEach", CALLBACK),
    ],
    assertion: Recognizer::new(
        Slot::Assertion,
        r"\.(?P<name>should|and)\s*\(|\b(?P<chai>expect)\s*\(",
    ),
    command: Recognizer::new(Slot::Command, r"\bcy\s*\.\s*(?P<name>[\w$]+)\s*\("),
    step: None,
    preamble: Recognizer::new(Slot::Preamble, r#"^///\s*<reference\s+types\s*=\s*["']cypress["']"#),
    candidate: candidate(r"\b(?:describe|context|it|specify)(?:\.only|\.skip)?"),
});

static PLAYWRIGHT: Lazy<Registry> = Lazy::new(|| Registry {
    framework: Framework::Playwright,
    suite: declaration(
        Slot::Suite,
        r"\btest\.describe(?:\.only|\.skip|\.serial|\.parallel)?",
        CALLBACK,
    ),
    test: declaration(Slot::Test, r"\btest(?:\.only|\.skip|\.fixme)?", FIXTURE_CALLBACK),
    hooks: [
        hook(HookKind::BeforeAll, r"\btest\.beforeAll", FIXTURE_CALLBACK),
        hook(HookKind::AfterAll, r"\btest\.afterAll", FIXTURE_CALLBACK),
        hook(HookKind::BeforeEach, r"\btest\.beforeEach", FIXTURE_CALLBACK),
        hook(HookKind::AfterEach, r"\btest\.afterEach", FIXTURE_CALLBACK),
    ],
    assertion: Recognizer::new(
        Slot::Assertion,
        r"\bexpect\s*\([^;]*?\)\s*\.\s*(?:not\s*\.\s*)?(?P<name>to\w+)\s*\(",
    ),
    command: Recognizer::new(Slot::Command, r"\bpage\s*\.\s*(?P<name>[\w$]+)\s*\("),
    step: None,
    preamble: Recognizer::new(Slot::Preamble, r#"['"]@playwright/test['"]"#),
    candidate: candidate(r"\btest(?:\.describe)?(?:\.only|\.skip|\.fixme|\.serial|\.parallel)?"),
});

static TESTRAIL: Lazy<Registry> = Lazy::new(|| Registry {
    framework: Framework::TestRail,
    suite: declaration(Slot::Suite, r"\bsuite", CALLBACK),
    test: declaration(Slot::Test, r"\b(?:test_case|testCase)", CALLBACK),
    hooks: [
        hook(HookKind::BeforeAll, r"\bbeforeAll", CALLBACK),
        hook(HookKind::AfterAll, r"\bafterAll", CALLBACK),
        hook(HookKind::BeforeEach, r"\bbeforeEach", CALLBACK),
        hook(HookKind::AfterEach, r"\bafterEach", CALLBACK),
    ],
    assertion: Recognizer::new(
        Slot::Assertion,
        r#"\bstep\s*\(\s*['"`](?P<name>Verify)\b|\bassert\s*\.\s*(?P<verb>\w+)\s*\("#,
    ),
    command: Recognizer::new(Slot::Command, &format!(r"\bstep\s*\({TITLE}")),
    step: Some(Recognizer::new(
        Slot::Step,
        &format!(r"\bstep\s*\({TITLE}(?:\s*,{CALLBACK})?"),
    )),
    preamble: Recognizer::new(Slot::Preamble, r#"['"]@testrail/api['"]"#),
    candidate: candidate(r"\b(?:suite|test_case|testCase)"),
});
