//! Structural parser.
//!
//! Walks a source text with a vocabulary's recognizers and builds the
//! suite/test/hook tree. Each scope is scanned with its own cursor; a
//! nested suite is parsed from its own body slice, so no recognizer ever
//! sees sibling or outer content.

use tracing::trace;

use crate::framework::Framework;
use crate::model::{Assertion, Document, Hooks, Subject, TestCase, TestSuite};
use crate::registry::{advance_past, Registry, Slot};
use crate::scanner::{extract_block, find_close, hidden_spans, in_spans, split_statements};
use crate::vocabulary::Mapped;
use crate::lower;

/// Declarations found directly in one scope.
#[derive(Debug, Default)]
struct Scope {
    suites: Vec<TestSuite>,
    tests: Vec<TestCase>,
    hooks: Hooks,
    passthrough: Vec<String>,
    unterminated: Vec<String>,
}

pub struct StructuralParser {
    registry: &'static Registry,
}

impl StructuralParser {
    pub fn new(framework: Framework) -> Self {
        Self {
            registry: Registry::get(framework),
        }
    }

    pub fn framework(&self) -> Framework {
        self.registry.framework
    }

    /// Parse a whole file.
    pub fn parse(&self, source: &str) -> Document {
        let scope = self.parse_scope(source);
        Document {
            suites: scope.suites,
            tests: scope.tests,
            hooks: scope.hooks,
            passthrough: scope.passthrough,
            unterminated: scope.unterminated,
        }
    }

    /// Top-level suites of `source`, in source order.
    pub fn parse_suites(&self, source: &str) -> Vec<TestSuite> {
        self.parse_scope(source).suites
    }

    /// Tests declared directly in `source`, outside any suite.
    pub fn parse_test_cases(&self, source: &str) -> Vec<TestCase> {
        self.parse_scope(source).tests
    }

    fn parse_scope(&self, text: &str) -> Scope {
        let mut scope = Scope::default();
        let hidden = hidden_spans(text);
        // `pos` is the search cursor; `gap` is where unclaimed text begins.
        let mut pos = 0;
        let mut gap = 0;

        loop {
            let decl = self.registry.next_declaration(text, pos);
            let rejected = self
                .registry
                .candidate
                .find_at(text, pos)
                .filter(|c| decl.as_ref().map_or(true, |d| c.start < d.start));

            if let Some(head) = rejected {
                if !in_spans(&hidden, head.start) {
                    // A call we cannot read stays in the gap, whole.
                    trace!(start = head.start, "unrecognized declaration");
                    pos = call_end(text, head.start).unwrap_or(text.len());
                } else {
                    pos = advance_past(text, head.start, head.start);
                }
                continue;
            }

            let decl = match decl {
                Some(decl) => decl,
                None => break,
            };
            if in_spans(&hidden, decl.start) {
                pos = advance_past(text, decl.start, decl.start);
                continue;
            }

            self.keep_gap(&mut scope, &text[gap..decl.start]);
            let block = extract_block(text, decl.end);
            let title = decl.title.unwrap_or_default();
            trace!(slot = ?decl.slot, title = %title, start = decl.start, closed = block.closed, "declaration");

            if !block.closed {
                scope.unterminated.push(match decl.slot {
                    Slot::Hook(kind) => format!("{:?}", kind),
                    _ => title.clone(),
                });
            }

            match decl.slot {
                Slot::Suite => {
                    let inner = self.parse_scope(block.body);
                    scope.unterminated.extend(inner.unterminated);
                    scope.suites.push(TestSuite {
                        title,
                        tests: inner.tests,
                        hooks: inner.hooks,
                        suites: inner.suites,
                        passthrough: inner.passthrough,
                    });
                }
                Slot::Test => scope.tests.push(self.test_case(title, block.body)),
                Slot::Hook(kind) => scope.hooks.push(kind, block.body.to_string()),
                _ => {}
            }

            let end = call_end(text, decl.start)
                .filter(|&end| end >= block.end)
                .unwrap_or(block.end);
            pos = advance_past(text, decl.start, end);
            gap = pos.min(text.len());
        }

        self.keep_gap(&mut scope, &text[gap..]);
        scope
    }

    /// Keep the statements of text no declaration claimed.
    fn keep_gap(&self, scope: &mut Scope, gap: &str) {
        scope.passthrough.extend(
            split_statements(gap)
                .into_iter()
                .filter(|stmt| !self.registry.preamble.is_match(stmt))
                .map(str::to_string),
        );
    }

    fn test_case(&self, title: String, body: &str) -> TestCase {
        TestCase {
            title,
            body: body.to_string(),
            assertions: self.assertions(body),
        }
    }

    /// Assertions recognized in a test body, in order.
    pub fn assertions(&self, body: &str) -> Vec<Assertion> {
        let framework = self.registry.framework;
        split_statements(body)
            .into_iter()
            .filter(|stmt| self.registry.assertion.is_match(stmt))
            .flat_map(|stmt| {
                let found = lower::assertions(framework, stmt);
                if found.is_empty() {
                    vec![self.opaque_assertion(stmt)]
                } else {
                    found
                }
            })
            .collect()
    }

    /// Record for an assertion whose shape is not understood.
    fn opaque_assertion(&self, stmt: &str) -> Assertion {
        let verb = self
            .registry
            .assertion
            .find_at(stmt, 0)
            .and_then(|d| d.name)
            .unwrap_or_else(|| "expect".to_string());
        Assertion {
            subject: Subject::Value(stmt.to_string()),
            expectation: Mapped::Unrecognized(verb),
            negated: false,
            argument: None,
            source: stmt.to_string(),
        }
    }
}

/// Offset just past the call opening at `start`, including a trailing `;`.
fn call_end(text: &str, start: usize) -> Option<usize> {
    let open = start + text[start..].find('(')?;
    let end = find_close(text, open)? + 1;
    let rest = text[end..].trim_start_matches(|c: char| c == ' ' || c == '\t');
    Some(if rest.starts_with(';') {
        text.len() - rest.len() + 1
    } else {
        end
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HookKind;

    #[test]
    fn test_suite_with_hooks_and_tests() {
        let src = r#"
describe('Cart', () => {
    before(() => { cy.task('seed') })
    beforeEach(() => {
        cy.visit('/cart')
    })
    afterEach(() => { cy.clearCookies() })
    it('adds', () => {
        cy.get('.add').click()
        cy.get('.count').should('have.text', '1')
    })
    it('removes', () => {
        cy.get('.remove').click()
    })
})
"#;
        let doc = StructuralParser::new(Framework::Cypress).parse(src);
        assert_eq!(doc.suites.len(), 1);
        let suite = &doc.suites[0];
        assert_eq!(suite.title, "Cart");
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.tests[0].assertions.len(), 1);
        assert_eq!(suite.tests[1].assertions.len(), 0);
        assert_eq!(suite.hooks.get(HookKind::BeforeAll).len(), 1);
        assert_eq!(suite.hooks.get(HookKind::BeforeEach).len(), 1);
        assert!(suite.hooks.get(HookKind::BeforeEach)[0].contains("cy.visit('/cart')"));
        assert_eq!(suite.hooks.get(HookKind::AfterEach).len(), 1);
        assert!(doc.unterminated.is_empty());
    }

    #[test]
    fn test_nested_suites_keep_their_tests() {
        let src = "describe('outer', () => {\n  it('a', () => {})\n  describe('inner', () => {\n    it('b', () => {})\n    it('c', () => {})\n  })\n  it('d', () => {})\n})";
        let suites = StructuralParser::new(Framework::Cypress).parse_suites(src);
        assert_eq!(suites.len(), 1);
        let outer = &suites[0];
        let titles: Vec<_> = outer.tests.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "d"]);
        assert_eq!(outer.suites.len(), 1);
        assert_eq!(outer.suites[0].tests.len(), 2);
        assert_eq!(outer.test_count(), 4);
    }

    #[test]
    fn test_standalone_tests() {
        let src = "test('one', async ({ page }) => {\n  await page.goto('/')\n})\ntest('two', async () => {})";
        let parser = StructuralParser::new(Framework::Playwright);
        let tests = parser.parse_test_cases(src);
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[1].title, "two");
        assert!(parser.parse_suites(src).is_empty());
    }

    #[test]
    fn test_truncated_suite_is_recorded() {
        let src = "describe('broken', () => {\n  it('never closes', () => {\n    cy.visit('/')";
        let doc = StructuralParser::new(Framework::Cypress).parse(src);
        assert_eq!(doc.suites.len(), 1);
        assert_eq!(doc.suites[0].tests.len(), 1);
        assert_eq!(doc.unterminated, vec!["broken".to_string(), "never closes".to_string()]);
    }

    #[test]
    fn test_statements_between_declarations_are_kept() {
        let src = r#"/// <reference types="cypress" />
import { login } from './helpers'
const user = 'bob'

describe('S', () => {
  const token = 'abc'
  it('uses done', (done) => {
    cy.visit('/a')
    done()
  })
  it('ok', () => {
    cy.visit('/ok')
  });
})
"#;
        let doc = StructuralParser::new(Framework::Cypress).parse(src);
        assert_eq!(doc.passthrough, vec!["import { login } from './helpers'", "const user = 'bob'"]);
        let suite = &doc.suites[0];
        assert_eq!(
            suite.passthrough,
            vec![
                "const token = 'abc'",
                "it('uses done', (done) => {\n    cy.visit('/a')\n    done()\n  })",
            ]
        );
        let titles: Vec<_> = suite.tests.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["ok"]);
        assert!(doc.unterminated.is_empty());
    }

    #[test]
    fn test_declarations_in_comments_and_strings_are_ignored() {
        let src = "describe('S', () => {\n  // it('old', () => {\n  it('new', () => {\n    cy.visit('/n')\n  })\n  /* it('gone', () => { */\n  const label = \"it('x', () => {\"\n})";
        let doc = StructuralParser::new(Framework::Cypress).parse(src);
        assert!(doc.unterminated.is_empty());
        let suite = &doc.suites[0];
        let titles: Vec<_> = suite.tests.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["new"]);
        assert_eq!(suite.tests[0].body.trim(), "cy.visit('/n')");
        assert_eq!(
            suite.passthrough,
            vec![
                "// it('old', () => {",
                "/* it('gone', () => { */",
                "const label = \"it('x', () => {\"",
            ]
        );
    }

    #[test]
    fn test_playwright_sync_test_is_recognized() {
        let src = "import { test, expect } from '@playwright/test';\n\ntest('sync', ({ page }) => {\n  page.goto('/s')\n})";
        let doc = StructuralParser::new(Framework::Playwright).parse(src);
        assert_eq!(doc.tests.len(), 1);
        assert_eq!(doc.tests[0].title, "sync");
        assert!(doc.passthrough.is_empty());
    }

    #[test]
    fn test_opaque_assertion_is_counted() {
        let body = "cy.get('li').should(($li) => { expect($li).to.have.length(3) })";
        let found = StructuralParser::new(Framework::Cypress).assertions(body);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].expectation, Mapped::Unrecognized("should".into()));
    }

    #[test]
    fn test_testrail_steps_and_verifications() {
        let src = "suite('Login', () => {\n  test_case('valid', () => {\n    step('Navigate to /login')\n    step('Verify page has URL \"/home\"')\n  })\n})";
        let doc = StructuralParser::new(Framework::TestRail).parse(src);
        let case = &doc.suites[0].tests[0];
        assert_eq!(case.title, "valid");
        assert_eq!(case.assertions.len(), 1);
        assert_eq!(case.assertions[0].subject, Subject::Page);
    }
}
