//! End-to-end conversion tests
//!
//! Exercises the full parse → lower → emit pipeline across all six
//! vocabulary pairs.

use std::thread;

use regex::Regex;
use testbridge_core::{
    convert, detect_framework, Converter, Framework, Indent, QuoteStyle, StructuralParser,
    StyleOptions,
};

const LOGIN_SPEC: &str = "describe('Login', () => { it('works', () => { cy.visit('/login'); }); });";

fn structure(framework: Framework, text: &str) -> (Vec<String>, Vec<String>, usize) {
    let doc = StructuralParser::new(framework).parse(text);
    let suites = doc.suites.iter().map(|s| s.title.clone()).collect();
    let tests: Vec<_> = doc.suites.iter().flat_map(|s| s.tests.iter()).collect();
    let assertions = tests.iter().map(|t| t.assertions.len()).sum();
    let titles = tests.iter().map(|t| t.title.clone()).collect();
    (suites, titles, assertions)
}

fn step_titles(text: &str) -> Vec<String> {
    let re = Regex::new(r"step\('((?:[^'\\]|\\.)*)'").unwrap();
    re.captures_iter(text).map(|c| c[1].to_string()).collect()
}

#[test]
fn test_login_spec_to_playwright() {
    let result = convert(LOGIN_SPEC, Framework::Cypress, Framework::Playwright);
    assert!(result.success, "{:?}", result.errors);
    let expected = "\
import { test, expect } from '@playwright/test';

test.describe('Login', () => {
    test('works', async ({ page }) => {
        await page.goto('/login');
    });
});

";
    assert_eq!(result.converted_code, expected);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_interception_and_wait_warn_for_step_target() {
    let src = r#"
describe('Network', () => {
    it('stubs users', () => {
        cy.intercept('GET', '/api/users', { fixture: 'users.json' })
        cy.visit('/users')
        cy.wait(500)
    })
})
"#;
    let result = convert(src, Framework::Cypress, Framework::TestRail);
    assert!(result.success);
    assert!(result.warnings.len() >= 2);
    assert!(result.warnings.iter().any(|w| w.contains("Network interception")));
    assert!(result.warnings.iter().any(|w| w.contains("Wait commands")));
    assert!(result.converted_code.contains("step('Navigate to /users', () => {"));
    assert!(result.converted_code.contains("step('Wait for 500', () => {"));

    let src = "test('t', async ({ page }) => {\n  await page.route('**/api', r => r.fulfill({ body: '[]' }))\n  await page.waitForLoadState('networkidle')\n})";
    let result = convert(src, Framework::Playwright, Framework::TestRail);
    assert!(result.success);
    assert!(result.warnings.len() >= 2);
}

#[test]
fn test_empty_input_for_every_pair() {
    for (from, to) in Converter::pairs() {
        let result = convert("", from, to);
        assert!(result.success);
        assert_eq!(result.converted_code, "");
        assert!(result.warnings.is_empty(), "{from} -> {to}");
        assert!(result.errors.is_empty());
    }
}

#[test]
fn test_sibling_suites_are_independent() {
    let src = r#"
describe('First', () => {
    it('one', () => { cy.visit('/1') })
    it('two', () => { cy.visit('/2') })
})

describe('Second', () => {
    it('three', () => { cy.visit('/3') })
})
"#;
    let suites = StructuralParser::new(Framework::Cypress).parse_suites(src);
    assert_eq!(suites.len(), 2);
    let titles = |i: usize| suites[i].tests.iter().map(|t| t.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles(0), vec!["one", "two"]);
    assert_eq!(titles(1), vec!["three"]);
}

#[test]
fn test_interleaved_conversions_do_not_interfere() {
    let converter = Converter::new(Framework::Cypress, Framework::Playwright).unwrap();
    let a = "describe('Alpha', () => { it('a1', () => { cy.visit('/a') }); it('a2', () => {}) })";
    let b = "describe('Beta', () => { it('b1', () => { cy.get('#b').should('exist') }) })";

    let first_a = converter.convert(a);
    let first_b = converter.convert(b);
    let second_a = converter.convert(a);
    assert_eq!(first_a, second_a);
    assert!(first_a.converted_code.contains("'a2'"));
    assert!(!first_a.converted_code.contains("Beta"));
    assert!(!first_b.converted_code.contains("Alpha"));

    let (suites, tests, assertions) = structure(Framework::Playwright, &first_b.converted_code);
    assert_eq!(suites, vec!["Beta"]);
    assert_eq!(tests, vec!["b1"]);
    assert_eq!(assertions, 1);
}

#[test]
fn test_parallel_conversions_match_their_input() {
    let converter = Converter::new(Framework::Cypress, Framework::TestRail).unwrap();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let converter = &converter;
                scope.spawn(move || {
                    let tests: String = (0..i)
                        .map(|j| format!("it('t{i}-{j}', () => {{ cy.visit('/{j}') }})\n"))
                        .collect();
                    let src = format!("describe('suite {i}', () => {{\n{tests}}})");
                    (i, converter.convert(&src))
                })
            })
            .collect();
        for handle in handles {
            let (i, result) = handle.join().unwrap();
            assert!(result.success);
            let (suites, tests, _) = structure(Framework::TestRail, &result.converted_code);
            assert_eq!(suites, vec![format!("suite {i}")]);
            assert_eq!(tests.len(), i);
            assert!(tests.iter().all(|t| t.starts_with(&format!("t{i}-"))));
        }
    });
}

#[test]
fn test_round_trip_keeps_structure() {
    let src = r#"
describe('Profile', () => {
    it('shows the name', () => {
        cy.visit('/profile')
        cy.get('.name').should('have.text', 'Ada')
        cy.get('.error').should('not.exist')
    })
})
"#;
    let there = convert(src, Framework::Cypress, Framework::Playwright);
    assert!(there.success);
    let back = convert(&there.converted_code, Framework::Playwright, Framework::Cypress);
    assert!(back.success);

    let original = structure(Framework::Cypress, src);
    assert_eq!(original, (vec!["Profile".to_string()], vec!["shows the name".to_string()], 2));
    assert_eq!(structure(Framework::Playwright, &there.converted_code), original);
    assert_eq!(structure(Framework::Cypress, &back.converted_code), original);
    assert!(back.converted_code.contains("cy.get('.error').should('not.exist');"));
}

#[test]
fn test_step_titles_survive_a_round_trip() {
    let src = r#"
suite('Checkout', () => {
    test_case('pays by card', () => {
        step('Navigate to /cart')
        step('Enter text into #card with "4242"')
        step('Click text "Pay now"')
        step('Verify .receipt is visible')
        step('Verify page has URL "/done"')
    })
})
"#;
    let cypress = convert(src, Framework::TestRail, Framework::Cypress);
    assert!(cypress.success);
    assert!(cypress.converted_code.contains("cy.get('#card').type('4242');"));
    assert!(cypress.converted_code.contains("cy.contains('Pay now').click();"));
    assert!(cypress.converted_code.contains("cy.url().should('include', '/done');"));

    let back = convert(&cypress.converted_code, Framework::Cypress, Framework::TestRail);
    assert!(back.success);
    assert_eq!(step_titles(&back.converted_code), step_titles(src));
}

#[test]
fn test_plain_source_passes_through() {
    let src = "const total = items.reduce((a, b) => a + b, 0)\n";
    for (from, to) in Converter::pairs() {
        let result = convert(src, from, to);
        assert!(result.success);
        assert_eq!(result.converted_code, src);
    }
}

#[test]
fn test_bare_commands_are_substituted() {
    let result = convert("cy.visit('/home')\ncy.get('#menu').click()", Framework::Cypress, Framework::Playwright);
    assert!(result.success);
    assert_eq!(
        result.converted_code,
        "await page.goto('/home');\nawait page.locator('#menu').click();\n"
    );
}

#[test]
fn test_unsupported_commands_warn_by_name() {
    let src = r#"
describe("Test", () => {
    it("uses unsupported command", () => {
        cy.customCommand();
        cy.anotherUnknownCommand();
        cy.visit("/test");
    });
});
"#;
    let result = convert(src, Framework::Cypress, Framework::Playwright);
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("customCommand")));
    assert!(result.warnings.iter().any(|w| w.contains("anotherUnknownCommand")));
    assert!(result.converted_code.contains("        await page.goto('/test');"));
    assert!(result.converted_code.contains("// Perform action: customCommand()"));

    let chained = convert(
        "cy.customCommand().anotherCommand().visit('/test');",
        Framework::Cypress,
        Framework::Playwright,
    );
    assert!(chained.success);
    assert!(chained.warnings.len() >= 2);
}

#[test]
fn test_unreadable_declarations_and_helpers_survive() {
    let src = r#"import { login } from './helpers'
const user = 'bob'

describe('S', () => {
    const token = 'abc'
    it('uses done', (done) => {
        cy.visit('/a')
        done()
    })
    it('ok', () => {
        cy.visit('/ok')
    })
})
"#;
    let result = convert(src, Framework::Cypress, Framework::Playwright);
    assert!(result.success);
    let code = &result.converted_code;
    assert!(code.contains("\nimport { login } from './helpers';\nconst user = 'bob';\n"));
    assert!(code.contains("    const token = 'abc';\n"));
    assert!(code.contains("    it('uses done', (done) => {\n        cy.visit('/a')\n        done()\n    });\n"));
    assert!(code.contains("    test('ok', async ({ page }) => {\n        await page.goto('/ok');\n"));
    assert_eq!(
        result.warnings,
        vec!["Unrecognized declaration passed through unchanged: it('uses done', (done) => {"]
    );

    let sync = "test('sync', ({ page }) => {\n  page.goto('/s')\n})\n";
    let result = convert(sync, Framework::Playwright, Framework::Cypress);
    assert!(result.converted_code.contains("it('sync', () => {"));
}

#[test]
fn test_commented_out_declaration_is_kept_as_a_comment() {
    let src = "describe('S', () => {\n  // it('old', () => {\n  it('new', () => {\n    cy.visit('/n')\n  })\n})\n";
    let result = convert(src, Framework::Cypress, Framework::Playwright);
    assert!(result.success);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert!(result.converted_code.contains(
        "test.describe('S', () => {\n    // it('old', () => {\n\n    test('new', async ({ page }) => {\n        await page.goto('/n');\n    });\n});\n"
    ));
}

#[test]
fn test_callback_command_round_trips_through_testrail() {
    let src = "describe('Form', () => {\n  it('fills', () => {\n    cy.get('form').within(() => {\n      cy.get('input').type('x')\n      cy.get('.ok').should('be.visible')\n    })\n  })\n})\n";
    let testrail = convert(src, Framework::Cypress, Framework::TestRail);
    assert!(testrail.success);
    assert_eq!(testrail.converted_code.matches("step('Perform action'").count(), 1);
    assert!(!testrail.converted_code.contains("// get('form')"));

    let back = convert(&testrail.converted_code, Framework::TestRail, Framework::Cypress);
    assert!(back.success);
    assert!(back.converted_code.contains("cy.get('.ok').should('be.visible')"));
    assert_eq!(
        structure(Framework::Cypress, &back.converted_code),
        structure(Framework::Cypress, src)
    );
}

#[test]
fn test_nested_suites_and_hook_order() {
    let src = r#"
describe('Shop', () => {
    afterEach(() => { cy.clearCookies() })
    beforeEach(() => { cy.visit('/shop') })
    before(() => { cy.reload() })
    it('lists', () => { cy.get('.item').should('have.length', 3) })
    describe('Basket', () => {
        it('adds', () => { cy.get('.add').click() })
    })
})
"#;
    let result = convert(src, Framework::Cypress, Framework::Playwright);
    assert!(result.success);
    let code = &result.converted_code;
    let at = |needle: &str| code.find(needle).unwrap_or_else(|| panic!("missing {needle}\n{code}"));
    assert!(at("test.beforeAll(") < at("test.beforeEach("));
    assert!(at("test.beforeEach(") < at("test.afterEach("));
    assert!(at("test.afterEach(") < at("test('lists'"));
    assert!(at("test('lists'") < at("    test.describe('Basket'"));
    assert!(code.contains("await expect(page.locator('.item')).toHaveCount(3);"));
    assert!(code.contains("        test('adds', async ({ page }) => {"));

    let doc = StructuralParser::new(Framework::Playwright).parse(code);
    assert_eq!(doc.suites[0].tests.len(), 1);
    assert_eq!(doc.suites[0].suites[0].tests.len(), 1);
}

#[test]
fn test_style_options_are_honored() {
    let style = StyleOptions {
        indent: Indent::Tabs,
        quote: QuoteStyle::Double,
        emit_header: false,
    };
    let converter = Converter::new(Framework::Cypress, Framework::Playwright)
        .unwrap()
        .with_style(style);
    let result = converter.convert(LOGIN_SPEC);
    assert!(result.success);
    assert_eq!(
        result.converted_code,
        "test.describe(\"Login\", () => {\n\ttest(\"works\", async ({ page }) => {\n\t\tawait page.goto(\"/login\");\n\t});\n});\n\n"
    );
}

#[test]
fn test_converted_output_detects_as_target() {
    for (from, to) in [
        (Framework::Cypress, Framework::Playwright),
        (Framework::Cypress, Framework::TestRail),
        (Framework::TestRail, Framework::Cypress),
    ] {
        let src = match from {
            Framework::Cypress => LOGIN_SPEC.to_string(),
            _ => convert(LOGIN_SPEC, Framework::Cypress, from).converted_code,
        };
        assert_eq!(detect_framework(&src), Some(from));
        let result = convert(&src, from, to);
        assert_eq!(detect_framework(&result.converted_code), Some(to), "{from} -> {to}");
    }
}
