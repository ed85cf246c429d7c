//! Property tests for the scanner and recognizers

use proptest::prelude::*;
use testbridge_core::registry::Registry;
use testbridge_core::scanner::extract_block;
use testbridge_core::{convert, Converter, Framework, StructuralParser};

/// Text whose braces are balanced.
fn balanced() -> impl Strategy<Value = String> {
    let leaf = "[a-z ;().]{0,6}";
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|parts| format!("{{{}}}", parts.concat()))
    })
}

fn fragments() -> impl Strategy<Value = String> {
    let pieces = vec![
        "describe('a', () => {",
        "it('b', () => {",
        "test('t', async ({ page }) => {",
        "suite('s', () => {",
        "test_case('c', () => {",
        "});",
        "{",
        "}",
        "\n",
        "cy.visit('/x');",
        "cy.get('#a').should('be.visible')",
        "await page.locator('#a').click()",
        "step('Click #a')",
        "step('Verify #a is visible')",
        "'",
        "\"",
        "`",
        "//",
        "/*",
        "(",
        ")",
        "é",
    ];
    prop::collection::vec(prop::sample::select(pieces), 0..24).prop_map(|v| v.concat())
}

proptest! {
    #[test]
    fn block_extraction_stops_at_matching_brace(
        parts in prop::collection::vec(balanced(), 0..4),
        tail in "[a-z });]{0,8}",
    ) {
        let body = parts.concat();
        let source = format!("{}}}{}", body, tail);
        let block = extract_block(&source, 0);
        prop_assert!(block.closed);
        prop_assert_eq!(block.body, body.as_str());
        prop_assert_eq!(block.end, body.len() + 1);
    }

    #[test]
    fn recognizers_always_make_progress(text in "\\PC{0,64}") {
        for framework in Framework::ALL {
            let registry = Registry::get(framework);
            let recognizers = registry
                .declarations()
                .chain([&registry.assertion, &registry.command, &registry.preamble, &registry.candidate])
                .chain(registry.step.as_ref());
            for recognizer in recognizers {
                let starts: Vec<usize> = recognizer.matches(&text).map(|d| d.start).collect();
                prop_assert!(starts.len() <= text.len() + 1);
                prop_assert!(starts.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn parsing_never_fails_on_fragments(text in fragments()) {
        for framework in Framework::ALL {
            let doc = StructuralParser::new(framework).parse(&text);
            prop_assert!(doc.suites.iter().all(|s| s.test_count() <= text.len()));
        }
    }

    #[test]
    fn conversion_always_produces_a_result(text in fragments()) {
        for (from, to) in Converter::pairs() {
            let result = convert(&text, from, to);
            prop_assert!(result.success, "{} -> {}: {:?}", from, to, result.errors);
        }
    }
}
