//! The conversion pipeline, shared by every ordered vocabulary pair.

use tracing::{debug, warn};

use crate::emit::Emitter;
use crate::error::{Error, Result};
use crate::framework::Framework;
use crate::model::ConversionResult;
use crate::parser::StructuralParser;
use crate::registry::Registry;
use crate::style::StyleOptions;
use crate::warnings;

/// Converts source text from one vocabulary to another.
///
/// A converter holds no scan state; one instance may be used for any
/// number of conversions, from any number of threads.
#[derive(Debug, Clone)]
pub struct Converter {
    source: Framework,
    target: Framework,
    style: StyleOptions,
}

impl Converter {
    pub fn new(source: Framework, target: Framework) -> Result<Self> {
        if source == target {
            return Err(Error::UnsupportedPair {
                from: source,
                to: target,
            });
        }
        Ok(Self {
            source,
            target,
            style: StyleOptions::default(),
        })
    }

    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    pub fn source(&self) -> Framework {
        self.source
    }

    pub fn target(&self) -> Framework {
        self.target
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    /// The six supported ordered pairs.
    pub fn pairs() -> Vec<(Framework, Framework)> {
        Framework::ALL
            .iter()
            .flat_map(|&from| {
                Framework::ALL
                    .iter()
                    .filter(move |&&to| to != from)
                    .map(move |&to| (from, to))
            })
            .collect()
    }

    /// Convert `text`. Failures are reported in the result, never raised.
    pub fn convert(&self, text: &str) -> ConversionResult {
        debug!(from = %self.source, to = %self.target, len = text.len(), "converting");

        if text.trim().is_empty() {
            return ConversionResult::success(text.to_string(), Vec::new());
        }

        match self.run(text) {
            Ok((code, advisories)) => {
                let mut warnings = warnings::generate_warnings(text, self.source, self.target);
                warnings::merge(&mut warnings, advisories);
                debug!(warnings = warnings.len(), "conversion finished");
                ConversionResult::success(code, warnings)
            }
            Err(e) => {
                warn!(error = %e, "conversion failed");
                ConversionResult::failure(e)
            }
        }
    }

    fn run(&self, text: &str) -> Result<(String, Vec<String>)> {
        self.style.validate()?;
        let doc = StructuralParser::new(self.source).parse(text);
        let mut emitter = Emitter::new(self.source, self.target, &self.style);

        if doc.is_empty() {
            // implicit unit: loose statements, no wrapper
            if !Registry::get(self.source).command.is_match(text) {
                debug!("no declarations or commands; passing through");
                return Ok((text.to_string(), Vec::new()));
            }
            emitter.snippet(text)?;
            return Ok(emitter.finish());
        }

        debug!(
            suites = doc.suites.len(),
            tests = doc.tests.len(),
            "parsed document"
        );
        emitter.document(&doc)?;
        let (code, mut advisories) = emitter.finish();
        for title in &doc.unterminated {
            advisories.push(format!(
                "Block '{}' is not terminated; its body was read to end of input",
                title
            ));
        }
        Ok((code, advisories))
    }
}

/// One-shot conversion.
pub fn convert(text: &str, from: Framework, to: Framework) -> ConversionResult {
    match Converter::new(from, to) {
        Ok(converter) => converter.convert(text),
        Err(e) => ConversionResult::failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_vocabulary_is_rejected() {
        let err = Converter::new(Framework::Cypress, Framework::Cypress).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported conversion: cypress -> cypress");
        let result = convert("cy.visit('/')", Framework::TestRail, Framework::TestRail);
        assert!(!result.success);
        assert!(result.converted_code.is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_six_pairs() {
        let pairs = Converter::pairs();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|(a, b)| a != b));
        for (from, to) in pairs {
            assert!(Converter::new(from, to).is_ok());
        }
    }

    #[test]
    fn test_invalid_style_becomes_failed_result() {
        let style = StyleOptions {
            indent: crate::style::Indent::Spaces(0),
            ..Default::default()
        };
        let converter = Converter::new(Framework::Cypress, Framework::Playwright)
            .unwrap()
            .with_style(style);
        let result = converter.convert("describe('a', () => {})");
        assert!(!result.success);
        assert!(result.errors[0].starts_with("Invalid style option"));
    }

    #[test]
    fn test_plain_code_passes_through() {
        let src = "function add(a, b) {\n  return a + b\n}\n";
        let result = convert(src, Framework::Cypress, Framework::Playwright);
        assert!(result.success);
        assert_eq!(result.converted_code, src);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unterminated_block_is_advised() {
        let result = convert(
            "describe('cut', () => {\n  it('t', () => {\n    cy.visit('/')\n",
            Framework::Cypress,
            Framework::Playwright,
        );
        assert!(result.success);
        assert!(result.converted_code.contains("test.describe('cut'"));
        assert!(result.warnings.iter().any(|w| w.contains("Block 'cut' is not terminated")));
    }
}
