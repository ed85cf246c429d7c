//! Cosmetic emission options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Widest accepted space indent.
const MAX_INDENT: usize = 16;

/// One indentation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indent {
    Spaces(usize),
    Tabs,
}

impl Indent {
    pub fn unit(&self) -> String {
        match self {
            Indent::Spaces(n) => " ".repeat(*n),
            Indent::Tabs => "\t".to_string(),
        }
    }
}

impl FromStr for Indent {
    type Err = Error;

    /// Accepts `tabs`, `spaces` (four) or a space count such as `2`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tab" | "tabs" => Ok(Indent::Tabs),
            "space" | "spaces" => Ok(Indent::Spaces(4)),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_INDENT).contains(n))
                .map(Indent::Spaces)
                .ok_or_else(|| Error::InvalidStyle(format!("indentation '{}'", s))),
        }
    }
}

/// Quote character for emitted string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    pub fn char(&self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

impl FromStr for QuoteStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "'" => Ok(QuoteStyle::Single),
            "double" | "\"" => Ok(QuoteStyle::Double),
            _ => Err(Error::InvalidStyle(format!("quote style '{}'", s))),
        }
    }
}

impl fmt::Display for QuoteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteStyle::Single => f.write_str("single"),
            QuoteStyle::Double => f.write_str("double"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    pub indent: Indent,
    pub quote: QuoteStyle,
    /// Emit the target vocabulary's import line before the first block.
    pub emit_header: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            indent: Indent::Spaces(4),
            quote: QuoteStyle::Single,
            emit_header: true,
        }
    }
}

impl StyleOptions {
    pub fn validate(&self) -> Result<()> {
        match self.indent {
            Indent::Spaces(n) if n == 0 || n > MAX_INDENT => {
                Err(Error::InvalidStyle(format!("indent width {} outside 1..={}", n, MAX_INDENT)))
            }
            _ => Ok(()),
        }
    }

    /// Indentation for `level` nesting levels.
    pub fn indent(&self, level: usize) -> String {
        self.indent.unit().repeat(level)
    }

    /// Render `text` as a string literal in the configured quote style.
    pub fn quote(&self, text: &str) -> String {
        let q = self.quote.char();
        let mut out = String::with_capacity(text.len() + 2);
        out.push(q);
        for c in text.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                c if c == q => {
                    out.push('\\');
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        out.push(q);
        out
    }

    /// Re-quote a plain `'...'`/`"..."` literal; other expressions are kept.
    pub fn requote(&self, expr: &str) -> String {
        let expr = expr.trim();
        if expr.starts_with('`') {
            return expr.to_string();
        }
        match crate::scanner::unquote(expr) {
            Some(text) => self.quote(&text),
            None => expr.to_string(),
        }
    }
}
