//! Block scanner and string-aware statement helpers.
//!
//! `extract_block` is the single nesting-aware primitive the structural
//! parser relies on. It counts `{`/`}` outside literals and comments and
//! knows nothing about the vocabulary being scanned.
//!
//! The remaining helpers are used when lowering test bodies: they skip
//! string literals and comments so that delimiters inside `'...'` or
//! `// ...` never split a statement.

use std::ops::Range;

/// A block body bounded by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Text between the opening delimiter and its matching close.
    pub body: &'a str,
    /// Index just past the closing delimiter (or `source.len()` if unterminated).
    pub end: usize,
    /// False when the source ended before the block closed.
    pub closed: bool,
}

/// Bound the body of a block whose opening `{` ends right before `start`.
///
/// Truncated input yields everything from `start` to the end of the source
/// with `closed == false`; this is a degraded result, never an error.
pub fn extract_block(source: &str, start: usize) -> Block<'_> {
    let start = start.min(source.len());
    let mut depth: usize = 1;

    for (i, b, class) in Lexer::new(source, start) {
        if class != Class::Code {
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Block {
                        body: &source[start..i],
                        end: i + 1,
                        closed: true,
                    };
                }
            }
            _ => {}
        }
    }

    Block {
        body: &source[start..],
        end: source.len(),
        closed: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    Str(u8),
    LineComment,
    BlockComment,
}

/// Classification of a scanned byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Code,
    Literal,
    Comment,
}

/// Byte-level lexer that tracks string literals and comments.
///
/// Only ASCII delimiters are ever acted on, so slicing at reported
/// indices of `Class::Code` bytes is always on a char boundary.
struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: Lex,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos,
            state: Lex::Code,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, u8, Class);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.pos;
        let b = *self.bytes.get(i)?;
        let next = self.bytes.get(i + 1).copied();
        self.pos += 1;

        let class = match self.state {
            Lex::Str(quote) => {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == quote {
                    self.state = Lex::Code;
                }
                Class::Literal
            }
            Lex::LineComment => {
                if b == b'\n' {
                    self.state = Lex::Code;
                    Class::Code
                } else {
                    Class::Comment
                }
            }
            Lex::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    self.pos += 1;
                    self.state = Lex::Code;
                }
                Class::Comment
            }
            Lex::Code => match b {
                b'\'' | b'"' | b'`' => {
                    self.state = Lex::Str(b);
                    Class::Literal
                }
                b'/' if next == Some(b'/') => {
                    self.state = Lex::LineComment;
                    Class::Comment
                }
                b'/' if next == Some(b'*') => {
                    self.pos += 1;
                    self.state = Lex::BlockComment;
                    Class::Comment
                }
                _ => Class::Code,
            },
        };

        Some((i, b, class))
    }
}

/// Byte ranges of `text` that lie inside string literals or comments.
///
/// Ranges are sorted and do not overlap.
pub fn hidden_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = Vec::new();
    let mut lexer = Lexer::new(text, 0);
    while let Some((i, _, class)) = lexer.next() {
        if class == Class::Code {
            continue;
        }
        // The lexer may consume an escaped byte or a comment delimiter
        // along with `i`; its cursor covers both.
        let end = lexer.pos.min(text.len());
        match spans.last_mut() {
            Some(last) if last.end >= i => last.end = end,
            _ => spans.push(i..end),
        }
    }
    spans
}

/// Whether `pos` falls inside one of the sorted `spans`.
pub fn in_spans(spans: &[Range<usize>], pos: usize) -> bool {
    let idx = spans.partition_point(|r| r.end <= pos);
    spans.get(idx).map_or(false, |r| r.start <= pos)
}

/// Whether an argument list passes a callback (`=>` or `function`).
pub fn takes_callback(args: &str) -> bool {
    let bytes = args.as_bytes();
    let arrow = Lexer::new(args, 0)
        .any(|(i, b, class)| class == Class::Code && b == b'=' && bytes.get(i + 1) == Some(&b'>'));
    arrow
        || split_args(args).iter().any(|arg| {
            let arg = arg.strip_prefix("async").map_or(*arg, str::trim_start);
            arg.starts_with("function")
        })
}

/// Find the index of the delimiter closing the one at `open`.
///
/// `(`, `[` and `{` are counted together; literals and comments are skipped.
pub fn find_close(text: &str, open: usize) -> Option<usize> {
    let mut depth: usize = 0;
    for (i, b, class) in Lexer::new(text, open) {
        if class != Class::Code {
            continue;
        }
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a block body into trimmed statements.
///
/// Statements end at a top-level `;` or at a top-level newline, unless the
/// next line continues a call chain. Comments become statements of their own.
/// Trailing semicolons are not included.
pub fn split_statements(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut depth: usize = 0;
    let mut prev_class = Class::Code;

    for (i, b, class) in Lexer::new(body, 0) {
        if class == Class::Comment && prev_class != Class::Comment && depth == 0 {
            if !body[start..i].trim().is_empty() {
                push_trimmed(&mut out, &body[start..i]);
                start = i;
            }
        }
        prev_class = class;
        if class != Class::Code {
            continue;
        }
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => {
                push_trimmed(&mut out, &body[start..i]);
                start = i + 1;
            }
            b'\n' if depth == 0 => {
                if !continues_chain(&body[start..i], &body[i + 1..]) {
                    push_trimmed(&mut out, &body[start..i]);
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    push_trimmed(&mut out, &body[start..]);
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, stmt: &'a str) {
    let stmt = stmt.trim();
    if !stmt.is_empty() {
        out.push(stmt);
    }
}

/// Whether a newline between `before` and `after` sits inside an expression.
fn continues_chain(before: &str, after: &str) -> bool {
    let before = before.trim_end();
    if before.is_empty() || before.trim_start().starts_with("//") {
        return false;
    }
    if after.trim_start().starts_with('.') {
        return true;
    }
    matches!(
        before.as_bytes().last(),
        Some(b'.' | b',' | b'(' | b'=' | b'+' | b'-' | b'*' | b'&' | b'|' | b'?' | b':' | b'>')
    )
}

/// Split an argument list at top-level commas.
pub fn split_args(args: &str) -> Vec<&str> {
    let mut out = Vec::new();
    if args.trim().is_empty() {
        return out;
    }
    let mut start = 0;
    let mut depth: usize = 0;
    for (i, b, class) in Lexer::new(args, 0) {
        if class != Class::Code {
            continue;
        }
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(args[start..].trim());
    out
}

/// One `.name(args)` link of a call chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub name: &'a str,
    /// Raw text between the parentheses; `None` for a property access.
    pub args: Option<&'a str>,
}

/// Parse `root.a(x).b.c(y)` into its segments.
///
/// Returns `None` if anything other than a plain chain is present.
pub fn parse_chain(stmt: &str) -> Option<Vec<Segment<'_>>> {
    let bytes = stmt.as_bytes();
    let mut pos = skip_ws(bytes, 0);
    let mut segments = Vec::new();

    loop {
        let name_start = pos;
        while pos < bytes.len() && is_ident_byte(bytes[pos], pos == name_start) {
            pos += 1;
        }
        if pos == name_start {
            return None;
        }
        let name = &stmt[name_start..pos];
        pos = skip_ws(bytes, pos);

        let args = if bytes.get(pos) == Some(&b'(') {
            let close = find_close(stmt, pos)?;
            let inner = &stmt[pos + 1..close];
            pos = skip_ws(bytes, close + 1);
            Some(inner)
        } else {
            None
        };
        segments.push(Segment { name, args });

        match bytes.get(pos) {
            None => return Some(segments),
            Some(b'.') => pos = skip_ws(bytes, pos + 1),
            Some(_) => return None,
        }
    }
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn is_ident_byte(b: u8, first: bool) -> bool {
    b == b'_' || b == b'$' || b.is_ascii_alphabetic() || (!first && b.is_ascii_digit())
}

/// Return the contents of a single string literal, unescaped.
pub fn unquote(expr: &str) -> Option<String> {
    let expr = expr.trim();
    let bytes = expr.as_bytes();
    let quote = *bytes.first()?;
    if !matches!(quote, b'\'' | b'"' | b'`') || bytes.len() < 2 {
        return None;
    }
    // The closing quote must be the last byte and belong to the same literal.
    let close = Lexer::new(expr, 0)
        .skip(1)
        .find(|&(_, b, class)| class == Class::Literal && b == quote)
        .map(|(i, _, _)| i)?;
    if close != bytes.len() - 1 {
        return None;
    }
    Some(unescape(&expr[1..close]))
}

/// Undo backslash escapes inside a literal body.
pub fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Wrap `text` in single quotes, escaping as needed.
pub fn literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_block() {
        let src = "describe('a', () => { it('b', () => { x(); }); }); tail";
        let open = src.find('{').unwrap() + 1;
        let block = extract_block(src, open);
        assert!(block.closed);
        assert_eq!(block.body, " it('b', () => { x(); }); ");
        assert_eq!(&src[block.end..], "); tail");
    }

    #[test]
    fn test_extract_truncated_block() {
        let src = "{ a { b ";
        let block = extract_block(src, 1);
        assert!(!block.closed);
        assert_eq!(block.body, " a { b ");
        assert_eq!(block.end, src.len());
    }

    #[test]
    fn test_extract_ignores_braces_in_literals_and_comments() {
        let src = "{ cy.get('{') // }\n /* { */ x(`${a}`) } after";
        let block = extract_block(src, 1);
        assert!(block.closed);
        assert_eq!(&src[block.end..], " after");
    }

    #[test]
    fn test_hidden_spans() {
        let src = "a('x\\'y') // c\nb /* d */ e";
        let spans = hidden_spans(src);
        assert!(in_spans(&spans, src.find('x').unwrap()));
        assert!(in_spans(&spans, src.find('y').unwrap()));
        assert!(in_spans(&spans, src.find('c').unwrap()));
        assert!(in_spans(&spans, src.find('d').unwrap()));
        assert!(!in_spans(&spans, 0));
        assert!(!in_spans(&spans, src.find('b').unwrap()));
        assert!(!in_spans(&spans, src.find('e').unwrap()));
        assert!(hidden_spans("plain()").is_empty());
    }

    #[test]
    fn test_takes_callback() {
        assert!(takes_callback("() => { cy.get('a') }"));
        assert!(takes_callback("'#a', function () {}"));
        assert!(takes_callback("async function () {}"));
        assert!(!takes_callback("'=>', { timeout: 500 }"));
        assert!(!takes_callback("'admin'"));
    }

    #[test]
    fn test_extract_start_past_end() {
        let block = extract_block("abc", 10);
        assert_eq!(block.body, "");
        assert!(!block.closed);
    }

    #[test]
    fn test_split_statements_semicolons_and_newlines() {
        let body = "\n  cy.visit('/a');\n  cy.get('#b')\n    .click()\n  cy.get('c;d').type('x')\n";
        let stmts = split_statements(body);
        assert_eq!(
            stmts,
            vec!["cy.visit('/a')", "cy.get('#b')\n    .click()", "cy.get('c;d').type('x')"]
        );
    }

    #[test]
    fn test_split_statements_comments() {
        let body = "// open page\ncy.visit('/') // trailing\n/* block */";
        let stmts = split_statements(body);
        assert_eq!(stmts, vec!["// open page", "cy.visit('/')", "// trailing", "/* block */"]);
    }

    #[test]
    fn test_split_statements_keeps_callbacks_whole() {
        let body = "cy.get('a').then(($el) => {\n  foo();\n  bar();\n});\nbaz();";
        let stmts = split_statements(body);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].ends_with("})"));
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("'#a', 'x, y', { delay: 1, b: [1, 2] }"), vec!["'#a'", "'x, y'", "{ delay: 1, b: [1, 2] }"]);
        assert!(split_args("  ").is_empty());
    }

    #[test]
    fn test_parse_chain() {
        let chain = parse_chain("cy.get('.btn')\n  .should('be.visible').click()").unwrap();
        let names: Vec<_> = chain.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["cy", "get", "should", "click"]);
        assert_eq!(chain[1].args, Some("'.btn'"));
        assert_eq!(chain[0].args, None);
        assert_eq!(chain[3].args, Some(""));

        let chain = parse_chain("expect(page.locator('a)')).not.toBeVisible()").unwrap();
        assert_eq!(chain[0].args, Some("page.locator('a)')"));
        assert_eq!(chain[1].name, "not");

        assert!(parse_chain("const x = 1").is_none());
        assert!(parse_chain("a.b(() => { c() }) + 1").is_none());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'/login'").as_deref(), Some("/login"));
        assert_eq!(unquote(r#""it\"s""#).as_deref(), Some("it\"s"));
        assert_eq!(unquote("'a' + 'b'"), None);
        assert_eq!(unquote("42"), None);
        assert_eq!(literal("it's"), r"'it\'s'");
        assert_eq!(unquote(&literal("a\\b'c")).as_deref(), Some("a\\b'c"));
    }
}
