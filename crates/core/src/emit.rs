//! Target-vocabulary emission.
//!
//! The emitter renders a parsed `Document`, or a bare snippet, in the
//! target vocabulary. Commands and assertions go through the canonical
//! tables in `vocabulary`; anything without an equivalent becomes a
//! `Perform action` comment and an advisory.

use std::fmt::Write;

use crate::error::Result;
use crate::framework::Framework;
use crate::lower::{lower, Command, Step, PERFORM_ACTION, VERIFY};
use crate::model::{Assertion, Document, HookKind, Query, Subject, TestCase, TestSuite};
use crate::registry::Registry;
use crate::scanner::{split_args, unquote};
use crate::style::StyleOptions;
use crate::vocabulary::{Action, ActionKind, Expectation, Mapped};

pub struct Emitter<'a> {
    source: Framework,
    target: Framework,
    style: &'a StyleOptions,
    out: String,
    advisories: Vec<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(source: Framework, target: Framework, style: &'a StyleOptions) -> Self {
        Self {
            source,
            target,
            style,
            out: String::new(),
            advisories: Vec::new(),
        }
    }

    /// Emitted text and advisories, in the order they were raised.
    pub fn finish(self) -> (String, Vec<String>) {
        (self.out, self.advisories)
    }

    /// Render a whole document: header, kept statements, top-level hooks,
    /// standalone tests, suites.
    pub fn document(&mut self, doc: &Document) -> Result<()> {
        if self.style.emit_header {
            let header = self.header();
            writeln!(self.out, "{}", header)?;
            self.out.push('\n');
        }
        if !doc.passthrough.is_empty() {
            self.passthrough(&doc.passthrough, 0)?;
            self.out.push('\n');
        }
        for kind in HookKind::ALL {
            for body in doc.hooks.get(kind) {
                self.hook(kind, body, 0)?;
                self.out.push('\n');
            }
        }
        for test in &doc.tests {
            self.test(test, 0)?;
            self.out.push('\n');
        }
        for suite in &doc.suites {
            self.suite(suite, 0)?;
            self.out.push('\n');
        }
        Ok(())
    }

    /// Render loose statements with no header or wrapper.
    pub fn snippet(&mut self, text: &str) -> Result<()> {
        let steps = lower(self.source, text);
        for step in &steps {
            self.step(step, 0)?;
        }
        Ok(())
    }

    fn header(&self) -> String {
        match self.target {
            Framework::Cypress => "/// <reference types=\"cypress\" />".to_string(),
            Framework::Playwright => format!(
                "import {{ test, expect }} from {};",
                self.style.quote("@playwright/test")
            ),
            Framework::TestRail => format!(
                "const {{ suite, test_case, step }} = require({});",
                self.style.quote("@testrail/api")
            ),
        }
    }

    fn suite(&mut self, suite: &TestSuite, level: usize) -> Result<()> {
        let title = self.style.quote(&suite.title);
        let open = match self.target {
            Framework::Cypress => format!("describe({}, () => {{", title),
            Framework::Playwright => format!("test.describe({}, () => {{", title),
            Framework::TestRail => format!("suite({}, () => {{", title),
        };
        self.line(level, &open)?;

        let mut first = true;
        if !suite.passthrough.is_empty() {
            self.separate(&mut first);
            self.passthrough(&suite.passthrough, level + 1)?;
        }
        for kind in HookKind::ALL {
            for body in suite.hooks.get(kind) {
                self.separate(&mut first);
                self.hook(kind, body, level + 1)?;
            }
        }
        for test in &suite.tests {
            self.separate(&mut first);
            self.test(test, level + 1)?;
        }
        for inner in &suite.suites {
            self.separate(&mut first);
            self.suite(inner, level + 1)?;
        }

        self.line(level, "});")
    }

    fn test(&mut self, test: &TestCase, level: usize) -> Result<()> {
        let title = self.style.quote(&test.title);
        let open = match self.target {
            Framework::Cypress => format!("it({}, () => {{", title),
            Framework::Playwright => format!("test({}, async ({{ page }}) => {{", title),
            Framework::TestRail => format!("test_case({}, () => {{", title),
        };
        self.line(level, &open)?;

        let steps = lower(self.source, &test.body);
        if self.target.is_step_based() {
            // actions first, then one verification step per recorded assertion
            let mut kept = Vec::new();
            for step in steps.iter().filter(|s| !matches!(s, Step::Verify(_))) {
                if let Step::Raw(text) = step {
                    kept.push(text.as_str());
                }
                self.step(step, level + 1)?;
            }
            // a statement already passed through is not repeated as a verification
            for assertion in test.assertions.iter().filter(|a| !kept.contains(&a.source.as_str())) {
                self.verify(assertion, level + 1)?;
            }
        } else {
            for step in &steps {
                self.step(step, level + 1)?;
            }
        }

        self.line(level, "});")
    }

    fn hook(&mut self, kind: HookKind, body: &str, level: usize) -> Result<()> {
        let open = match (self.target, kind) {
            (Framework::Cypress, HookKind::BeforeAll) => "before(() => {",
            (Framework::Cypress, HookKind::AfterAll) => "after(() => {",
            (Framework::Cypress, HookKind::BeforeEach) => "beforeEach(() => {",
            (Framework::Cypress, HookKind::AfterEach) => "afterEach(() => {",
            (Framework::Playwright, HookKind::BeforeAll) => "test.beforeAll(async () => {",
            (Framework::Playwright, HookKind::AfterAll) => "test.afterAll(async () => {",
            (Framework::Playwright, HookKind::BeforeEach) => "test.beforeEach(async ({ page }) => {",
            (Framework::Playwright, HookKind::AfterEach) => "test.afterEach(async ({ page }) => {",
            (Framework::TestRail, HookKind::BeforeAll) => "beforeAll(() => {",
            (Framework::TestRail, HookKind::AfterAll) => "afterAll(() => {",
            (Framework::TestRail, HookKind::BeforeEach) => "beforeEach(() => {",
            (Framework::TestRail, HookKind::AfterEach) => "afterEach(() => {",
        };
        self.line(level, open)?;

        let steps = lower(self.source, body);
        let once = matches!(kind, HookKind::BeforeAll | HookKind::AfterAll);
        if self.target == Framework::Playwright && once && steps.iter().any(uses_page) {
            self.advise(
                "Playwright beforeAll/afterAll hooks have no page fixture; review converted hook bodies"
                    .to_string(),
            );
        }
        for step in &steps {
            self.step(step, level + 1)?;
        }

        self.line(level, "});")
    }

    fn step(&mut self, step: &Step, level: usize) -> Result<()> {
        match step {
            Step::Chain(commands) => self.chain(commands, level),
            Step::Verify(assertion) => self.verify(assertion, level),
            Step::Raw(text) => self.raw(text, level),
        }
    }

    fn chain(&mut self, commands: &[Command], level: usize) -> Result<()> {
        let mut prefix: Vec<Query> = Vec::new();
        let mut acted = false;
        for command in commands {
            if let Some(query) = command.as_query() {
                prefix.push(query);
                continue;
            }
            acted = true;
            self.command(&prefix, command, level)?;
        }
        if !acted && !prefix.is_empty() {
            self.locate(&prefix, level)?;
        }
        Ok(())
    }

    fn command(&mut self, prefix: &[Query], command: &Command, level: usize) -> Result<()> {
        let action = match &command.action {
            Mapped::Known(action) => *action,
            Mapped::Unrecognized(name) => {
                self.advise(format!(
                    "Unmapped command '{}' was emitted as a '{}' comment",
                    name, PERFORM_ACTION
                ));
                let call = self.source_call(prefix, Some(command));
                return self.perform_action(&call, level);
            }
        };

        if self.target.is_step_based() {
            return self.action_step(prefix, action, command, level);
        }
        match self.code_action(prefix, action, command) {
            Some(stmt) => self.line(level, &stmt),
            None => {
                self.no_equivalent(&command.name);
                let call = self.source_call(prefix, Some(command));
                self.perform_action(&call, level)
            }
        }
    }

    fn code_action(&self, prefix: &[Query], action: Action, command: &Command) -> Option<String> {
        let name = action.name(self.target)?;
        let args = self.args(command.args.as_deref().unwrap_or(""));
        let page_level = action.kind() == ActionKind::Page;
        match self.target {
            Framework::Cypress if page_level => Some(format!("cy.{}({});", name, args)),
            Framework::Cypress => Some(format!("{}.{}({});", self.cypress_locator(prefix)?, name, args)),
            Framework::Playwright if page_level => Some(format!("await page.{}({});", name, args)),
            Framework::Playwright => Some(format!(
                "await {}.{}({});",
                self.playwright_locator(prefix),
                name,
                args
            )),
            Framework::TestRail => None,
        }
    }

    /// A chain that only selects an element.
    fn locate(&mut self, prefix: &[Query], level: usize) -> Result<()> {
        let call = self.source_call(prefix, None);
        match self.target {
            Framework::Cypress => match self.cypress_locator(prefix) {
                Some(locator) => self.line(level, &format!("{};", locator)),
                None => {
                    self.no_equivalent(&call);
                    self.perform_action(&call, level)
                }
            },
            Framework::Playwright => {
                let locator = self.playwright_locator(prefix);
                self.line(level, &format!("await {}.waitFor();", locator))
            }
            Framework::TestRail => {
                let title = format!("{} {}", Action::Locate.label(), describe_element(prefix));
                self.step_block(&title, &call, level)
            }
        }
    }

    fn action_step(&mut self, prefix: &[Query], action: Action, command: &Command, level: usize) -> Result<()> {
        let args = command.args.as_deref().unwrap_or("").trim();
        let mut title = action.label().to_string();
        if action.kind() == ActionKind::Page {
            if !args.is_empty() {
                title.push(' ');
                title.push_str(&display_bare(args));
            }
        } else {
            if !prefix.is_empty() {
                title.push(' ');
                title.push_str(&describe_element(prefix));
            }
            if !args.is_empty() {
                title.push_str(" with ");
                title.push_str(&display_value(args));
            }
        }
        let call = self.source_call(prefix, Some(command));
        self.step_block(&title, &call, level)
    }

    fn verify(&mut self, assertion: &Assertion, level: usize) -> Result<()> {
        let expectation = match &assertion.expectation {
            Mapped::Known(e) => *e,
            Mapped::Unrecognized(verb) => {
                self.advise(format!(
                    "Unmapped assertion '{}' was emitted as a '{}' comment",
                    verb, PERFORM_ACTION
                ));
                return self.perform_action(&assertion.source, level);
            }
        };

        let rendered = match self.target {
            Framework::Cypress => self.cypress_assertion(assertion, expectation),
            Framework::Playwright => self.playwright_assertion(assertion, expectation),
            Framework::TestRail => Some(format!(
                "step({});",
                self.style.quote(&verify_title(assertion, expectation))
            )),
        };
        match rendered {
            Some(stmt) => self.line(level, &stmt),
            None => {
                self.no_equivalent(expectation.phrase(assertion.negated));
                self.perform_action(&assertion.source, level)
            }
        }
    }

    fn cypress_assertion(&self, assertion: &Assertion, expectation: Expectation) -> Option<String> {
        let not = if assertion.negated { "not." } else { "" };
        let arg = assertion.argument.as_deref().map(|a| self.args(a));
        match (&assertion.subject, expectation) {
            (Subject::Page, Expectation::HaveUrl) => {
                let arg = arg?;
                let verb = if is_regex_literal(&arg) { "match" } else { "include" };
                let chainer = self.style.quote(&format!("{}{}", not, verb));
                Some(format!("cy.url().should({}, {});", chainer, arg))
            }
            (Subject::Page, Expectation::HaveTitle) => {
                let chainer = self.style.quote(&format!("{}eq", not));
                Some(format!("cy.title().should({}, {});", chainer, arg?))
            }
            (Subject::Page, _) => None,
            (Subject::Element(chain), _) => {
                let locator = self.cypress_locator(chain)?;
                let chainer = self.style.quote(&format!("{}{}", not, expectation.name(Framework::Cypress)?));
                Some(match arg {
                    Some(arg) => format!("{}.should({}, {});", locator, chainer, arg),
                    None => format!("{}.should({});", locator, chainer),
                })
            }
            (Subject::Value(expr), _) => {
                let chainer = expectation.name(Framework::Cypress)?;
                let call = match arg {
                    Some(arg) => format!("({})", arg),
                    None if expectation.takes_argument() => "()".to_string(),
                    None => String::new(),
                };
                Some(format!("expect({}).to.{}{}{};", expr, not, chainer, call))
            }
        }
    }

    fn playwright_assertion(&self, assertion: &Assertion, expectation: Expectation) -> Option<String> {
        let matcher = expectation.name(Framework::Playwright)?;
        let not = if assertion.negated { ".not" } else { "" };
        let mut arg = assertion
            .argument
            .as_deref()
            .map(|a| self.args(a))
            .unwrap_or_default();
        if expectation == Expectation::HaveUrl {
            // substring checks become a pattern match
            if let Some(text) = unquote(&arg).filter(|_| !arg.starts_with('`')) {
                arg = url_pattern(&text);
            }
        }
        Some(match &assertion.subject {
            Subject::Page => format!("await expect(page){}.{}({});", not, matcher, arg),
            Subject::Element(chain) => format!(
                "await expect({}){}.{}({});",
                self.playwright_locator(chain),
                not,
                matcher,
                arg
            ),
            Subject::Value(expr) => format!("expect({}){}.{}({});", expr, not, matcher, arg),
        })
    }

    fn raw(&mut self, text: &str, level: usize) -> Result<()> {
        let comment = is_comment(text);
        if !comment && Registry::get(self.source).command.is_match(text) {
            self.advise(format!("Statement passed through unchanged: {}", first_line(text)));
        }
        if !comment && self.target.is_step_based() {
            let title = self.style.quote(PERFORM_ACTION);
            self.line(level, &format!("step({}, () => {{", title))?;
            self.text_block(text, level + 1)?;
            return self.line(level, "});");
        }
        self.verbatim(text, level)
    }

    /// Statements kept from outside any declaration, in source order.
    fn passthrough(&mut self, items: &[String], level: usize) -> Result<()> {
        let registry = Registry::get(self.source);
        for text in items {
            if !is_comment(text) {
                if registry.candidate.is_match(text) {
                    self.advise(format!(
                        "Unrecognized declaration passed through unchanged: {}",
                        first_line(text)
                    ));
                } else if registry.command.is_match(text) {
                    self.advise(format!("Statement passed through unchanged: {}", first_line(text)));
                }
            }
            self.verbatim(text, level)?;
        }
        Ok(())
    }

    /// Write a statement as is, terminating code with `;`.
    fn verbatim(&mut self, text: &str, level: usize) -> Result<()> {
        if is_comment(text) || text.ends_with('}') || text.ends_with(';') {
            self.text_block(text, level)
        } else {
            self.text_block(&format!("{};", text), level)
        }
    }

    /// Fallback for commands and assertions with no equivalent.
    fn perform_action(&mut self, call: &str, level: usize) -> Result<()> {
        let call = one_line(call);
        match self.target {
            Framework::TestRail => self.step_block(PERFORM_ACTION, &call, level),
            _ => self.line(level, &format!("// {}: {}", PERFORM_ACTION, call)),
        }
    }

    fn step_block(&mut self, title: &str, comment: &str, level: usize) -> Result<()> {
        let title = self.style.quote(title);
        self.line(level, &format!("step({}, () => {{", title))?;
        self.line(level + 1, &format!("// {}", one_line(comment)))?;
        self.line(level, "});")
    }

    fn cypress_locator(&self, chain: &[Query]) -> Option<String> {
        let mut out = String::from("cy");
        for (i, query) in chain.iter().enumerate() {
            let call = match query.action {
                Action::Locate if i == 0 => format!(".get({})", self.style.requote(&query.selector)),
                Action::Locate => format!(".find({})", self.style.requote(&query.selector)),
                Action::LocateText => format!(".contains({})", self.args(&query.selector)),
                Action::LocateTestId => {
                    let id = unquote(&query.selector)?;
                    let method = if i == 0 { "get" } else { "find" };
                    let selector = format!("[data-testid=\"{}\"]", id);
                    format!(".{}({})", method, self.style.quote(&selector))
                }
                _ => return None,
            };
            out.push_str(&call);
        }
        Some(out)
    }

    fn playwright_locator(&self, chain: &[Query]) -> String {
        let mut out = String::from("page");
        for query in chain {
            let name = query.action.name(Framework::Playwright).unwrap_or("locator");
            let _ = write!(out, ".{}({})", name, self.args(&query.selector));
        }
        out
    }

    /// How the command read in the source vocabulary, without the root object.
    fn source_call(&self, prefix: &[Query], command: Option<&Command>) -> String {
        let mut parts: Vec<String> = prefix
            .iter()
            .map(|q| {
                let name = q.action.name(self.source).unwrap_or(q.action.label());
                format!("{}({})", name, q.selector)
            })
            .collect();
        if let Some(command) = command {
            parts.push(command.call_text());
        }
        parts.join(".")
    }

    /// Re-quote each literal of an argument list.
    fn args(&self, args: &str) -> String {
        split_args(args)
            .into_iter()
            .map(|a| self.style.requote(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn no_equivalent(&mut self, name: &str) {
        self.advise(format!(
            "No {} equivalent for '{}'; emitted as a '{}' comment",
            self.target, name, PERFORM_ACTION
        ));
    }

    fn advise(&mut self, message: String) {
        if !self.advisories.contains(&message) {
            self.advisories.push(message);
        }
    }

    fn separate(&mut self, first: &mut bool) {
        if !std::mem::replace(first, false) {
            self.out.push('\n');
        }
    }

    fn line(&mut self, level: usize, text: &str) -> Result<()> {
        writeln!(self.out, "{}{}", self.style.indent(level), text)?;
        Ok(())
    }

    /// Write a possibly multi-line statement, keeping its relative indentation.
    fn text_block(&mut self, text: &str, level: usize) -> Result<()> {
        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default();
        let rest: Vec<&str> = lines.collect();
        let margin = rest
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start().len())
            .min()
            .unwrap_or(0);

        self.line(level, first.trim())?;
        for line in rest {
            if line.trim().is_empty() {
                self.out.push('\n');
            } else {
                self.line(level, strip_margin(line, margin).trim_end())?;
            }
        }
        Ok(())
    }
}

fn is_comment(text: &str) -> bool {
    text.starts_with("//") || text.starts_with("/*")
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

fn uses_page(step: &Step) -> bool {
    match step {
        Step::Chain(_) => true,
        Step::Verify(a) => !matches!(a.subject, Subject::Value(_)),
        Step::Raw(_) => false,
    }
}

/// `Verify {subject} {phrase}[ {argument}]`
fn verify_title(assertion: &Assertion, expectation: Expectation) -> String {
    let subject = match &assertion.subject {
        Subject::Page => "page".to_string(),
        Subject::Element(chain) => describe_element(chain),
        Subject::Value(expr) => format!("value {}", one_line(expr)),
    };
    let mut title = format!("{} {} {}", VERIFY, subject, expectation.phrase(assertion.negated));
    if let Some(arg) = &assertion.argument {
        title.push(' ');
        title.push_str(&display_value(arg));
    }
    title
}

/// Human description of an element chain for step titles.
fn describe_element(chain: &[Query]) -> String {
    if !chain.is_empty() && chain.iter().all(|q| q.action == Action::Locate) {
        let selectors: Option<Vec<String>> = chain.iter().map(|q| unquote(&q.selector)).collect();
        if let Some(selectors) = selectors {
            return selectors.join(" ");
        }
    }
    match chain.last() {
        Some(query) => match query.action.target_prefix() {
            Some(prefix) => format!("{} {}", prefix, display_value(&query.selector)),
            None => display_bare(&query.selector),
        },
        None => "page".to_string(),
    }
}

/// A single literal without its quotes; anything else as written.
fn display_bare(expr: &str) -> String {
    let expr = expr.trim();
    match unquote(expr) {
        Some(text) if !expr.starts_with('`') => one_line(&text),
        _ => one_line(expr),
    }
}

/// A single literal as a double-quoted string; anything else as written.
fn display_value(expr: &str) -> String {
    let expr = expr.trim();
    match unquote(expr) {
        Some(text) if !expr.starts_with('`') => {
            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
        }
        _ => one_line(expr),
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_regex_literal(expr: &str) -> bool {
    let expr = expr.trim();
    expr.len() > 2
        && expr.starts_with('/')
        && expr[1..]
            .rfind('/')
            .map_or(false, |i| expr[i + 2..].chars().all(|c| c.is_ascii_alphabetic()) && i > 0)
}

/// A regex literal matching `text` as a substring.
fn url_pattern(text: &str) -> String {
    let mut out = String::from("/");
    for c in text.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('/');
    out
}

fn strip_margin(line: &str, margin: usize) -> &str {
    let cut = line
        .char_indices()
        .take_while(|&(i, c)| i < margin && c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    &line[cut..]
}
