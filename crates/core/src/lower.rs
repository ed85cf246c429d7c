//! Statement lowering.
//!
//! Rewrites raw body statements into vocabulary-neutral steps. Anything
//! that does not fit the recognized command and assertion shapes becomes
//! `Step::Raw` and is passed through by the emitter.

use crate::framework::Framework;
use crate::model::{Assertion, Query, Subject};
use crate::scanner::{
    extract_block, literal, parse_chain, split_args, split_statements, takes_callback, unquote, Segment,
};
use crate::vocabulary::{Action, ActionKind, Expectation, Mapped};

/// Title prefix of step-based verifications.
pub const VERIFY: &str = "Verify";

/// Generic step label for commands without a known equivalent.
pub const PERFORM_ACTION: &str = "Perform action";

/// One command in a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Mapped<Action>,
    /// Spelling in the source vocabulary.
    pub name: String,
    /// Raw argument text; `None` when the source had no call syntax.
    pub args: Option<String>,
}

impl Command {
    fn new(action: Mapped<Action>, name: &str, args: &str) -> Self {
        Self {
            action,
            name: name.to_string(),
            args: Some(args.trim().to_string()),
        }
    }

    fn query(framework: Framework, query: &Query) -> Self {
        let name = query.action.name(framework).unwrap_or("locate");
        Self::new(Mapped::Known(query.action), name, &query.selector)
    }

    /// The known action, if this command is an element query.
    pub fn as_query(&self) -> Option<Query> {
        let action = self.action.known().filter(|a| a.is_query())?;
        Some(Query {
            action,
            selector: self.args.clone().unwrap_or_default(),
        })
    }

    /// `name(args)`, or just the name without call syntax.
    pub fn call_text(&self) -> String {
        match &self.args {
            Some(args) => format!("{}({})", self.name, args),
            None => self.name.clone(),
        }
    }
}

/// A lowered statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Commands applied in order; queries narrow the current element.
    Chain(Vec<Command>),
    Verify(Assertion),
    /// Statement kept verbatim (comments, declarations, callbacks).
    Raw(String),
}

/// Lower every statement of a block body.
pub fn lower(framework: Framework, body: &str) -> Vec<Step> {
    split_statements(body)
        .into_iter()
        .flat_map(|stmt| lower_statement(framework, stmt))
        .collect()
}

/// Lower one statement; unrecognized shapes become a single `Step::Raw`.
pub fn lower_statement(framework: Framework, stmt: &str) -> Vec<Step> {
    let stmt = stmt.trim();
    if stmt.starts_with("//") || stmt.starts_with("/*") {
        return vec![Step::Raw(stmt.to_string())];
    }
    let lowered = match framework {
        Framework::Cypress => lower_cypress(stmt),
        Framework::Playwright => lower_playwright(stmt),
        Framework::TestRail => lower_testrail(stmt),
    };
    match lowered {
        // a callback body cannot be carried by a single step
        Some(steps) if !steps.iter().any(has_unmapped_callback) => steps,
        _ => vec![Step::Raw(stmt.to_string())],
    }
}

fn has_unmapped_callback(step: &Step) -> bool {
    match step {
        Step::Chain(commands) => commands.iter().any(|c| {
            c.action.known().is_none() && c.args.as_deref().map_or(false, takes_callback)
        }),
        _ => false,
    }
}

/// Assertions a statement makes, in order.
pub fn assertions(framework: Framework, stmt: &str) -> Vec<Assertion> {
    lower_statement(framework, stmt)
        .into_iter()
        .filter_map(|step| match step {
            Step::Verify(assertion) => Some(assertion),
            _ => None,
        })
        .collect()
}

fn lower_cypress(stmt: &str) -> Option<Vec<Step>> {
    let segments = parse_chain(stmt)?;
    let (root, rest) = segments.split_first()?;
    match (root.name, root.args) {
        ("cy", None) => CypressChain::default().lower(stmt, rest),
        ("expect", Some(subject)) => chai(stmt, subject, rest).map(|a| vec![Step::Verify(a)]),
        _ => None,
    }
}

/// Walk state for one `cy.` chain.
#[derive(Default)]
struct CypressChain {
    steps: Vec<Step>,
    /// Queries selecting the current subject element.
    queries: Vec<Query>,
    /// Commands not yet emitted as a step.
    chain: Vec<Command>,
    /// Whether `chain` holds anything beyond the subject.
    pending: bool,
    /// `url()` or `title()` made the page the subject.
    page_subject: Option<Action>,
}

impl CypressChain {
    fn lower(mut self, stmt: &str, segments: &[Segment<'_>]) -> Option<Vec<Step>> {
        for (i, seg) in segments.iter().enumerate() {
            let args = seg.args?;
            let root = i == 0;

            if matches!(seg.name, "should" | "and") {
                let assertion = self.should(stmt, args)?;
                self.flush();
                self.chain.clear();
                self.steps.push(Step::Verify(assertion));
                continue;
            }

            let action = Action::lookup(Framework::Cypress, seg.name);
            let command = Command::new(action.clone(), seg.name, args);
            match action.known() {
                Some(a) if a.is_query() => {
                    if root {
                        self.flush();
                        self.chain.clear();
                        self.queries.clear();
                    } else {
                        self.restore_subject();
                    }
                    self.queries.push(Query {
                        action: a,
                        selector: args.trim().to_string(),
                    });
                    self.chain.push(command);
                    self.page_subject = None;
                }
                Some(a @ (Action::Url | Action::Title)) if root => {
                    self.flush();
                    self.chain.clear();
                    self.queries.clear();
                    self.chain.push(command);
                    self.page_subject = Some(a);
                }
                _ => {
                    if root {
                        self.flush();
                        self.chain.clear();
                        self.queries.clear();
                    } else {
                        self.restore_subject();
                    }
                    self.chain.push(command);
                    self.pending = true;
                    self.page_subject = None;
                }
            }
        }

        if self.pending || (self.steps.is_empty() && !self.chain.is_empty()) {
            self.steps.push(Step::Chain(self.chain));
        }
        Some(self.steps)
    }

    /// Emit pending commands as a step.
    fn flush(&mut self) {
        if self.pending {
            self.steps.push(Step::Chain(std::mem::take(&mut self.chain)));
            self.pending = false;
        }
    }

    /// Re-seed an emptied chain with the current subject queries.
    fn restore_subject(&mut self) {
        if self.chain.is_empty() {
            self.chain = self
                .queries
                .iter()
                .map(|q| Command::query(Framework::Cypress, q))
                .collect();
        }
    }

    fn should(&self, stmt: &str, args: &str) -> Option<Assertion> {
        let parts = split_args(args);
        let chainer = unquote(parts.first()?)?;
        let (negated, verb) = match chainer.strip_prefix("not.") {
            Some(verb) => (true, verb.to_string()),
            None => (false, chainer),
        };
        let (subject, expectation) = match self.page_subject {
            Some(Action::Url) => (Subject::Page, Mapped::Known(Expectation::HaveUrl)),
            Some(Action::Title) => (Subject::Page, Mapped::Known(Expectation::HaveTitle)),
            _ if !self.queries.is_empty() => (
                Subject::Element(self.queries.clone()),
                Expectation::lookup(Framework::Cypress, &verb),
            ),
            _ => return None,
        };
        Some(Assertion {
            subject,
            expectation,
            negated,
            argument: join_rest(&parts[1..]),
            source: stmt.to_string(),
        })
    }
}

/// `expect(x).to.be.true`, `expect(x).to.not.equal(y)`
fn chai(stmt: &str, subject: &str, rest: &[Segment<'_>]) -> Option<Assertion> {
    let (last, props) = rest.split_last()?;
    if props.iter().any(|s| s.args.is_some()) {
        return None;
    }
    let words: Vec<&str> = props.iter().chain(std::iter::once(last)).map(|s| s.name).collect();
    let negated = words.contains(&"not");
    let verb = words
        .iter()
        .copied()
        .filter(|w| !matches!(*w, "to" | "not"))
        .collect::<Vec<_>>()
        .join(".");
    Some(Assertion {
        subject: Subject::Value(subject.trim().to_string()),
        expectation: Expectation::lookup(Framework::Cypress, &verb),
        negated,
        argument: last.args.map(str::trim).filter(|a| !a.is_empty()).map(String::from),
        source: stmt.to_string(),
    })
}

fn lower_playwright(stmt: &str) -> Option<Vec<Step>> {
    let expr = match stmt.strip_prefix("await") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => stmt,
    };
    let segments = parse_chain(expr)?;
    let (root, rest) = segments.split_first()?;
    match (root.name, root.args) {
        ("page", None) => playwright_chain(rest).map(|c| vec![Step::Chain(c)]),
        ("expect", Some(subject)) => {
            playwright_expect(stmt, subject, rest).map(|a| vec![Step::Verify(a)])
        }
        _ => None,
    }
}

fn playwright_chain(segments: &[Segment<'_>]) -> Option<Vec<Command>> {
    let mut out = Vec::with_capacity(segments.len() + 1);
    for (i, seg) in segments.iter().enumerate() {
        let args = seg.args?;
        let action = Action::lookup(Framework::Playwright, seg.name);

        // `page.click('#a')` addresses the element by selector
        let element_shortcut = i == 0 && action.known().map(Action::kind) == Some(ActionKind::Element);
        let parts = split_args(args);
        if let (true, Some((selector, rest))) = (element_shortcut, parts.split_first()) {
            out.push(Command::new(Mapped::Known(Action::Locate), "locator", selector));
            out.push(Command::new(action, seg.name, &rest.join(", ")));
            continue;
        }
        out.push(Command::new(action, seg.name, args));
    }
    Some(out)
}

fn playwright_expect(stmt: &str, subject: &str, rest: &[Segment<'_>]) -> Option<Assertion> {
    let (matcher, modifiers) = rest.split_last()?;
    if modifiers.iter().any(|m| m.name != "not" || m.args.is_some()) {
        return None;
    }
    let args = matcher.args?.trim();
    Some(Assertion {
        subject: playwright_subject(subject),
        expectation: Expectation::lookup(Framework::Playwright, matcher.name),
        negated: !modifiers.is_empty(),
        argument: (!args.is_empty()).then(|| args.to_string()),
        source: stmt.to_string(),
    })
}

fn playwright_subject(expr: &str) -> Subject {
    let expr = expr.trim();
    let Some(segments) = parse_chain(expr) else {
        return Subject::Value(expr.to_string());
    };
    match segments.split_first() {
        Some((root, [])) if root.name == "page" && root.args.is_none() => Subject::Page,
        Some((root, rest)) if root.name == "page" && root.args.is_none() => {
            let queries: Option<Vec<Query>> = rest
                .iter()
                .map(|seg| {
                    let action = Action::lookup(Framework::Playwright, seg.name).known()?;
                    action.is_query().then(|| Query {
                        action,
                        selector: seg.args.unwrap_or_default().trim().to_string(),
                    })
                    .filter(|_| seg.args.is_some())
                })
                .collect();
            queries.map_or_else(|| Subject::Value(expr.to_string()), Subject::Element)
        }
        _ => Subject::Value(expr.to_string()),
    }
}

fn lower_testrail(stmt: &str) -> Option<Vec<Step>> {
    let segments = parse_chain(stmt)?;
    match segments.as_slice() {
        [step] if step.name == "step" => {
            let args = split_args(step.args?);
            let title = unquote(args.first()?)?;
            Some(vec![testrail_step(stmt, &title, args.get(1).copied())])
        }
        [assert, verb] if assert.name == "assert" && assert.args.is_none() => {
            testrail_assert(stmt, verb.name, verb.args?).map(|a| vec![Step::Verify(a)])
        }
        _ => None,
    }
}

fn testrail_step(stmt: &str, title: &str, callback: Option<&str>) -> Step {
    if let Some(rest) = title.strip_prefix(VERIFY).filter(|r| r.starts_with(' ')) {
        if let Some(assertion) = parse_verify(stmt, rest.trim()) {
            return Step::Verify(assertion);
        }
    }
    if title == PERFORM_ACTION {
        if let Some(step) = callback.and_then(perform_action_body) {
            return step;
        }
    }
    match parse_action_title(title) {
        Some(commands) => Step::Chain(commands),
        None => Step::Chain(vec![Command {
            action: Mapped::Unrecognized(title.to_string()),
            name: title.to_string(),
            args: None,
        }]),
    }
}

/// Recover the original call from a `Perform action` step body.
///
/// A leading `// name(args)` comment names an unmapped command; any other
/// content is code that was carried over verbatim.
fn perform_action_body(callback: &str) -> Option<Step> {
    let open = callback.find('{')?;
    let body = extract_block(callback, open + 1).body;
    let statements = split_statements(body);
    let first = statements.first()?;
    if let Some(comment) = first.strip_prefix("//") {
        let segments = parse_chain(comment.trim())?;
        return match segments.as_slice() {
            [call] => Some(Step::Chain(vec![Command {
                action: Mapped::Unrecognized(call.name.to_string()),
                name: call.name.to_string(),
                args: call.args.map(|a| a.trim().to_string()),
            }])),
            _ => None,
        };
    }
    Some(Step::Raw(body.trim().to_string()))
}

/// Parse `{label}[ {target}][ with {value}]` back into commands.
pub fn parse_action_title(title: &str) -> Option<Vec<Command>> {
    let (action, rest) = Action::from_label(title)?;
    let label = action.label();
    let commands = match action.kind() {
        ActionKind::Page => {
            let args = if rest.is_empty() { String::new() } else { to_arg_expr(rest) };
            vec![Command::new(Mapped::Known(action), label, &args)]
        }
        ActionKind::Query => vec![Command::query(Framework::TestRail, &parse_target(rest)?)],
        ActionKind::Element => {
            let (target, value) = match rest.rfind(" with ") {
                Some(i) => (&rest[..i], rest[i + 6..].trim()),
                None => (rest, ""),
            };
            vec![
                Command::query(Framework::TestRail, &parse_target(target)?),
                Command::new(Mapped::Known(action), label, value),
            ]
        }
    };
    Some(commands)
}

fn parse_verify(stmt: &str, text: &str) -> Option<Assertion> {
    let (subject, expectation, negated, argument) = Expectation::split_phrase(text)?;
    let subject = match subject {
        "" => return None,
        "page" => Subject::Page,
        s if s.starts_with("value ") => Subject::Value(s["value ".len()..].trim().to_string()),
        s => Subject::Element(vec![parse_target(s)?]),
    };
    Some(Assertion {
        subject,
        expectation: Mapped::Known(expectation),
        negated,
        argument: (!argument.is_empty()).then(|| argument.to_string()),
        source: stmt.to_string(),
    })
}

/// `text "Login"`, `test ID "email"` or a bare selector.
fn parse_target(text: &str) -> Option<Query> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let (action, selector) = Action::from_target_prefix(text).unwrap_or((Action::Locate, text));
    Some(Query {
        action,
        selector: to_arg_expr(selector),
    })
}

/// Keep argument lists that already read as expressions; quote anything else.
fn to_arg_expr(text: &str) -> String {
    let text = text.trim();
    let parts = split_args(text);
    let is_expr = |p: &&str| {
        unquote(p).is_some() || p.parse::<f64>().is_ok() || p.starts_with('{') || p.starts_with('[')
    };
    if !parts.is_empty() && parts.iter().all(is_expr) {
        text.to_string()
    } else {
        literal(text)
    }
}

fn testrail_assert(stmt: &str, verb: &str, args: &str) -> Option<Assertion> {
    let parts = split_args(args);
    let actual = parts.first()?;
    let (expectation, negated) = match verb {
        "equal" | "strictEqual" | "deepEqual" | "deepStrictEqual" => {
            (Mapped::Known(Expectation::Equal), false)
        }
        "notEqual" | "notStrictEqual" | "notDeepEqual" | "notDeepStrictEqual" => {
            (Mapped::Known(Expectation::Equal), true)
        }
        "ok" | "isTrue" => (Mapped::Known(Expectation::Truthy), false),
        "notOk" | "isFalse" => (Mapped::Known(Expectation::Truthy), true),
        other => (Mapped::Unrecognized(other.to_string()), false),
    };
    let argument = match expectation {
        Mapped::Known(Expectation::Equal) => parts.get(1).map(|a| a.to_string()),
        Mapped::Known(_) => None,
        Mapped::Unrecognized(_) => join_rest(&parts[1..]),
    };
    Some(Assertion {
        subject: Subject::Value(actual.to_string()),
        expectation,
        negated,
        argument,
        source: stmt.to_string(),
    })
}

fn join_rest(parts: &[&str]) -> Option<String> {
    (!parts.is_empty()).then(|| parts.join(", "))
}
