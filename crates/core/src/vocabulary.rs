//! Canonical command and assertion translation tables.
//!
//! One table is shared by every converter pair. Each row names a single
//! concept in all three vocabularies; a `None`/empty cell means the
//! vocabulary has no direct equivalent and emitters fall back to a
//! `Perform action` comment.

use serde::Serialize;

use crate::framework::Framework;

/// Result of a table lookup: total over every input name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Mapped<T> {
    Known(T),
    /// The name as written in the source, kept for comments and warnings.
    Unrecognized(String),
}

impl<T: Copy> Mapped<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Mapped::Known(t) => Some(*t),
            Mapped::Unrecognized(_) => None,
        }
    }
}

/// How a command relates to the element chain it is called on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Yields an element: `cy.get`, `page.locator`
    Query,
    /// Acts on the current element: `click`, `type`
    Element,
    /// Acts on the page itself: `visit`, `reload`
    Page,
}

/// Commands known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Navigate,
    Locate,
    LocateText,
    LocateTestId,
    LocateRole,
    LocateLabel,
    Click,
    DoubleClick,
    RightClick,
    Fill,
    Clear,
    Check,
    Uncheck,
    Select,
    Focus,
    Blur,
    Hover,
    Press,
    ScrollIntoView,
    Reload,
    Wait,
    WaitForLoad,
    Screenshot,
    Intercept,
    Url,
    Title,
    ClearCookies,
}

struct ActionRow {
    action: Action,
    kind: ActionKind,
    cypress: &'static [&'static str],
    playwright: &'static [&'static str],
    /// Step label; queries other than `Locate` are described by their target.
    label: Option<&'static str>,
    /// Prefix used when a query is described as a step target.
    target_prefix: Option<&'static str>,
}

const fn row(
    action: Action,
    kind: ActionKind,
    cypress: &'static [&'static str],
    playwright: &'static [&'static str],
    label: Option<&'static str>,
) -> ActionRow {
    ActionRow { action, kind, cypress, playwright, label, target_prefix: None }
}

const fn query(
    action: Action,
    cypress: &'static [&'static str],
    playwright: &'static [&'static str],
    target_prefix: &'static str,
) -> ActionRow {
    ActionRow {
        action,
        kind: ActionKind::Query,
        cypress,
        playwright,
        label: None,
        target_prefix: Some(target_prefix),
    }
}

use Action as A;
use ActionKind as K;

static ACTIONS: &[ActionRow] = &[
    row(A::Navigate, K::Page, &["visit"], &["goto"], Some("Navigate to")),
    row(A::Locate, K::Query, &["get", "find"], &["locator", "$"], Some("Locate")),
    query(A::LocateText, &["contains"], &["getByText"], "text"),
    query(A::LocateTestId, &[], &["getByTestId"], "test ID"),
    query(A::LocateRole, &[], &["getByRole"], "role"),
    query(A::LocateLabel, &[], &["getByLabel"], "label"),
    row(A::Click, K::Element, &["click"], &["click"], Some("Click")),
    row(A::DoubleClick, K::Element, &["dblclick"], &["dblclick"], Some("Double-click")),
    row(A::RightClick, K::Element, &["rightclick"], &[], Some("Right-click")),
    row(A::Fill, K::Element, &["type"], &["fill", "type", "pressSequentially"], Some("Enter text into")),
    row(A::Clear, K::Element, &["clear"], &["clear"], Some("Clear")),
    row(A::Check, K::Element, &["check"], &["check"], Some("Check")),
    row(A::Uncheck, K::Element, &["uncheck"], &["uncheck"], Some("Uncheck")),
    row(A::Select, K::Element, &["select"], &["selectOption"], Some("Select option in")),
    row(A::Focus, K::Element, &["focus"], &["focus"], Some("Focus")),
    row(A::Blur, K::Element, &["blur"], &["blur"], Some("Blur")),
    row(A::Hover, K::Element, &[], &["hover"], Some("Hover over")),
    row(A::Press, K::Element, &[], &["press"], Some("Press key on")),
    row(A::ScrollIntoView, K::Element, &["scrollIntoView"], &["scrollIntoViewIfNeeded"], Some("Scroll to")),
    row(A::Reload, K::Page, &["reload"], &["reload"], Some("Reload page")),
    row(A::Wait, K::Page, &["wait"], &["waitForTimeout"], Some("Wait for")),
    row(A::WaitForLoad, K::Page, &[], &["waitForLoadState"], Some("Wait for load state")),
    row(A::Screenshot, K::Page, &["screenshot"], &["screenshot"], Some("Take screenshot")),
    row(A::Intercept, K::Page, &["intercept"], &["route"], Some("Intercept network request")),
    row(A::Url, K::Page, &["url"], &["url"], Some("Read URL")),
    row(A::Title, K::Page, &["title"], &["title"], Some("Read title")),
    row(A::ClearCookies, K::Page, &["clearCookies"], &[], Some("Clear cookies")),
];

impl Action {
    fn row(self) -> &'static ActionRow {
        ACTIONS
            .iter()
            .find(|r| r.action == self)
            .unwrap_or(&ACTIONS[0])
    }

    pub fn kind(self) -> ActionKind {
        self.row().kind
    }

    pub fn is_query(self) -> bool {
        self.kind() == ActionKind::Query
    }

    /// Canonical spelling in a code vocabulary, or the step label for TestRail.
    pub fn name(self, framework: Framework) -> Option<&'static str> {
        let row = self.row();
        match framework {
            Framework::Cypress => row.cypress.first().copied(),
            Framework::Playwright => row.playwright.first().copied(),
            Framework::TestRail => row.label,
        }
    }

    /// Human label used in step titles.
    pub fn label(self) -> &'static str {
        self.row().label.unwrap_or("Locate")
    }

    /// Prefix describing a non-default query in a step target (`text "Login"`).
    pub fn target_prefix(self) -> Option<&'static str> {
        self.row().target_prefix
    }

    /// Look up a command name as written in `framework` source.
    pub fn lookup(framework: Framework, name: &str) -> Mapped<Action> {
        let found = ACTIONS.iter().find(|r| match framework {
            Framework::Cypress => r.cypress.contains(&name),
            Framework::Playwright => r.playwright.contains(&name),
            Framework::TestRail => r.label == Some(name),
        });
        match found {
            Some(r) => Mapped::Known(r.action),
            None => Mapped::Unrecognized(name.to_string()),
        }
    }

    /// Match the longest step label at the start of a step title.
    ///
    /// Returns the action and the remainder after the label.
    pub fn from_label(title: &str) -> Option<(Action, &str)> {
        ACTIONS
            .iter()
            .filter_map(|r| r.label.map(|label| (r.action, label)))
            .filter(|(_, label)| {
                title.starts_with(label)
                    && title[label.len()..].chars().next().map_or(true, char::is_whitespace)
            })
            .max_by_key(|(_, label)| label.len())
            .map(|(action, label)| (action, title[label.len()..].trim()))
    }

    /// Match a query target prefix (`text "x"`) at the start of a step target.
    ///
    /// The prefix must be followed by a space and a non-empty remainder.
    pub fn from_target_prefix(target: &str) -> Option<(Action, &str)> {
        ACTIONS
            .iter()
            .filter_map(|r| r.target_prefix.map(|p| (r.action, p)))
            .filter(|(_, prefix)| {
                target.starts_with(prefix)
                    && target[prefix.len()..].starts_with(' ')
                    && !target[prefix.len()..].trim().is_empty()
            })
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(action, prefix)| (action, target[prefix.len()..].trim()))
    }
}

/// Assertion kinds known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Visible,
    Hidden,
    Exist,
    HaveText,
    ContainText,
    HaveValue,
    Checked,
    Disabled,
    Enabled,
    Focused,
    Empty,
    HaveAttribute,
    HaveClass,
    HaveCss,
    HaveCount,
    HaveUrl,
    HaveTitle,
    Equal,
    Truthy,
}

struct ExpectationRow {
    expectation: Expectation,
    /// Chai chainers as used in `.should('...')`
    cypress: &'static [&'static str],
    /// Matchers as used in `expect(...).toX()`
    playwright: &'static [&'static str],
    positive: &'static str,
    negative: &'static str,
    takes_argument: bool,
}

const fn exp(
    expectation: Expectation,
    cypress: &'static [&'static str],
    playwright: &'static [&'static str],
    positive: &'static str,
    negative: &'static str,
    takes_argument: bool,
) -> ExpectationRow {
    ExpectationRow { expectation, cypress, playwright, positive, negative, takes_argument }
}

use Expectation as E;

static EXPECTATIONS: &[ExpectationRow] = &[
    exp(E::Visible, &["be.visible"], &["toBeVisible"], "is visible", "is not visible", false),
    exp(E::Hidden, &["be.hidden"], &["toBeHidden"], "is hidden", "is not hidden", false),
    exp(E::Exist, &["exist"], &["toBeAttached"], "exists", "does not exist", false),
    exp(E::HaveText, &["have.text"], &["toHaveText"], "has text", "does not have text", true),
    exp(
        E::ContainText,
        &["contain", "contain.text", "include.text", "contains"],
        &["toContainText"],
        "contains text",
        "does not contain text",
        true,
    ),
    exp(E::HaveValue, &["have.value"], &["toHaveValue"], "has value", "does not have value", true),
    exp(E::Checked, &["be.checked"], &["toBeChecked"], "is checked", "is not checked", false),
    exp(E::Disabled, &["be.disabled"], &["toBeDisabled"], "is disabled", "is not disabled", false),
    exp(E::Enabled, &["be.enabled"], &["toBeEnabled"], "is enabled", "is not enabled", false),
    exp(E::Focused, &["have.focus", "be.focused"], &["toBeFocused"], "is focused", "is not focused", false),
    exp(E::Empty, &["be.empty"], &["toBeEmpty"], "is empty", "is not empty", false),
    exp(
        E::HaveAttribute,
        &["have.attr"],
        &["toHaveAttribute"],
        "has attribute",
        "does not have attribute",
        true,
    ),
    exp(E::HaveClass, &["have.class"], &["toHaveClass"], "has class", "does not have class", true),
    exp(E::HaveCss, &["have.css"], &["toHaveCSS"], "has CSS", "does not have CSS", true),
    exp(E::HaveCount, &["have.length"], &["toHaveCount"], "has count", "does not have count", true),
    exp(E::HaveUrl, &["include", "match"], &["toHaveURL"], "has URL", "does not have URL", true),
    exp(E::HaveTitle, &["eq"], &["toHaveTitle"], "has title", "does not have title", true),
    exp(E::Equal, &["eq", "equal", "deep.equal"], &["toBe", "toEqual"], "equals", "does not equal", true),
    exp(E::Truthy, &["be.true", "be.ok"], &["toBeTruthy"], "is truthy", "is not truthy", false),
];

impl Expectation {
    fn row(self) -> &'static ExpectationRow {
        EXPECTATIONS
            .iter()
            .find(|r| r.expectation == self)
            .unwrap_or(&EXPECTATIONS[0])
    }

    /// Canonical chainer (Cypress) or matcher (Playwright).
    pub fn name(self, framework: Framework) -> Option<&'static str> {
        let row = self.row();
        match framework {
            Framework::Cypress => row.cypress.first().copied(),
            Framework::Playwright => row.playwright.first().copied(),
            Framework::TestRail => Some(row.positive),
        }
    }

    /// Verification phrase used in `Verify ...` step titles.
    pub fn phrase(self, negated: bool) -> &'static str {
        let row = self.row();
        if negated {
            row.negative
        } else {
            row.positive
        }
    }

    pub fn takes_argument(self) -> bool {
        self.row().takes_argument
    }

    /// Look up a chainer or matcher. URL and title checks are resolved by
    /// the caller from the assertion subject, not from the verb.
    pub fn lookup(framework: Framework, verb: &str) -> Mapped<Expectation> {
        let found = EXPECTATIONS.iter().find(|r| match framework {
            Framework::Cypress => {
                r.cypress.contains(&verb) && !matches!(r.expectation, E::HaveUrl | E::HaveTitle)
            }
            Framework::Playwright => r.playwright.contains(&verb),
            Framework::TestRail => r.positive == verb,
        });
        match found {
            Some(r) => Mapped::Known(r.expectation),
            None => Mapped::Unrecognized(verb.to_string()),
        }
    }

    /// Split `subject phrase[ argument]` at the earliest verification
    /// phrase that is not inside double-quoted text.
    ///
    /// Returns the subject, the expectation, whether the phrase was the
    /// negative one, and the argument text (possibly empty).
    pub fn split_phrase(text: &str) -> Option<(&str, Expectation, bool, &str)> {
        let mut best: Option<(usize, usize, Expectation, bool)> = None;
        let phrases = EXPECTATIONS
            .iter()
            .flat_map(|r| [(r.expectation, false, r.positive), (r.expectation, true, r.negative)]);

        for (expectation, negated, phrase) in phrases {
            let hit = text.match_indices(phrase).map(|(at, _)| at).find(|&at| {
                let after = &text[at + phrase.len()..];
                (at == 0 || text[..at].ends_with(' '))
                    && (after.is_empty() || after.starts_with(' '))
                    && !inside_quotes(&text[..at])
            });
            if let Some(at) = hit {
                let better = match best {
                    None => true,
                    Some((start, len, ..)) => at < start || (at == start && phrase.len() > len),
                };
                if better {
                    best = Some((at, phrase.len(), expectation, negated));
                }
            }
        }

        best.map(|(at, len, expectation, negated)| {
            (text[..at].trim(), expectation, negated, text[at + len..].trim())
        })
    }
}

/// Whether an odd number of unescaped `"` precede the end of `prefix`.
fn inside_quotes(prefix: &str) -> bool {
    let mut open = false;
    let mut escaped = false;
    for c in prefix.chars() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => open = !open,
            _ => {}
        }
        escaped = false;
    }
    open
}
