//! Property tests for scope stack balance.

#![allow(clippy::unwrap_used)]

use enclose::prelude::*;
use proptest::prelude::*;

const LEVELS: usize = 8;

fn nested_page() -> String {
    let mut html = String::from("<html><body>");
    for level in 0..LEVELS {
        html.push_str(&format!("<div class=\"level\"><span>level {level}</span>"));
    }
    html.push_str(&"</div>".repeat(LEVELS));
    html.push_str("</body></html>");
    html
}

fn session() -> Session {
    let app = Router::new().page("/", nested_page());
    let mut session = Session::new(MemoryDriver::new(app))
        .with_default_selector(DefaultSelector::isolated(SelectorKind::XPath));
    session.visit("/").unwrap();
    session
}

/// Enter `remaining` nested divs; fail at depth `fail_at` if given
fn descend(
    session: &mut Session,
    remaining: usize,
    fail_at: Option<usize>,
) -> EncloseResult<String> {
    if fail_at == Some(session.scope_depth()) {
        return Err(EncloseError::NoDocument);
    }
    if remaining == 0 {
        let span = session.find(".//span")?;
        return session.text_of(&span);
    }
    session.within(".//div[@class='level']", |s| descend(s, remaining - 1, fail_at))
}

proptest! {
    /// Nested blocks see their own depth and unwind fully.
    #[test]
    fn prop_nesting_unwinds(depth in 1..=LEVELS) {
        let mut session = session();
        let innermost = descend(&mut session, depth, None).unwrap();
        prop_assert_eq!(innermost, format!("level {}", depth - 1));
        prop_assert_eq!(session.scope_depth(), 0);
        prop_assert_eq!(session.current_scope(), Scope::Root);
    }

    /// A failure at any depth propagates and leaves no scope behind.
    #[test]
    fn prop_failure_unwinds(depth in 1..=LEVELS, fail in 1..=LEVELS) {
        let mut session = session();
        let result = descend(&mut session, depth, Some(fail));
        prop_assert_eq!(result.is_err(), fail <= depth);
        prop_assert_eq!(session.scope_depth(), 0);
    }

    /// Unqualified and explicit XPath queries agree inside any scope.
    #[test]
    fn prop_default_kind_matches_explicit(depth in 0..LEVELS) {
        let mut session = session();
        let locator = format!("//div[@class='level'][count(ancestor::div) = {depth}]");
        let (unqualified, explicit) = session
            .within(Query::xpath(locator), |s| {
                Ok((s.all(".//span")?, s.all(Query::xpath(".//span"))?))
            })
            .unwrap();
        prop_assert_eq!(unqualified.len(), LEVELS - depth);
        prop_assert_eq!(unqualified, explicit);
    }
}
