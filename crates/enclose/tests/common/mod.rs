//! Shared fixture application for the integration suites.

#![allow(dead_code, clippy::unwrap_used)]

use enclose::prelude::*;

pub const WITH_SCOPE: &str = include_str!("../fixtures/with_scope.html");
pub const FIELDSETS: &str = include_str!("../fixtures/fieldsets.html");
pub const TABLES: &str = include_str!("../fixtures/tables.html");
pub const AMBIGUOUS: &str = include_str!("../fixtures/ambiguous.html");

/// Routes used by every suite; `POST /form` echoes its parameters as JSON
pub fn app() -> Router {
    Router::new()
        .page("/", "<html><body><h1>Hello world!</h1></body></html>")
        .page("/with_scope", WITH_SCOPE)
        .page("/fieldsets", FIELDSETS)
        .page("/tables", TABLES)
        .page("/ambiguous", AMBIGUOUS)
        .page("/bar", "<html><body><p>Bar</p></body></html>")
        .page("/foo", "<html><body><h1>Another World</h1></body></html>")
        .redirect("/redirect_to_bar", "/bar")
        .redirect("/loop", "/loop")
        .post("/form", |request| {
            Response::Html(format!(
                "<html><body><pre id=\"results\">{}</pre></body></html>",
                request.params_json()
            ))
        })
}

/// Session on `path` with an XPath default not shared with other tests
pub fn session_at(path: &str) -> Session {
    let mut session = Session::new(MemoryDriver::new(app()))
        .with_default_selector(DefaultSelector::isolated(SelectorKind::XPath));
    session.visit(path).unwrap();
    session
}

/// Parameters echoed by `POST /form`
pub fn extract_results(session: &Session) -> serde_json::Value {
    let results = session.find_from(&Scope::Root, Query::css("#results")).unwrap();
    serde_json::from_str(&session.text_of(&results).unwrap()).unwrap()
}
