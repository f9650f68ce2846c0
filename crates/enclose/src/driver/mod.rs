//! Document backends.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Session                                                         │
//! │    scope stack + default selector + resolver                     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Driver: DocumentQuery                                           │
//! │    visit / click / set_value / set_checked / select_option       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  DocumentQuery                                                   │
//! │    query_all(scope, kind, locator) / text_of / attribute         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐                                        │
//! │  │  MemoryDriver<App>   │  parses responses with scraper,        │
//! │  │                      │  serializes forms, follows redirects   │
//! │  └──────────────────────┘                                        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver only ever needs [`DocumentQuery`]; everything that mutates
//! the page lives on [`Driver`].

mod app;
mod memory;

pub use app::{App, Method, Request, Response, Router};
pub use memory::{MemoryDriver, DEFAULT_APP_HOST, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_REDIRECTS};

use crate::node::{Node, Scope};
use crate::result::EncloseResult;
use crate::selector::SelectorKind;

/// Read-only lookups against the loaded document
pub trait DocumentQuery {
    /// All elements matching `locator` under `scope`, in document order.
    ///
    /// A node scope is where evaluation starts. CSS matches are always
    /// descendants of it, as are XPath paths written with `.//`, `/` or
    /// `//`. XPath reverse axes (`..`, `ancestor::`, `preceding-sibling::`)
    /// can still select nodes outside the scope.
    fn query_all(
        &self,
        scope: &Scope,
        kind: SelectorKind,
        locator: &str,
    ) -> EncloseResult<Vec<Node>>;

    /// Whitespace-normalized text content of `node`
    fn text_of(&self, node: &Node) -> EncloseResult<String>;

    /// Whitespace-normalized text of the whole document body
    fn document_text(&self) -> EncloseResult<String>;

    /// Attribute value of `node`
    fn attribute(&self, node: &Node, name: &str) -> EncloseResult<Option<String>>;

    /// Lowercase tag name of `node`
    fn tag_name(&self, node: &Node) -> EncloseResult<String>;
}

/// Navigation and interaction on top of [`DocumentQuery`]
pub trait Driver: DocumentQuery {
    /// Load `path`, replacing the current document
    fn visit(&mut self, path: &str) -> EncloseResult<()>;

    /// Path (with query string) of the loaded document
    fn current_path(&self) -> Option<String>;

    /// Source of the loaded document
    fn html(&self) -> EncloseResult<String>;

    /// Click `node`: follow links, submit forms, toggle checkable inputs
    fn click(&mut self, node: &Node) -> EncloseResult<()>;

    /// Type `value` into a text input or textarea
    fn set_value(&mut self, node: &Node, value: &str) -> EncloseResult<()>;

    /// Check or uncheck a checkbox or radio button
    fn set_checked(&mut self, node: &Node, checked: bool) -> EncloseResult<()>;

    /// Select an `<option>` in its `<select>`
    fn select_option(&mut self, node: &Node) -> EncloseResult<()>;

    /// Current value of a form control
    fn value_of(&self, node: &Node) -> EncloseResult<Option<String>>;
}
