//! Enclose: scoped document interaction sessions.
//!
//! A [`Session`] drives a document through a [`driver::Driver`] and keeps a
//! stack of scopes. [`Session::within`] resolves a selector (CSS, XPath, or
//! an already located [`Node`]) and runs a closure with every query and
//! action restricted to that node's subtree, popping the scope again on
//! every exit path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ENCLOSE Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Query      │    │ Resolver   │    │ Driver     │            │
//! │   │ (css/xpath)│───►│ + filters  │───►│ (scraper)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │          ▲                 ▲                                    │
//! │          │                 │ current scope                      │
//! │   ┌──────┴─────────────────┴──────┐                             │
//! │   │ Session + ScopeStack + Guard  │                             │
//! │   └───────────────────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use enclose::prelude::*;
//!
//! let app = Router::new().page(
//!     "/",
//!     r#"<ul><li>With Simple HTML: <a href="/bar">Go</a></li>
//!            <li>Other: <a href="/foo">Go</a></li></ul>"#,
//! );
//! let mut session = Session::new(MemoryDriver::new(app))
//!     .with_default_selector(DefaultSelector::isolated(SelectorKind::XPath));
//! session.visit("/").unwrap();
//!
//! let href = session
//!     .within("//li[contains(., 'Other')]", |s| {
//!         let link = s.find(".//a")?;
//!         link.attribute(s, "href")
//!     })
//!     .unwrap();
//! assert_eq!(href.as_deref(), Some("/foo"));
//! ```

#![warn(missing_docs)]

/// Selector kinds, queries, filter options and the default selector
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod selector;

/// Node handles and query roots
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod node;

/// Scope stack and the guard that pops it
#[allow(clippy::must_use_candidate)]
pub mod scope;

/// Selector resolution with pluggable filters
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod resolver;

/// The public session façade
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
pub mod session;

/// Document backends
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod driver;

/// Document-order element index
pub mod dom;

/// XPath 1.0 subset evaluator
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    clippy::doc_markdown
)]
pub mod xpath;

/// Configuration loading
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Logging setup
pub mod logging;

mod result;

pub use config::Config;
pub use driver::{DocumentQuery, Driver, MemoryDriver};
pub use node::{Node, Scope};
pub use resolver::{ExactText, NodeFilter, Resolver};
pub use result::{EncloseError, EncloseResult};
pub use scope::{ScopeGuard, ScopeOwner, ScopeStack, ScopeTarget};
pub use selector::{
    default_selector, set_default_selector, DefaultSelector, FilterOptions, Query, Selector,
    SelectorKind,
};
pub use session::Session;

/// Everything a test needs in one import
pub mod prelude {
    pub use super::config::Config;
    pub use super::driver::{
        App, DocumentQuery, Driver, MemoryDriver, Method, Request, Response, Router,
    };
    pub use super::node::{Node, Scope};
    pub use super::resolver::{NodeFilter, Resolver};
    pub use super::result::{EncloseError, EncloseResult};
    pub use super::scope::ScopeTarget;
    pub use super::selector::{
        default_selector, set_default_selector, DefaultSelector, FilterOptions, Query, Selector,
        SelectorKind,
    };
    pub use super::session::Session;
}
