//! Session: the public façade over a driver and its scope stack.
//!
//! Every query and action resolves relative to [`Session::current_scope`].
//! [`Session::within`] narrows that scope for the duration of a closure and
//! restores it on every exit path.
//!
//! # Example
//!
//! ```rust
//! use enclose::prelude::*;
//!
//! let app = Router::new()
//!     .page("/", r#"<div id="a"><a href="/one">Go</a></div>
//!                   <div id="b"><a href="/two">Go</a></div>"#)
//!     .page("/one", "<p>One</p>")
//!     .page("/two", "<p>Two</p>");
//! let mut session = Session::new(MemoryDriver::new(app));
//! session.visit("/").unwrap();
//!
//! session
//!     .within(Query::css("#b"), |s| s.click_link("Go"))
//!     .unwrap();
//! assert!(session.has_content("Two").unwrap());
//! assert_eq!(session.scope_depth(), 0);
//! ```

use tracing::{debug, trace};

use crate::config::Config;
use crate::driver::{Driver, MemoryDriver};
use crate::dom::normalize_whitespace;
use crate::node::{Node, Scope};
use crate::resolver::Resolver;
use crate::result::EncloseResult;
use crate::scope::{ScopeGuard, ScopeOwner, ScopeStack, ScopeTarget};
use crate::selector::{DefaultSelector, FilterOptions, Query, Selector};
use crate::xpath::html;

/// A scoped interaction session over one driver
#[derive(Debug)]
pub struct Session<D: Driver = MemoryDriver> {
    driver: D,
    scopes: ScopeStack,
    default_selector: DefaultSelector,
    resolver: Resolver,
}

impl<D: Driver> ScopeOwner for Session<D> {
    fn scope_stack_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }
}

impl<D: Driver> Session<D> {
    /// Session following the process-wide default selector
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            scopes: ScopeStack::new(),
            default_selector: DefaultSelector::global(),
            resolver: Resolver::new(),
        }
    }

    /// Session whose default selector comes from `config`
    pub fn with_config(driver: D, config: &Config) -> Self {
        Self::new(driver).with_default_selector(config.default_selector_handle())
    }

    /// Use `handle` for unqualified queries
    #[must_use]
    pub fn with_default_selector(mut self, handle: DefaultSelector) -> Self {
        self.default_selector = handle;
        self
    }

    /// Replace the resolver (e.g. to register filters)
    #[must_use]
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Handle unqualified queries read their kind from
    pub const fn default_selector(&self) -> &DefaultSelector {
        &self.default_selector
    }

    /// The scope queries currently resolve against
    pub fn current_scope(&self) -> Scope {
        self.scopes.top()
    }

    /// Number of enclosing `within` blocks
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Nodes of the enclosing `within` blocks, outermost first
    pub fn scopes(&self) -> &[Node] {
        self.scopes.entries()
    }

    // Navigation

    /// Load `path`. The scope stack is left as it is.
    pub fn visit(&mut self, path: &str) -> EncloseResult<()> {
        debug!(path, depth = self.scope_depth(), "visit");
        self.driver.visit(path)
    }

    /// Path of the loaded document
    pub fn current_path(&self) -> Option<String> {
        self.driver.current_path()
    }

    /// Source of the loaded document
    pub fn body(&self) -> EncloseResult<String> {
        self.driver.html()
    }

    // Scoping

    /// Run `body` with `target` as the current scope.
    ///
    /// A query target is resolved against the current scope first; if it
    /// matches nothing the error is returned and `body` never runs. The
    /// scope is popped when `body` returns, fails or panics, and the
    /// result of `body` is passed through unchanged.
    pub fn within<T, F>(&mut self, target: impl Into<ScopeTarget>, body: F) -> EncloseResult<T>
    where
        F: FnOnce(&mut Self) -> EncloseResult<T>,
    {
        self.within_with(target, FilterOptions::new(), body)
    }

    /// [`Session::within`] with extra filter options for the target query
    pub fn within_with<T, F>(
        &mut self,
        target: impl Into<ScopeTarget>,
        options: FilterOptions,
        body: F,
    ) -> EncloseResult<T>
    where
        F: FnOnce(&mut Self) -> EncloseResult<T>,
    {
        let node = match target.into() {
            ScopeTarget::Node(node) => {
                if !options.is_empty() {
                    debug!(%node, "filter options ignored for a node target");
                }
                node
            }
            ScopeTarget::Query(query) => {
                let selector = self.normalize(query, options);
                self.resolve(&selector)?
            }
        };
        let mut guard = ScopeGuard::enter(self, node);
        body(&mut *guard)
    }

    /// Scope to a fieldset given by id or by its legend text
    pub fn within_fieldset<T, F>(&mut self, id_or_legend: &str, body: F) -> EncloseResult<T>
    where
        F: FnOnce(&mut Self) -> EncloseResult<T>,
    {
        let node = self.resolve_either(
            html::fieldset_by_id(id_or_legend),
            html::fieldset_by_legend(id_or_legend),
        )?;
        self.within(node, body)
    }

    /// Scope to a table given by id or by its caption text
    pub fn within_table<T, F>(&mut self, id_or_caption: &str, body: F) -> EncloseResult<T>
    where
        F: FnOnce(&mut Self) -> EncloseResult<T>,
    {
        let node = self.resolve_either(
            html::table_by_id(id_or_caption),
            html::table_by_caption(id_or_caption),
        )?;
        self.within(node, body)
    }

    // Finding

    /// First node matching `query` in the current scope
    pub fn find(&self, query: impl Into<Query>) -> EncloseResult<Node> {
        self.find_from(&self.current_scope(), query)
    }

    /// First node matching `query` under `scope`
    pub fn find_from(&self, scope: &Scope, query: impl Into<Query>) -> EncloseResult<Node> {
        let selector = self.normalize(query.into(), FilterOptions::new());
        self.resolver.resolve(&self.driver, scope, &selector)
    }

    /// Every node matching `query` in the current scope
    pub fn all(&self, query: impl Into<Query>) -> EncloseResult<Vec<Node>> {
        let selector = self.normalize(query.into(), FilterOptions::new());
        self.resolver
            .resolve_all(&self.driver, &self.current_scope(), &selector)
    }

    /// Normalized text of `node`
    pub fn text_of(&self, node: &Node) -> EncloseResult<String> {
        self.driver.text_of(node)
    }

    /// Normalized text of the current scope
    pub fn text(&self) -> EncloseResult<String> {
        match self.current_scope() {
            Scope::Root => self.driver.document_text(),
            Scope::Node(node) => self.driver.text_of(&node),
        }
    }

    // Actions

    /// Click the link with this id, text, title or image alt text
    pub fn click_link(&mut self, locator: &str) -> EncloseResult<()> {
        let node = self.locate(html::link(locator))?;
        self.driver.click(&node)
    }

    /// Click the button with this id, value, text or title
    pub fn click_button(&mut self, locator: &str) -> EncloseResult<()> {
        let node = self.locate(html::button(locator))?;
        self.driver.click(&node)
    }

    /// Type `value` into the field with this id, name, placeholder or label
    pub fn fill_in(&mut self, locator: &str, value: &str) -> EncloseResult<()> {
        let node = self.locate(html::fillable_field(locator))?;
        self.driver.set_value(&node, value)
    }

    /// Check a checkbox
    pub fn check(&mut self, locator: &str) -> EncloseResult<()> {
        let node = self.locate(html::checkbox(locator))?;
        self.driver.set_checked(&node, true)
    }

    /// Uncheck a checkbox
    pub fn uncheck(&mut self, locator: &str) -> EncloseResult<()> {
        let node = self.locate(html::checkbox(locator))?;
        self.driver.set_checked(&node, false)
    }

    /// Choose a radio button
    pub fn choose(&mut self, locator: &str) -> EncloseResult<()> {
        let node = self.locate(html::radio(locator))?;
        self.driver.set_checked(&node, true)
    }

    /// Select the option `value` (text or value) from the select `from`
    pub fn select(&mut self, value: &str, from: &str) -> EncloseResult<()> {
        let select = self.locate(html::select(from))?;
        let option = self.find_from(&Scope::Node(select), Query::xpath(html::option(value)))?;
        self.driver.select_option(&option)
    }

    // Assertions

    /// Whether the current scope's text contains `text`
    pub fn has_content(&self, text: &str) -> EncloseResult<bool> {
        Ok(self.text()?.contains(&normalize_whitespace(text)))
    }

    /// Whether the current scope's text lacks `text`
    pub fn has_no_content(&self, text: &str) -> EncloseResult<bool> {
        self.has_content(text).map(|found| !found)
    }

    /// Whether `query` matches anything in the current scope
    pub fn has_selector(&self, query: impl Into<Query>) -> EncloseResult<bool> {
        self.all(query).map(|nodes| !nodes.is_empty())
    }

    /// Whether the XPath expression matches anything in the current scope
    pub fn has_xpath(&self, path: &str) -> EncloseResult<bool> {
        self.has_selector(Query::xpath(path))
    }

    /// Whether the CSS selector matches anything in the current scope
    pub fn has_css(&self, css: &str) -> EncloseResult<bool> {
        self.has_selector(Query::css(css))
    }

    fn normalize(&self, query: Query, options: FilterOptions) -> Selector {
        let selector = query.normalize(self.default_selector.get(), options);
        trace!(%selector, "normalized");
        selector
    }

    fn resolve(&self, selector: &Selector) -> EncloseResult<Node> {
        self.resolver
            .resolve(&self.driver, &self.current_scope(), selector)
    }

    fn locate(&self, xpath: String) -> EncloseResult<Node> {
        self.resolve(&Selector::xpath(xpath))
    }

    /// `primary`, or `fallback` if `primary` matches nothing
    fn resolve_either(&self, primary: String, fallback: String) -> EncloseResult<Node> {
        match self.locate(primary) {
            Err(err) if err.is_not_found() => self.locate(fallback),
            found => found,
        }
    }
}
