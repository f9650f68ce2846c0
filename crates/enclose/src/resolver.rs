//! Query resolution: selector + scope → node.
//!
//! The driver reports every match of the locator under the scope in
//! document order; the resolver applies the selector's filter options and
//! keeps the first survivor. Ambiguous matches are not an error.
//!
//! # Design Philosophy
//!
//! - **Jidoka**: a query that matches nothing stops with `ElementNotFound`
//!   naming both the selector and the scope it ran in
//! - **Open filters**: option keys beyond `text` dispatch to registered
//!   [`NodeFilter`]s; keys nobody handles are ignored

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::dom::normalize_whitespace;
use crate::driver::DocumentQuery;
use crate::node::{Node, Scope};
use crate::result::{EncloseError, EncloseResult};
use crate::selector::{FilterOptions, Selector};

/// A filter for one option key
pub trait NodeFilter: Send + Sync {
    /// Option key this filter handles
    fn key(&self) -> &str;

    /// Whether `node` passes the filter for the option `value`
    fn accepts(
        &self,
        document: &dyn DocumentQuery,
        node: &Node,
        value: &serde_json::Value,
    ) -> EncloseResult<bool>;
}

/// `exact_text`: normalized text equals the option value
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactText;

impl NodeFilter for ExactText {
    fn key(&self) -> &str {
        "exact_text"
    }

    fn accepts(
        &self,
        document: &dyn DocumentQuery,
        node: &Node,
        value: &serde_json::Value,
    ) -> EncloseResult<bool> {
        let expected = value
            .as_str()
            .map_or_else(|| value.to_string(), normalize_whitespace);
        Ok(document.text_of(node)? == expected)
    }
}

/// Resolves selectors against a document with a registry of filters
#[derive(Clone)]
pub struct Resolver {
    filters: BTreeMap<String, Arc<dyn NodeFilter>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::empty().with_filter(ExactText)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Resolver {
    /// Resolver with the built-in filters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver without any registered filters
    #[must_use]
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// Register `filter`, replacing any filter with the same key
    #[must_use]
    pub fn with_filter(mut self, filter: impl NodeFilter + 'static) -> Self {
        self.register(filter);
        self
    }

    /// Register `filter` in place
    pub fn register(&mut self, filter: impl NodeFilter + 'static) {
        let _ = self
            .filters
            .insert(filter.key().to_string(), Arc::new(filter));
    }

    /// Registered option keys
    pub fn filter_keys(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// First node under `scope` matching `selector`
    pub fn resolve<D: DocumentQuery>(
        &self,
        document: &D,
        scope: &Scope,
        selector: &Selector,
    ) -> EncloseResult<Node> {
        let candidates = document.query_all(scope, selector.kind(), selector.locator())?;
        trace!(%selector, %scope, candidates = candidates.len(), "resolving");
        for node in candidates {
            if self.accepts(document, &node, selector.options())? {
                trace!(%node, "resolved");
                return Ok(node);
            }
        }
        Err(EncloseError::not_found(selector.clone(), *scope))
    }

    /// Every node under `scope` matching `selector`, in document order
    pub fn resolve_all<D: DocumentQuery>(
        &self,
        document: &D,
        scope: &Scope,
        selector: &Selector,
    ) -> EncloseResult<Vec<Node>> {
        let mut found = Vec::new();
        for node in document.query_all(scope, selector.kind(), selector.locator())? {
            if self.accepts(document, &node, selector.options())? {
                found.push(node);
            }
        }
        trace!(%selector, %scope, matches = found.len(), "resolved all");
        Ok(found)
    }

    fn accepts<D: DocumentQuery>(
        &self,
        document: &D,
        node: &Node,
        options: &FilterOptions,
    ) -> EncloseResult<bool> {
        if let Some(text) = &options.text {
            if !document.text_of(node)?.contains(&normalize_whitespace(text)) {
                return Ok(false);
            }
        }
        for (key, value) in &options.extra {
            match self.filters.get(key) {
                Some(filter) => {
                    if !filter.accepts(document, node, value)? {
                        return Ok(false);
                    }
                }
                None => trace!(key = %key, "ignoring filter option without a registered filter"),
            }
        }
        Ok(true)
    }
}
