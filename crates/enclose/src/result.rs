//! Result and error types for enclose.

use thiserror::Error;

use crate::node::{Node, Scope};
use crate::selector::{Selector, SelectorKind};

/// Result type for enclose operations
pub type EncloseResult<T> = Result<T, EncloseError>;

/// Errors that can occur while resolving scopes and driving a document
#[derive(Debug, Error)]
pub enum EncloseError {
    /// A selector matched nothing under the given scope
    #[error("Unable to find {selector} within {scope}")]
    ElementNotFound {
        /// Selector that was resolved
        selector: Selector,
        /// Scope it was resolved against
        scope: Scope,
    },

    /// Selector kind tag is not one of the supported kinds
    #[error("Unsupported selector kind: {kind:?} (expected \"css\" or \"xpath\")")]
    UnsupportedSelectorKind {
        /// The rejected tag
        kind: String,
    },

    /// Locator could not be parsed under its kind
    #[error("Invalid {kind} selector {locator:?}: {message}")]
    InvalidSelector {
        /// Kind the locator was parsed as
        kind: SelectorKind,
        /// The locator text
        locator: String,
        /// Parser message
        message: String,
    },

    /// Node belongs to a document that is no longer loaded
    #[error("Stale node {node}: the document it belonged to has been replaced")]
    StaleNode {
        /// The stale handle
        node: Node,
    },

    /// No document has been loaded yet
    #[error("No document loaded; call visit first")]
    NoDocument,

    /// Navigation failed
    #[error("Navigation to {path} failed: {message}")]
    Navigation {
        /// Requested path
        path: String,
        /// Error message
        message: String,
    },

    /// The driver cannot perform an action on a node
    #[error("Cannot {action}: {message}")]
    UnsupportedAction {
        /// Action name
        action: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl EncloseError {
    /// Create a not-found error
    #[must_use]
    pub fn not_found(selector: Selector, scope: Scope) -> Self {
        Self::ElementNotFound { selector, scope }
    }

    /// Create an unsupported selector kind error
    #[must_use]
    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedSelectorKind { kind: kind.into() }
    }

    /// Create a navigation error
    #[must_use]
    pub fn navigation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported action error
    #[must_use]
    pub fn unsupported_action(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check whether this is an `ElementNotFound`
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}
