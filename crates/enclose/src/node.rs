//! Element handles and query roots.

use std::fmt;

use uuid::Uuid;

use crate::driver::Driver;
use crate::result::EncloseResult;
use crate::selector::Query;
use crate::session::Session;

/// Ownership-free handle to an element of a loaded document.
///
/// A node is the pair (owning document, element position in document
/// order). It borrows nothing, so it can be stored, copied and passed to
/// [`Session::within`] freely; every operation on it goes through a driver,
/// which rejects it with `StaleNode` once its document has been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    document: Uuid,
    index: usize,
}

impl Node {
    /// Create a handle; drivers call this when reporting matches
    #[must_use]
    pub const fn new(document: Uuid, index: usize) -> Self {
        Self { document, index }
    }

    /// Identity of the owning document
    #[must_use]
    pub const fn document(&self) -> Uuid {
        self.document
    }

    /// Position among the document's elements, in document order
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Find the first descendant of this node matching `query`
    pub fn find<D: Driver>(
        &self,
        session: &Session<D>,
        query: impl Into<Query>,
    ) -> EncloseResult<Self> {
        session.find_from(&Scope::Node(*self), query)
    }

    /// Whitespace-normalized text of this node
    pub fn text<D: Driver>(&self, session: &Session<D>) -> EncloseResult<String> {
        session.text_of(self)
    }

    /// Attribute value, if present
    pub fn attribute<D: Driver>(
        &self,
        session: &Session<D>,
        name: &str,
    ) -> EncloseResult<Option<String>> {
        session.driver().attribute(self, name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element #{} of document {}", self.index, self.document)
    }
}

/// Root a query is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// The whole document, no restriction
    #[default]
    Root,
    /// The subtree below a node
    Node(Node),
}

impl Scope {
    /// The node, unless this is the document root
    #[must_use]
    pub const fn node(&self) -> Option<&Node> {
        match self {
            Self::Root => None,
            Self::Node(node) => Some(node),
        }
    }

    /// Whether this is the unrestricted document root
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl From<Node> for Scope {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("document"),
            Self::Node(node) => node.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_equal_by_document_and_index() {
        let doc = Uuid::new_v4();
        assert_eq!(Node::new(doc, 3), Node::new(doc, 3));
        assert_ne!(Node::new(doc, 3), Node::new(doc, 4));
        assert_ne!(Node::new(doc, 3), Node::new(Uuid::new_v4(), 3));
    }

    #[test]
    fn test_scope_default_is_root() {
        let scope = Scope::default();
        assert!(scope.is_root());
        assert!(scope.node().is_none());
        assert_eq!(scope.to_string(), "document");
    }

    #[test]
    fn test_scope_from_node() {
        let node = Node::new(Uuid::new_v4(), 7);
        let scope = Scope::from(node);
        assert_eq!(scope.node(), Some(&node));
        assert!(scope.to_string().starts_with("element #7"));
    }
}
