//! Nested scope tracking.
//!
//! The stack holds the nodes pushed by active `within` blocks; the document
//! root is its implicit bottom. Entries are only added through
//! [`ScopeGuard::enter`], whose `Drop` removes exactly the entry it added, so
//! the depth after a block is the depth before it on every exit path,
//! including `?` propagation and panic unwinding.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::node::{Node, Scope};
use crate::selector::{Query, Selector, SelectorKind};

/// What a `within` block is scoped to
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeTarget {
    /// Resolve a query against the current scope first
    Query(Query),
    /// Use an already located node directly
    Node(Node),
}

impl From<Query> for ScopeTarget {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

impl From<Selector> for ScopeTarget {
    fn from(selector: Selector) -> Self {
        Self::Query(selector.into())
    }
}

impl From<&str> for ScopeTarget {
    fn from(locator: &str) -> Self {
        Self::Query(locator.into())
    }
}

impl From<String> for ScopeTarget {
    fn from(locator: String) -> Self {
        Self::Query(locator.into())
    }
}

impl<S: Into<String>> From<(SelectorKind, S)> for ScopeTarget {
    fn from(pair: (SelectorKind, S)) -> Self {
        Self::Query(pair.into())
    }
}

impl From<Node> for ScopeTarget {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<&Node> for ScopeTarget {
    fn from(node: &Node) -> Self {
        Self::Node(*node)
    }
}

/// Ordered record of nested active scopes; top = current
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    entries: Vec<Node>,
}

impl ScopeStack {
    /// Empty stack (current scope is the document root)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scope
    #[must_use]
    pub fn top(&self) -> Scope {
        self.entries.last().copied().map_or(Scope::Root, Scope::Node)
    }

    /// Number of pushed scopes (0 = document root)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Pushed nodes, outermost first
    #[must_use]
    pub fn entries(&self) -> &[Node] {
        &self.entries
    }

    fn push(&mut self, node: Node) {
        self.entries.push(node);
    }

    fn pop(&mut self) -> Option<Node> {
        self.entries.pop()
    }
}

/// Anything that owns a [`ScopeStack`] and can be scoped by a guard
pub trait ScopeOwner {
    /// Mutable access to the owned stack
    fn scope_stack_mut(&mut self) -> &mut ScopeStack;
}

impl ScopeOwner for ScopeStack {
    fn scope_stack_mut(&mut self) -> &mut ScopeStack {
        self
    }
}

/// Guard that keeps one scope pushed for its lifetime.
///
/// Dereferences to the owner, so the body of a block runs against the owner
/// with the new scope on top.
#[derive(Debug)]
pub struct ScopeGuard<'a, O: ScopeOwner> {
    owner: &'a mut O,
    depth: usize,
}

impl<'a, O: ScopeOwner> ScopeGuard<'a, O> {
    /// Push `node` and return the guard that will pop it
    pub fn enter(owner: &'a mut O, node: Node) -> Self {
        let stack = owner.scope_stack_mut();
        let depth = stack.depth();
        stack.push(node);
        debug!(depth = depth + 1, %node, "entered scope");
        Self { owner, depth }
    }

    /// Depth the owner returns to when the guard drops
    #[must_use]
    pub const fn restores_to(&self) -> usize {
        self.depth
    }
}

impl<O: ScopeOwner> Deref for ScopeGuard<'_, O> {
    type Target = O;

    fn deref(&self) -> &O {
        self.owner
    }
}

impl<O: ScopeOwner> DerefMut for ScopeGuard<'_, O> {
    fn deref_mut(&mut self) -> &mut O {
        self.owner
    }
}

impl<O: ScopeOwner> Drop for ScopeGuard<'_, O> {
    fn drop(&mut self) {
        let stack = self.owner.scope_stack_mut();
        debug_assert_eq!(stack.depth(), self.depth + 1, "unbalanced scope stack");
        let popped = stack.pop();
        debug!(depth = self.depth, popped = ?popped, "left scope");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn node(index: usize) -> Node {
        Node::new(Uuid::nil(), index)
    }

    #[test]
    fn test_empty_stack_top_is_root() {
        let stack = ScopeStack::new();
        assert_eq!(stack.top(), Scope::Root);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_guard_pushes_and_pops() {
        let mut stack = ScopeStack::new();
        {
            let guard = ScopeGuard::enter(&mut stack, node(1));
            assert_eq!(guard.top(), Scope::Node(node(1)));
            assert_eq!(guard.depth(), 1);
            assert_eq!(guard.restores_to(), 0);
        }
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.top(), Scope::Root);
    }

    #[test]
    fn test_nested_guards_restore_outer_top() {
        let mut stack = ScopeStack::new();
        let mut outer = ScopeGuard::enter(&mut stack, node(1));
        {
            let inner = ScopeGuard::enter(&mut *outer, node(2));
            assert_eq!(inner.top(), Scope::Node(node(2)));
            assert_eq!(inner.entries(), &[node(1), node(2)]);
        }
        assert_eq!(outer.top(), Scope::Node(node(1)));
        drop(outer);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_guard_pops_during_unwind() {
        let mut stack = ScopeStack::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ScopeGuard::enter(&mut stack, node(1));
            panic!("body failed");
        }));
        assert!(result.is_err());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_target_conversions() {
        assert!(matches!(ScopeTarget::from("//li"), ScopeTarget::Query(_)));
        assert!(matches!(
            ScopeTarget::from((SelectorKind::Css, "li")),
            ScopeTarget::Query(_)
        ));
        assert_eq!(ScopeTarget::from(&node(4)), ScopeTarget::Node(node(4)));
    }
}
