//! Abstract syntax tree for parsed XPath expressions.

/// An XPath expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `a or b`
    Or(Box<Expr>, Box<Expr>),
    /// `a and b`
    And(Box<Expr>, Box<Expr>),
    /// Equality or relational comparison
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    /// `a | b`
    Union(Box<Expr>, Box<Expr>),
    /// Location path
    Path(LocationPath),
    /// String literal
    Literal(String),
    /// Number literal
    Number(f64),
    /// Function call
    Function(String, Vec<Expr>),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

/// Where a location path starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Relative to the context node
    Context,
    /// Starts with `/` or `//`
    Absolute,
}

/// A sequence of steps
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// Start of the path
    pub anchor: Anchor,
    /// Steps in order
    pub steps: Vec<Step>,
}

/// One location step
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Axis walked from each context node
    pub axis: Axis,
    /// Test every axis node must pass
    pub test: NodeTest,
    /// Filters applied in order
    pub predicates: Vec<Expr>,
}

impl Step {
    /// `descendant-or-self::node()`, the expansion of `//`
    #[must_use]
    pub const fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// Supported axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `child::`
    Child,
    /// `descendant::`
    Descendant,
    /// `descendant-or-self::`
    DescendantOrSelf,
    /// `self::`
    SelfAxis,
    /// `parent::`
    Parent,
    /// `ancestor::`
    Ancestor,
    /// `ancestor-or-self::`
    AncestorOrSelf,
    /// `following-sibling::`
    FollowingSibling,
    /// `preceding-sibling::`
    PrecedingSibling,
    /// `attribute::` or `@`
    Attribute,
}

impl Axis {
    /// Parse an axis name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "self" => Self::SelfAxis,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }
}

/// Node tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Element (or attribute) with this name
    Name(String),
    /// `*`
    Any,
    /// `text()`
    Text,
    /// `node()`
    Node,
}
