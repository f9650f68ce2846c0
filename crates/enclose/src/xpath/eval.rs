//! Expression evaluator over a [`Dom`].
//!
//! Paths written with a leading `/` or `//` start from the evaluation
//! anchor. At the top level the anchor is the scope the query runs in, so a
//! scoped query never escapes its subtree; inside predicates the anchor is
//! the document, which lets a field predicate look up its `<label>`
//! anywhere on the page.

use std::cell::RefCell;
use std::collections::HashMap;

use scraper::ElementRef;

use super::ast::{Anchor, Axis, CompareOp, Expr, LocationPath, NodeTest, Step};
use super::XPathError;
use crate::dom::{normalize_whitespace, raw_text, Dom};

/// A node an expression can visit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
    /// The document node above the root element
    Document,
    /// An element
    Element(ElementRef<'a>),
}

/// Result of evaluating an expression
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// Node-set in document order
    Nodes(Vec<Item<'a>>),
    /// Attribute or text node-set, reduced to string values
    Strings(Vec<String>),
    /// String
    Str(String),
    /// Number
    Num(f64),
    /// Boolean
    Bool(bool),
}

impl Value<'_> {
    const fn is_set(&self) -> bool {
        matches!(self, Self::Nodes(_) | Self::Strings(_))
    }

    fn boolean(&self) -> bool {
        match self {
            Self::Nodes(items) => !items.is_empty(),
            Self::Strings(values) => !values.is_empty(),
            Self::Str(s) => !s.is_empty(),
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Bool(b) => *b,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    item: Item<'a>,
    position: usize,
    size: usize,
    anchor: Item<'a>,
}

/// Evaluates parsed expressions against one document
#[derive(Debug)]
pub struct Evaluator<'d, 'a> {
    dom: &'d Dom<'a>,
    /// Document-anchored paths seen in predicates, keyed by AST address.
    /// Their value does not depend on the context node.
    absolute: RefCell<HashMap<*const LocationPath, Value<'a>>>,
}

impl<'d, 'a> Evaluator<'d, 'a> {
    /// Evaluator over `dom`
    #[must_use]
    pub fn new(dom: &'d Dom<'a>) -> Self {
        Self {
            dom,
            absolute: RefCell::new(HashMap::new()),
        }
    }

    /// Evaluate `expr` under `scope` (an element index, or the document)
    /// and return the selected elements' indices in document order.
    pub fn select(&self, scope: Option<usize>, expr: &Expr) -> Result<Vec<usize>, XPathError> {
        self.absolute.borrow_mut().clear();
        let anchor = match scope {
            None => Item::Document,
            Some(index) => Item::Element(
                self.dom
                    .get(index)
                    .ok_or(XPathError::UnknownScope(index))?,
            ),
        };
        let ctx = Context {
            item: anchor,
            position: 1,
            size: 1,
            anchor,
        };
        match self.eval(expr, &ctx)? {
            Value::Nodes(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Item::Element(el) => self.dom.index_of(&el),
                    Item::Document => None,
                })
                .collect()),
            _ => Err(XPathError::NotANodeSet),
        }
    }

    fn eval(&self, expr: &Expr, ctx: &Context<'a>) -> Result<Value<'a>, XPathError> {
        match expr {
            Expr::Or(left, right) => {
                if self.eval(left, ctx)?.boolean() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval(right, ctx)?.boolean()))
            }
            Expr::And(left, right) => {
                if !self.eval(left, ctx)?.boolean() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval(right, ctx)?.boolean()))
            }
            Expr::Compare(op, left, right) => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                Ok(Value::Bool(self.compare(*op, &left, &right)))
            }
            Expr::Union(left, right) => match (self.eval(left, ctx)?, self.eval(right, ctx)?) {
                (Value::Nodes(mut a), Value::Nodes(b)) => {
                    a.extend(b);
                    Ok(Value::Nodes(self.document_order(a)))
                }
                (Value::Strings(mut a), Value::Strings(b)) => {
                    a.extend(b);
                    Ok(Value::Strings(a))
                }
                _ => Err(XPathError::Unsupported(
                    "union of values that are not node-sets".into(),
                )),
            },
            Expr::Path(path) => self.path(path, ctx),
            Expr::Literal(s) => Ok(Value::Str(s.clone())),
            Expr::Number(n) => Ok(Value::Num(*n)),
            Expr::Function(name, args) => self.function(name, args, ctx),
        }
    }

    fn path(&self, path: &LocationPath, ctx: &Context<'a>) -> Result<Value<'a>, XPathError> {
        if path.anchor == Anchor::Absolute && ctx.anchor == Item::Document {
            let key: *const LocationPath = path;
            let cached = self.absolute.borrow().get(&key).cloned();
            if let Some(value) = cached {
                return Ok(value);
            }
            let value = self.walk_path(path, Item::Document)?;
            let _ = self.absolute.borrow_mut().insert(key, value.clone());
            return Ok(value);
        }
        let start = match path.anchor {
            Anchor::Context => ctx.item,
            Anchor::Absolute => ctx.anchor,
        };
        self.walk_path(path, start)
    }

    fn walk_path(&self, path: &LocationPath, start: Item<'a>) -> Result<Value<'a>, XPathError> {
        let mut current = vec![start];

        for (i, step) in path.steps.iter().enumerate() {
            let yields_strings = step.axis == Axis::Attribute || step.test == NodeTest::Text;
            if !yields_strings {
                current = self.step(&current, step)?;
                continue;
            }
            if i + 1 != path.steps.len() {
                return Err(XPathError::Unsupported(
                    "steps after an attribute or text() step".into(),
                ));
            }
            if !step.predicates.is_empty() {
                return Err(XPathError::Unsupported(
                    "predicates on attribute or text() steps".into(),
                ));
            }
            let strings = current
                .iter()
                .flat_map(|item| string_nodes(*item, step))
                .collect();
            return Ok(Value::Strings(strings));
        }

        Ok(Value::Nodes(current))
    }

    fn step(&self, items: &[Item<'a>], step: &Step) -> Result<Vec<Item<'a>>, XPathError> {
        let mut selected = Vec::new();
        for item in items {
            let mut candidates: Vec<Item<'a>> = walk(*item, step.axis, self.dom.html().root_element())
                .into_iter()
                .filter(|candidate| passes(candidate, &step.test))
                .collect();
            for predicate in &step.predicates {
                candidates = self.filter(candidates, predicate)?;
            }
            selected.extend(candidates);
        }
        Ok(self.document_order(selected))
    }

    fn filter(
        &self,
        candidates: Vec<Item<'a>>,
        predicate: &Expr,
    ) -> Result<Vec<Item<'a>>, XPathError> {
        let size = candidates.len();
        let mut kept = Vec::with_capacity(size);
        for (i, item) in candidates.into_iter().enumerate() {
            let ctx = Context {
                item,
                position: i + 1,
                size,
                anchor: Item::Document,
            };
            let keep = match self.eval(predicate, &ctx)? {
                Value::Num(n) => n == (i + 1) as f64,
                other => other.boolean(),
            };
            if keep {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    fn document_order(&self, items: Vec<Item<'a>>) -> Vec<Item<'a>> {
        let mut keyed: Vec<(Option<usize>, Item<'a>)> = items
            .into_iter()
            .map(|item| {
                let key = match item {
                    Item::Document => None,
                    Item::Element(el) => self.dom.index_of(&el),
                };
                (key, item)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        keyed.dedup_by_key(|(key, _)| *key);
        keyed.into_iter().map(|(_, item)| item).collect()
    }

    fn string_value(&self, item: Item<'a>) -> String {
        match item {
            Item::Document => raw_text(self.dom.html().root_element()),
            Item::Element(el) => raw_text(el),
        }
    }

    fn set_strings(&self, value: &Value<'a>) -> Vec<String> {
        match value {
            Value::Nodes(items) => items.iter().map(|item| self.string_value(*item)).collect(),
            Value::Strings(values) => values.clone(),
            _ => Vec::new(),
        }
    }

    fn string(&self, value: &Value<'a>) -> String {
        match value {
            Value::Nodes(items) => items
                .first()
                .map(|item| self.string_value(*item))
                .unwrap_or_default(),
            Value::Strings(values) => values.first().cloned().unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn number(&self, value: &Value<'a>) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            other => self.string(other).trim().parse().unwrap_or(f64::NAN),
        }
    }

    fn compare(&self, op: CompareOp, left: &Value<'a>, right: &Value<'a>) -> bool {
        match (left.is_set(), right.is_set()) {
            (true, true) => {
                let rights = self.set_strings(right);
                self.set_strings(left).into_iter().any(|l| {
                    rights.iter().any(|r| {
                        self.compare_atoms(op, &Value::Str(l.clone()), &Value::Str(r.clone()))
                    })
                })
            }
            (true, false) => match right {
                Value::Bool(_) => self.compare_atoms(op, &Value::Bool(left.boolean()), right),
                _ => self
                    .set_strings(left)
                    .into_iter()
                    .any(|l| self.compare_atoms(op, &Value::Str(l), right)),
            },
            (false, true) => match left {
                Value::Bool(_) => self.compare_atoms(op, left, &Value::Bool(right.boolean())),
                _ => self
                    .set_strings(right)
                    .into_iter()
                    .any(|r| self.compare_atoms(op, left, &Value::Str(r))),
            },
            (false, false) => self.compare_atoms(op, left, right),
        }
    }

    fn compare_atoms(&self, op: CompareOp, left: &Value<'a>, right: &Value<'a>) -> bool {
        match op {
            CompareOp::Eq | CompareOp::NotEq => {
                let equal = if matches!(left, Value::Bool(_)) || matches!(right, Value::Bool(_)) {
                    left.boolean() == right.boolean()
                } else if matches!(left, Value::Num(_)) || matches!(right, Value::Num(_)) {
                    self.number(left) == self.number(right)
                } else {
                    self.string(left) == self.string(right)
                };
                if op == CompareOp::Eq {
                    equal
                } else {
                    !equal
                }
            }
            CompareOp::Lt => self.number(left) < self.number(right),
            CompareOp::LtEq => self.number(left) <= self.number(right),
            CompareOp::Gt => self.number(left) > self.number(right),
            CompareOp::GtEq => self.number(left) >= self.number(right),
        }
    }

    fn function(
        &self,
        name: &str,
        args: &[Expr],
        ctx: &Context<'a>,
    ) -> Result<Value<'a>, XPathError> {
        let arity = |expected: &'static str, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(XPathError::Arity {
                    name: name.to_string(),
                    expected,
                })
            }
        };
        let context_value = || Value::Nodes(vec![ctx.item]);

        match name {
            "contains" | "starts-with" => {
                arity("2", args.len() == 2)?;
                let haystack = self.string(&self.eval(&args[0], ctx)?);
                let needle = self.string(&self.eval(&args[1], ctx)?);
                Ok(Value::Bool(if name == "contains" {
                    haystack.contains(&needle)
                } else {
                    haystack.starts_with(&needle)
                }))
            }
            "normalize-space" | "string" | "string-length" => {
                arity("0 or 1", args.len() <= 1)?;
                let value = match args.first() {
                    Some(arg) => self.eval(arg, ctx)?,
                    None => context_value(),
                };
                let s = self.string(&value);
                Ok(match name {
                    "normalize-space" => Value::Str(normalize_whitespace(&s)),
                    "string" => Value::Str(s),
                    _ => Value::Num(s.chars().count() as f64),
                })
            }
            "concat" => {
                arity("2 or more", args.len() >= 2)?;
                let mut out = String::new();
                for arg in args {
                    out.push_str(&self.string(&self.eval(arg, ctx)?));
                }
                Ok(Value::Str(out))
            }
            "not" | "boolean" => {
                arity("1", args.len() == 1)?;
                let b = self.eval(&args[0], ctx)?.boolean();
                Ok(Value::Bool(if name == "not" { !b } else { b }))
            }
            "true" | "false" => {
                arity("0", args.is_empty())?;
                Ok(Value::Bool(name == "true"))
            }
            "number" => {
                arity("0 or 1", args.len() <= 1)?;
                let value = match args.first() {
                    Some(arg) => self.eval(arg, ctx)?,
                    None => context_value(),
                };
                Ok(Value::Num(self.number(&value)))
            }
            "count" => {
                arity("1", args.len() == 1)?;
                match self.eval(&args[0], ctx)? {
                    Value::Nodes(items) => Ok(Value::Num(items.len() as f64)),
                    Value::Strings(values) => Ok(Value::Num(values.len() as f64)),
                    _ => Err(XPathError::Unsupported("count() of a non node-set".into())),
                }
            }
            "position" => {
                arity("0", args.is_empty())?;
                Ok(Value::Num(ctx.position as f64))
            }
            "last" => {
                arity("0", args.is_empty())?;
                Ok(Value::Num(ctx.size as f64))
            }
            "name" | "local-name" => {
                arity("0 or 1", args.len() <= 1)?;
                let value = match args.first() {
                    Some(arg) => self.eval(arg, ctx)?,
                    None => context_value(),
                };
                let name = match value {
                    Value::Nodes(items) => match items.first() {
                        Some(Item::Element(el)) => el.value().name().to_string(),
                        _ => String::new(),
                    },
                    _ => String::new(),
                };
                Ok(Value::Str(name))
            }
            other => Err(XPathError::UnknownFunction(other.to_string())),
        }
    }
}

fn parent(item: Item<'_>) -> Option<Item<'_>> {
    match item {
        Item::Document => None,
        Item::Element(el) => el
            .parent()
            .map(|node| ElementRef::wrap(node).map_or(Item::Document, Item::Element)),
    }
}

fn children<'a>(item: Item<'a>, root: ElementRef<'a>) -> Vec<Item<'a>> {
    match item {
        Item::Document => vec![Item::Element(root)],
        Item::Element(el) => el
            .children()
            .filter_map(ElementRef::wrap)
            .map(Item::Element)
            .collect(),
    }
}

/// Nodes on `axis` from `item`; reverse axes come nearest-first
fn walk<'a>(item: Item<'a>, axis: Axis, root: ElementRef<'a>) -> Vec<Item<'a>> {
    match axis {
        Axis::Child => children(item, root),
        Axis::Descendant => descendants(item, root),
        Axis::DescendantOrSelf => {
            let mut out = vec![item];
            out.extend(descendants(item, root));
            out
        }
        Axis::SelfAxis => vec![item],
        Axis::Parent => parent(item).into_iter().collect(),
        Axis::Ancestor => std::iter::successors(parent(item), |p| parent(*p)).collect(),
        Axis::AncestorOrSelf => std::iter::successors(Some(item), |p| parent(*p)).collect(),
        Axis::FollowingSibling => match item {
            Item::Document => Vec::new(),
            Item::Element(el) => el
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .map(Item::Element)
                .collect(),
        },
        Axis::PrecedingSibling => match item {
            Item::Document => Vec::new(),
            Item::Element(el) => el
                .prev_siblings()
                .filter_map(ElementRef::wrap)
                .map(Item::Element)
                .collect(),
        },
        Axis::Attribute => Vec::new(),
    }
}

fn descendants<'a>(item: Item<'a>, root: ElementRef<'a>) -> Vec<Item<'a>> {
    let (start, skip) = match item {
        Item::Document => (root, 0),
        Item::Element(el) => (el, 1),
    };
    start
        .descendants()
        .skip(skip)
        .filter_map(ElementRef::wrap)
        .map(Item::Element)
        .collect()
}

fn passes(item: &Item<'_>, test: &NodeTest) -> bool {
    match (item, test) {
        (_, NodeTest::Node) => true,
        (Item::Element(_), NodeTest::Any) => true,
        (Item::Element(el), NodeTest::Name(name)) => el.value().name().eq_ignore_ascii_case(name),
        _ => false,
    }
}

fn string_nodes(item: Item<'_>, step: &Step) -> Vec<String> {
    let Item::Element(el) = item else {
        return Vec::new();
    };
    if step.axis == Axis::Attribute {
        return match &step.test {
            NodeTest::Name(name) => el.value().attr(name).map(str::to_string).into_iter().collect(),
            NodeTest::Any | NodeTest::Node => {
                el.value().attrs().map(|(_, value)| value.to_string()).collect()
            }
            NodeTest::Text => Vec::new(),
        };
    }
    match step.axis {
        Axis::Child => el
            .children()
            .filter_map(|child| child.value().as_text().map(|text| text.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
