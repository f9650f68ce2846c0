//! XPath 1.0 subset over parsed HTML.
//!
//! Covers what locator expressions need: location paths over the element
//! axes, attribute and `text()` steps, predicates, comparisons, `and`/`or`,
//! unions and the core string functions. [`html`] builds the expressions
//! behind the semantic scope helpers.
//!
//! # Example
//!
//! ```rust
//! use enclose::dom::Dom;
//! use enclose::xpath;
//! use scraper::Html;
//!
//! let html = Html::parse_document("<ul><li>a</li><li>b</li></ul>");
//! let dom = Dom::new(&html);
//! let found = xpath::select(&dom, None, "//li[2]").unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod ast;
pub mod eval;
pub mod html;
pub mod lexer;
pub mod parser;

use thiserror::Error;

use crate::dom::Dom;

pub use eval::Evaluator;
pub use parser::parse;

/// Errors raised while parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// Malformed expression
    #[error("syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset of the offending token
        position: usize,
        /// What went wrong
        message: String,
    },

    /// Valid XPath outside the supported subset
    #[error("unsupported XPath construct: {0}")]
    Unsupported(String),

    /// Call to a function this evaluator does not know
    #[error("unknown function {0}()")]
    UnknownFunction(String),

    /// Function called with the wrong number of arguments
    #[error("{name}() expects {expected} argument(s)")]
    Arity {
        /// Function name
        name: String,
        /// Accepted argument counts
        expected: &'static str,
    },

    /// The expression evaluated to a string, number or boolean
    #[error("expression does not select elements")]
    NotANodeSet,

    /// Scope index outside the document
    #[error("scope element #{0} is not part of this document")]
    UnknownScope(usize),
}

impl XPathError {
    /// Syntax error at `position`
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Parse `expression` and evaluate it under `scope`.
///
/// `scope` is the document-order index of the scoping element, or `None`
/// for the whole document. Returns matching element indices in document
/// order.
pub fn select(
    dom: &Dom<'_>,
    scope: Option<usize>,
    expression: &str,
) -> Result<Vec<usize>, XPathError> {
    let expr = parse(expression)?;
    Evaluator::new(dom).select(scope, &expr)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn test_select_parses_and_evaluates() {
        let html = Html::parse_document(r#"<p id="a">x</p><p id="b">y</p>"#);
        let dom = Dom::new(&html);
        let found = select(&dom, None, "//p[@id='b']").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(dom.get(found[0]).unwrap().value().attr("id"), Some("b"));
    }

    #[test]
    fn test_select_reports_syntax_errors() {
        let html = Html::parse_document("<p></p>");
        let dom = Dom::new(&html);
        assert!(matches!(
            select(&dom, None, "//p[").unwrap_err(),
            XPathError::Syntax { .. }
        ));
    }

    #[test]
    fn test_unknown_scope() {
        let html = Html::parse_document("<p></p>");
        let dom = Dom::new(&html);
        assert_eq!(
            select(&dom, Some(99), ".//p").unwrap_err(),
            XPathError::UnknownScope(99)
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            XPathError::syntax(3, "expected ]").to_string(),
            "syntax error at offset 3: expected ]"
        );
        assert_eq!(
            XPathError::UnknownFunction("foo".into()).to_string(),
            "unknown function foo()"
        );
    }
}
