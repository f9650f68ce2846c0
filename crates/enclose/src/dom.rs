//! Document-order element index over a parsed HTML tree.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html};

/// Elements of a document in document order.
///
/// Positions in this index are what [`crate::Node`] handles carry, so CSS
/// and XPath matches can both be reported as plain indices.
#[derive(Debug)]
pub struct Dom<'a> {
    html: &'a Html,
    elements: Vec<ElementRef<'a>>,
    positions: HashMap<NodeId, usize>,
}

impl<'a> Dom<'a> {
    /// Index every element of `html`
    #[must_use]
    pub fn new(html: &'a Html) -> Self {
        let elements: Vec<ElementRef<'a>> = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        let positions = elements
            .iter()
            .enumerate()
            .map(|(index, el)| (el.id(), index))
            .collect();
        Self {
            html,
            elements,
            positions,
        }
    }

    /// The parsed document
    #[must_use]
    pub const fn html(&self) -> &'a Html {
        self.html
    }

    /// Element at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ElementRef<'a>> {
        self.elements.get(index).copied()
    }

    /// Position of `element`, which must belong to this document
    #[must_use]
    pub fn index_of(&self, element: &ElementRef<'a>) -> Option<usize> {
        self.positions.get(&element.id()).copied()
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements in document order
    pub fn iter(&self) -> impl Iterator<Item = ElementRef<'a>> + '_ {
        self.elements.iter().copied()
    }

    /// Nearest ancestor of `element` (exclusive) with tag `name`
    #[must_use]
    pub fn ancestor_named(&self, element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ancestor.value().name() == name)
    }

    /// `<body>` if present, else the root element
    #[must_use]
    pub fn body(&self) -> ElementRef<'a> {
        self.elements
            .iter()
            .copied()
            .find(|el| el.value().name() == "body")
            .unwrap_or_else(|| self.html.root_element())
    }
}

/// Concatenated text of all descendant text nodes
#[must_use]
pub fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Collapse runs of whitespace into single spaces and trim
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>T</title></head>
        <body><div id="a"><p>one</p><p>two</p></div><form><input name="x"></form></body></html>"#;

    #[test]
    fn test_document_order() {
        let html = Html::parse_document(PAGE);
        let dom = Dom::new(&html);
        let names: Vec<_> = dom.iter().map(|el| el.value().name().to_string()).collect();
        assert_eq!(
            names,
            ["html", "head", "title", "body", "div", "p", "p", "form", "input"]
        );
    }

    #[test]
    fn test_index_of_round_trips() {
        let html = Html::parse_document(PAGE);
        let dom = Dom::new(&html);
        let p = dom.get(6).unwrap();
        assert_eq!(dom.index_of(&p), Some(6));
        assert_eq!(raw_text(p), "two");
    }

    #[test]
    fn test_index_of_every_element() {
        let html = Html::parse_document(PAGE);
        let dom = Dom::new(&html);
        for (index, el) in dom.iter().enumerate() {
            assert_eq!(dom.index_of(&el), Some(index));
        }
    }

    #[test]
    fn test_ancestor_named() {
        let html = Html::parse_document(PAGE);
        let dom = Dom::new(&html);
        let input = dom.get(8).unwrap();
        let form = dom.ancestor_named(input, "form").unwrap();
        assert_eq!(form.value().name(), "form");
        assert!(dom.ancestor_named(input, "table").is_none());
    }

    #[test]
    fn test_body_text() {
        let html = Html::parse_document(PAGE);
        let dom = Dom::new(&html);
        assert_eq!(normalize_whitespace(&raw_text(dom.body())), "onetwo");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        assert_eq!(normalize_whitespace(""), "");
    }
}
