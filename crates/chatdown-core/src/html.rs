//! HTML parsing support.
//!
//! Converts `scraper`/html5ever output into the CDP-style [`Node`] tree, for
//! callers that hold a page as an HTML string rather than a live DOM.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a Node tree rooted at an `html` element.
///
/// # Example
///
/// ```rust
/// use chatdown_core::{parse_html, MarkdownService};
///
/// let node = parse_html("<h1>Hello <em>World</em></h1>");
/// let markdown = MarkdownService::new().convert(&node).unwrap();
/// assert!(markdown.contains("_World_"));
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    scraper_to_node(document.root_element())
}

/// Parse a complete HTML document (`<head>` included) into a Node tree.
pub fn parse_document(html: &str) -> Node {
    let document = Html::parse_document(html);
    scraper_to_node(document.root_element())
}

fn element_node(element: ElementRef) -> Node {
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    Node::element_with_attrs(element.value().name(), attrs)
}

/// Convert a scraper ElementRef to our Node structure.
///
/// Open elements sit on an explicit stack with their unvisited children, so
/// deeply nested markup cannot overflow the call stack.
fn scraper_to_node(root: ElementRef) -> Node {
    let mut stack = vec![(element_node(root), root.children().collect::<Vec<_>>().into_iter())];
    let mut converted = None;

    while let Some((node, children)) = stack.last_mut() {
        match children.next() {
            Some(child) => match child.value() {
                ScraperNode::Text(text) => node.add_child(Node::text(&text.text)),
                ScraperNode::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        let grandchildren = element.children().collect::<Vec<_>>().into_iter();
                        stack.push((element_node(element), grandchildren));
                    }
                }
                _ => {}
            },
            None => {
                if let Some((done, _)) = stack.pop() {
                    match stack.last_mut() {
                        Some((parent, _)) => parent.add_child(done),
                        None => converted = Some(done),
                    }
                }
            }
        }
    }

    converted.unwrap_or_else(|| element_node(root))
}
