//! Block-aware whitespace collapsing.
//!
//! HTML source formatting (indentation, line breaks between tags) must not
//! leak into the Markdown. Runs of ASCII whitespace in text nodes become a
//! single space; spaces are dropped at block boundaries and after another
//! space. `pre` subtrees are left alone. Comments and text nodes that end up
//! empty are pruned.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::{Node, NodePath, NodeType};
use crate::utilities::{is_block, is_void};

static ASCII_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \r\n\t]+").expect("valid whitespace pattern"));

#[derive(Debug, Clone, Copy)]
enum Boundary {
    /// Block element or `<br>`: whitespace on either side is insignificant
    Block,
    /// Void inline element: keep the space after it
    Opaque,
    /// Any other inline element
    Inline,
}

enum Event {
    Element(Boundary),
    Text(NodePath),
}

/// Collapse whitespace in the subtree rooted at `root`, in place.
pub fn collapse_whitespace(root: &mut Node) {
    if root.is_tag("pre") || root.child_count() == 0 {
        return;
    }

    let mut events = Vec::new();
    collect_events(root, &mut Vec::new(), &mut events);

    let mut texts: Vec<(NodePath, String)> = Vec::new();
    let mut prev_text: Option<usize> = None;
    let mut keep_leading_ws = false;

    for event in events {
        match event {
            Event::Text(path) => {
                let raw = root
                    .node_at(&path)
                    .and_then(|n| n.node_value.as_deref())
                    .unwrap_or("");
                let mut text = ASCII_WHITESPACE.replace_all(raw, " ").into_owned();

                let after_space = prev_text.map_or(true, |i| texts[i].1.ends_with(' '));
                if after_space && !keep_leading_ws && text.starts_with(' ') {
                    text.remove(0);
                }

                let keep = !text.is_empty();
                texts.push((path, text));
                if keep {
                    prev_text = Some(texts.len() - 1);
                }
            }
            Event::Element(Boundary::Block) => {
                if let Some(i) = prev_text.take() {
                    trim_trailing_space(&mut texts[i].1);
                }
                keep_leading_ws = false;
            }
            Event::Element(Boundary::Opaque) => {
                prev_text = None;
                keep_leading_ws = true;
            }
            Event::Element(Boundary::Inline) => {
                if prev_text.is_some() {
                    keep_leading_ws = false;
                }
            }
        }
    }

    if let Some(i) = prev_text {
        trim_trailing_space(&mut texts[i].1);
    }

    for (path, text) in texts {
        if let Some(node) = root.node_at_mut(&path) {
            node.node_value = Some(text);
        }
    }

    prune(root);
}

fn boundary_of(node: &Node) -> Boundary {
    let tag = node.tag_name();
    if is_block(&tag) || tag == "br" {
        Boundary::Block
    } else if is_void(&tag) {
        Boundary::Opaque
    } else {
        Boundary::Inline
    }
}

/// Elements with children are reported on entry and on exit.
fn collect_events(node: &Node, path: &mut NodePath, events: &mut Vec<Event>) {
    for (i, child) in node.children().enumerate() {
        path.push(i);
        match child.node_type {
            NodeType::Text => events.push(Event::Text(path.clone())),
            NodeType::Element => {
                let boundary = boundary_of(child);
                events.push(Event::Element(boundary));
                if !child.is_tag("pre") && child.child_count() > 0 {
                    collect_events(child, path, events);
                    events.push(Event::Element(boundary));
                }
            }
            NodeType::Document | NodeType::DocumentFragment => collect_events(child, path, events),
            NodeType::Comment => {}
        }
        path.pop();
    }
}

fn trim_trailing_space(text: &mut String) {
    if text.ends_with(' ') {
        text.pop();
    }
}

fn prune(node: &mut Node) {
    if node.is_tag("pre") {
        return;
    }
    if let Some(children) = node.children.as_mut() {
        children.retain(|child| match child.node_type {
            NodeType::Text => child.node_value.as_deref().is_some_and(|v| !v.is_empty()),
            NodeType::Comment => false,
            _ => true,
        });
        children.iter_mut().for_each(prune);
    }
}
