//! Rewrite the page's rich code widgets into plain `pre > code` blocks.
//!
//! A widget carries its language in a header label and the code in a nested
//! `pre code`. The canonical form keeps only the code text and records the
//! language in `data-language`, which the code block override rule reads.

use chatdown_core::Node;
use tracing::debug;

use crate::catalog::{CodeBlockSelectors, SelectorCatalog};
use crate::selector::{outermost, select_first, select_paths};

pub(crate) const LANGUAGE_ATTR: &str = "data-language";

/// Replace every well-formed code widget under `root` in place and return
/// how many were rewritten. Widgets missing a label or code are left as-is.
///
/// Running it twice changes nothing further.
pub fn normalize(root: &mut Node, catalog: &SelectorCatalog) -> usize {
    let selectors = &catalog.code_block;
    let widgets = outermost(select_paths(root, std::slice::from_ref(&selectors.container)));

    let mut rewritten = 0;
    for path in widgets.iter().rev() {
        let replacement = root
            .node_at(path)
            .and_then(|widget| canonical_from_widget(widget, selectors));
        match replacement {
            Some(node) => {
                root.replace_at(path, node);
                rewritten += 1;
            }
            None => debug!(?path, "code widget without label or code left in place"),
        }
    }
    rewritten
}

fn canonical_from_widget(widget: &Node, selectors: &CodeBlockSelectors) -> Option<Node> {
    let label = selectors
        .label
        .iter()
        .find_map(|selector| select_first(widget, selector))?;
    let code = select_first(widget, &selectors.body)?;
    Some(code_block(
        label.text_content().trim(),
        code.text_content().trim(),
    ))
}

/// `<pre><code data-language="{language}">{code}</code></pre>`
pub fn code_block(language: &str, code: &str) -> Node {
    let code_el = Node::element_with_attrs("code", vec![(LANGUAGE_ATTR, language)])
        .with_child(Node::text(code));
    Node::element("pre").with_child(code_el)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A widget with a header only when `label` is given, and a code body
    /// only when `code` is given.
    fn widget(label: Option<&str>, code: Option<&str>) -> Node {
        let mut widget = Node::element_with_attrs("div", vec![("class", "r1PmQe")]);
        if let Some(label) = label {
            widget.add_child(
                Node::element_with_attrs("div", vec![("class", "z0e9Qd")]).with_child(
                    Node::element_with_attrs("span", vec![("class", "vVRw1d")]).with_child(Node::text(label)),
                ),
            );
        }
        let mut body = Node::element_with_attrs("div", vec![("class", "pCTyYe")]);
        if let Some(code) = code {
            body.add_child(
                Node::element("pre").with_child(Node::element("code").with_child(Node::text(code))),
            );
        }
        widget.with_child(body)
    }

    #[test]
    fn test_rewrites_widget() {
        let mut root = Node::element("div").with_child(widget(Some(" python "), Some("\nprint('hi')\n")));
        assert_eq!(normalize(&mut root, SelectorCatalog::builtin()), 1);
        assert_eq!(root.node_at(&[0]), Some(&code_block("python", "print('hi')")));
    }

    #[test]
    fn test_label_falls_back_to_header_text() {
        let header = Node::element_with_attrs("div", vec![("class", "z0e9Qd")]).with_child(Node::text("rust"));
        let body = Node::element_with_attrs("div", vec![("class", "pCTyYe")]).with_child(
            Node::element("pre").with_child(Node::element("code").with_child(Node::text("fn main() {}"))),
        );
        let mut root = Node::element("div").with_child(
            Node::element_with_attrs("div", vec![("class", "r1PmQe")])
                .with_child(header)
                .with_child(body),
        );
        normalize(&mut root, SelectorCatalog::builtin());
        let code = root.node_at(&[0, 0]).unwrap();
        assert_eq!(code.attr(LANGUAGE_ATTR), Some("rust"));
    }

    #[test]
    fn test_incomplete_widgets_untouched() {
        let mut root = Node::element("div")
            .with_child(widget(None, Some("x = 1")))
            .with_child(widget(Some("python"), None));
        let before = root.clone();
        assert_eq!(normalize(&mut root, SelectorCatalog::builtin()), 0);
        assert_eq!(root, before);
    }

    #[test]
    fn test_empty_label_renders_bare_fence() {
        let catalog = SelectorCatalog::builtin();
        let mut root = Node::element("div").with_child(widget(Some(""), Some("x = 1")));
        assert_eq!(normalize(&mut root, catalog), 1);
        assert_eq!(root.node_at(&[0, 0]).and_then(|c| c.attr(LANGUAGE_ATTR)), Some(""));

        let md = crate::overrides::markdown_service(catalog).convert(&root).unwrap();
        assert_eq!(md.trim(), "```\nx = 1\n```");
    }

    #[test]
    fn test_idempotent() {
        let mut root = Node::element("div")
            .with_child(widget(Some("js"), Some("let a = 1;")))
            .with_child(Node::element("p").with_child(Node::text("between")))
            .with_child(widget(Some("sh"), Some("ls")));
        normalize(&mut root, SelectorCatalog::builtin());
        let once = root.clone();
        assert_eq!(normalize(&mut root, SelectorCatalog::builtin()), 0);
        assert_eq!(root, once);
        assert_eq!(root.node_at(&[2, 0]).and_then(|c| c.attr(LANGUAGE_ATTR)), Some("sh"));
    }
}
