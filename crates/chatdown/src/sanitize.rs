//! Strip interactive and hidden page chrome from a copy of a turn.

use chatdown_core::Node;
use tracing::trace;

use crate::catalog::SelectorCatalog;
use crate::selector::{outermost, select_paths};

/// Return a cleaned deep copy of `root`, or `None` for no input.
///
/// Descendants matching a noise selector are removed with their subtrees,
/// then structural wrappers are replaced by their children. The root
/// itself is never removed and the input is never modified.
pub fn clean(root: Option<&Node>, catalog: &SelectorCatalog) -> Option<Node> {
    let mut copy = root?.clone();

    let noise = outermost(select_paths(&copy, &catalog.noise));
    for path in noise.iter().rev() {
        copy.remove_at(path);
    }

    // Reverse document order keeps the remaining paths valid: splicing a
    // wrapper's children only shifts nodes that come after it.
    let wrappers = select_paths(&copy, &catalog.structural_wrappers);
    for path in wrappers.iter().rev() {
        copy.unwrap_at(path);
    }

    trace!(removed = noise.len(), unwrapped = wrappers.len(), "sanitized subtree");
    Some(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::select_first;

    fn el(tag: &str, attrs: Vec<(&str, &str)>) -> Node {
        Node::element_with_attrs(tag, attrs)
    }

    fn catalog() -> &'static SelectorCatalog {
        SelectorCatalog::builtin()
    }

    #[test]
    fn test_none_in_none_out() {
        assert!(clean(None, catalog()).is_none());
    }

    #[test]
    fn test_removes_noise() {
        let root = el("div", vec![])
            .with_child(el("p", vec![]).with_child(Node::text("Real content")))
            .with_child(el("button", vec![]).with_child(Node::text("Copy")))
            .with_child(el("div", vec![("class", "VlQBpc")]).with_child(Node::text("Good response")))
            .with_child(el("span", vec![("style", "color: red; display: none")]).with_child(Node::text("hidden")))
            .with_child(el("div", vec![("aria-label", "Expand all")]))
            .with_child(el("svg", vec![]).with_child(el("path", vec![])));

        let cleaned = clean(Some(&root), catalog()).unwrap();
        assert_eq!(cleaned.text_content(), "Real content");
        assert_eq!(cleaned.child_count(), 1);
    }

    #[test]
    fn test_no_noise_survives() {
        let root = el("div", vec![]).with_child(
            el("div", vec![("class", "rBl3me")])
                .with_child(el("img", vec![("src", "x.png")]))
                .with_child(el("button", vec![])),
        );
        let cleaned = clean(Some(&root), catalog()).unwrap();
        for selector in &catalog().noise {
            assert!(select_first(&cleaned, selector).is_none(), "{selector} survived");
        }
    }

    #[test]
    fn test_unwraps_structural_wrappers() {
        let root = el("p", vec![])
            .with_child(Node::text("See "))
            .with_child(
                el("span", vec![("class", "T286Pc")])
                    .with_child(Node::text("the "))
                    .with_child(el("span", vec![("class", "T286Pc")]).with_child(Node::text("docs"))),
            )
            .with_child(Node::text("."));

        let cleaned = clean(Some(&root), catalog()).unwrap();
        assert_eq!(cleaned.text_content(), "See the docs.");
        assert!(cleaned.children().all(Node::is_text));
        assert_eq!(cleaned.child_count(), 4);
    }

    #[test]
    fn test_input_untouched() {
        let root = el("div", vec![]).with_child(el("button", vec![]).with_child(Node::text("x")));
        let before = root.clone();
        let _ = clean(Some(&root), catalog());
        assert_eq!(root, before);
    }
}
