//! Convert one conversation turn: the user's question plus the answer.

use chatdown_core::{ConvertError, MarkdownService, Node};
use tracing::trace;

use crate::catalog::SelectorCatalog;
use crate::codeblock::normalize;
use crate::postprocess::finalize;
use crate::sanitize::clean;
use crate::selector::{select_first, select_first_of};

/// Trimmed text of the user query in `turn`. The catalog's selector groups
/// are tried in order; within a group the earliest match in document order
/// wins. Empty when nothing matches.
pub fn user_query(turn: &Node, catalog: &SelectorCatalog) -> String {
    catalog
        .user_query
        .iter()
        .find_map(|group| select_first_of(turn, group))
        .map(|query| query.text_content().trim().to_string())
        .unwrap_or_default()
}

/// `### User` (when there is a query) and `### Assistant` sections for a
/// turn; empty when both parts are empty.
pub fn compose_turn(query: &str, body: &str) -> String {
    let (query, body) = (query.trim(), body.trim());
    if query.is_empty() && body.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    if !query.is_empty() {
        out.push_str("### User\n\n");
        out.push_str(query);
        out.push_str("\n\n");
    }
    out.push_str("### Assistant\n\n");
    out.push_str(body);
    out.trim_end().to_string()
}

/// Markdown for a single turn.
///
/// The query is read from the untouched turn, the answer from a cleaned
/// copy: noise removed, code widgets normalized, converted from the main
/// content region if there is one.
pub fn turn_to_markdown(
    turn: &Node,
    catalog: &SelectorCatalog,
    service: &MarkdownService,
) -> Result<String, ConvertError> {
    // Every later pass walks the tree, some of them recursively
    service.check_depth(turn)?;

    let Some(mut cleaned) = clean(Some(turn), catalog) else {
        return Ok(String::new());
    };
    let code_blocks = normalize(&mut cleaned, catalog);

    let query = user_query(turn, catalog);
    let main = select_first(&cleaned, &catalog.main_content).unwrap_or(&cleaned);
    let body = finalize(&service.convert(main)?, &catalog.ui_artifact_lines);

    trace!(
        code_blocks,
        query_len = query.len(),
        body_len = body.len(),
        "converted turn"
    );
    Ok(compose_turn(&query, &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::markdown_service;

    fn el(tag: &str, attrs: Vec<(&str, &str)>) -> Node {
        Node::element_with_attrs(tag, attrs)
    }

    fn convert(turn: &Node) -> String {
        let catalog = SelectorCatalog::builtin();
        turn_to_markdown(turn, catalog, &markdown_service(catalog)).unwrap()
    }

    #[test]
    fn test_user_query_primary_selector() {
        let turn = el("div", vec![]).with_child(
            el("span", vec![("class", "VndcI veK2kb")]).with_child(Node::text("  How do I parse JSON?  ")),
        );
        assert_eq!(user_query(&turn, SelectorCatalog::builtin()), "How do I parse JSON?");
    }

    #[test]
    fn test_user_query_takes_earliest_match_within_group() {
        let turn = el("div", vec![])
            .with_child(el("div", vec![("aria-level", "2")]).with_child(Node::text("Earlier heading")))
            .with_child(el("span", vec![("class", "VndcI veK2kb")]).with_child(Node::text("Later query")));
        assert_eq!(user_query(&turn, SelectorCatalog::builtin()), "Earlier heading");
    }

    #[test]
    fn test_user_query_falls_back_to_next_group() {
        let turn = el("div", vec![]).with_child(
            el("div", vec![("class", "ilZyRc")]).with_child(
                el("div", vec![("class", "sUKAcb")])
                    .with_child(el("span", vec![]).with_child(Node::text("Plain span query"))),
            ),
        );
        assert_eq!(user_query(&turn, SelectorCatalog::builtin()), "Plain span query");
    }

    #[test]
    fn test_user_query_missing() {
        let turn = el("div", vec![]).with_child(el("p", vec![]).with_child(Node::text("answer")));
        assert_eq!(user_query(&turn, SelectorCatalog::builtin()), "");
    }

    #[test]
    fn test_compose_turn() {
        assert_eq!(compose_turn("", "  "), "");
        assert_eq!(compose_turn("", "Answer"), "### Assistant\n\nAnswer");
        assert_eq!(
            compose_turn(" Q ", "Answer\n"),
            "### User\n\nQ\n\n### Assistant\n\nAnswer"
        );
        assert_eq!(compose_turn("Q", ""), "### User\n\nQ\n\n### Assistant");
    }

    #[test]
    fn test_turn_with_query_and_answer() {
        let turn = el("div", vec![("data-scope-id", "turn")])
            .with_child(el("span", vec![("class", "VndcI veK2kb")]).with_child(Node::text("What is Rust?")))
            .with_child(
                el("div", vec![("data-container-id", "main-col")])
                    .with_child(el("p", vec![]).with_child(Node::text("A systems language.")))
                    .with_child(el("button", vec![]).with_child(Node::text("Copy")))
                    .with_child(el("div", vec![("class", "VlQBpc")]).with_child(Node::text("Good response"))),
            );
        assert_eq!(
            convert(&turn),
            "### User\n\nWhat is Rust?\n\n### Assistant\n\nA systems language."
        );
    }

    #[test]
    fn test_query_read_from_untouched_turn() {
        // The query sits inside a hidden element; sanitizing would remove it
        let turn = el("div", vec![])
            .with_child(
                el("div", vec![("style", "display:none")]).with_child(
                    el("span", vec![("class", "VndcI veK2kb")]).with_child(Node::text("Hidden question")),
                ),
            )
            .with_child(el("p", vec![]).with_child(Node::text("Answer")));
        assert_eq!(
            convert(&turn),
            "### User\n\nHidden question\n\n### Assistant\n\nAnswer"
        );
    }

    #[test]
    fn test_turn_with_code_widget() {
        let widget = el("div", vec![("class", "r1PmQe")])
            .with_child(
                el("div", vec![("class", "z0e9Qd")])
                    .with_child(el("span", vec![("class", "vVRw1d")]).with_child(Node::text("python"))),
            )
            .with_child(
                el("div", vec![("class", "pCTyYe")]).with_child(
                    el("pre", vec![]).with_child(el("code", vec![]).with_child(Node::text("print(\"hi\")"))),
                ),
            )
            .with_child(el("div", vec![("class", "P8PNlb")]).with_child(Node::text("Use code with caution.")));
        let turn = el("div", vec![]).with_child(widget);
        let md = convert(&turn);
        assert!(md.contains("```python\nprint(\"hi\")\n```"), "{md}");
        assert!(!md.contains("Use code with caution."));
    }

    #[test]
    fn test_artifact_text_stripped_even_without_marker_class() {
        let turn = el("div", vec![])
            .with_child(el("p", vec![]).with_child(Node::text("Answer")))
            .with_child(el("p", vec![]).with_child(Node::text("Bad response")));
        assert_eq!(convert(&turn), "### Assistant\n\nAnswer");
    }

    #[test]
    fn test_query_and_bold_body() {
        let body = el("p", vec![])
            .with_child(Node::text("Some "))
            .with_child(el("b", vec![]).with_child(Node::text("bold")))
            .with_child(Node::text(" text."));
        let turn = el("div", vec![])
            .with_child(el("span", vec![("class", "VndcI veK2kb")]).with_child(Node::text("the query")))
            .with_child(el("div", vec![("data-container-id", "main-col")]).with_child(body));
        let md = convert(&turn);
        assert!(md.starts_with("### User\n\nthe query\n\n### Assistant\n\n"), "{md}");
        assert!(md.contains("Some **bold** text."), "{md}");
    }

    #[test]
    fn test_code_text_kept_verbatim() {
        let widget = el("div", vec![("class", "r1PmQe")])
            .with_child(el("div", vec![("class", "z0e9Qd")]).with_child(Node::text("mermaid")))
            .with_child(
                el("div", vec![("class", "pCTyYe")]).with_child(
                    el("pre", vec![])
                        .with_child(el("code", vec![]).with_child(Node::text("graph LR\n  A --> B"))),
                ),
            );
        let md = convert(&el("div", vec![]).with_child(widget));
        assert!(md.contains("```mermaid\ngraph LR\n  A --> B\n```"), "{md}");
    }

    #[test]
    fn test_deep_turn_fails_cleanly() {
        let mut turn = el("p", vec![]).with_child(Node::text("deep"));
        for _ in 0..3_000 {
            turn = el("div", vec![]).with_child(turn);
        }
        let catalog = SelectorCatalog::builtin();
        let err = turn_to_markdown(&turn, catalog, &markdown_service(catalog)).unwrap_err();
        assert!(matches!(err, ConvertError::DepthExceeded { limit: 512 }), "{err:?}");
    }

    #[test]
    fn test_empty_turn() {
        let turn = el("div", vec![]).with_child(el("button", vec![]).with_child(Node::text("Retry")));
        assert_eq!(convert(&turn), "");
    }
}
