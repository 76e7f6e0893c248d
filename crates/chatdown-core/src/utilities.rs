//! Utility functions and constants for HTML processing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::Node;

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frameset", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "html", "isindex", "li",
    "main", "menu", "nav", "noframes", "noscript", "ol", "output", "p", "pre",
    "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
    "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements that have meaning even when blank
pub const MEANINGFUL_WHEN_BLANK: &[&str] = &[
    "a", "table", "thead", "tbody", "tfoot", "th", "td", "iframe", "script",
    "audio", "video",
];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag is meaningful when blank
pub fn is_meaningful_when_blank(tag: &str) -> bool {
    MEANINGFUL_WHEN_BLANK.contains(&tag.to_lowercase().as_str())
}

/// An element with no text and nothing that renders without text
/// (images, rules, table cells) below it.
pub fn is_blank(node: &Node) -> bool {
    let tag = node.tag_name();
    !is_void(&tag)
        && !is_meaningful_when_blank(&tag)
        && node.text_content().trim().is_empty()
        && !has_void_or_meaningful_descendant(node)
}

fn has_void_or_meaningful_descendant(node: &Node) -> bool {
    node.element_children().any(|child| {
        let tag = child.tag_name();
        is_void(&tag) || is_meaningful_when_blank(&tag) || has_void_or_meaningful_descendant(child)
    })
}

/// Repeat a string n times
pub fn repeat(s: &str, n: usize) -> String {
    s.repeat(n)
}

static ESCAPES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\\", r"\\"),
        (r"\*", r"\*"),
        (r"^-", r"\-"),
        (r"^\+ ", r"\+ "),
        (r"^(=+)", r"\$1"),
        (r"^(#{1,6}) ", r"\$1 "),
        (r"`", r"\`"),
        (r"^~~~", r"\~~~"),
        (r"\[", r"\["),
        (r"\]", r"\]"),
        (r"^>", r"\>"),
        (r"_", r"\_"),
        (r"^(\d+)\. ", r"${1}\. "),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Escape text so it is not read back as Markdown syntax.
///
/// Anchored patterns only fire at the start of the text run, mirroring where
/// a block construct could begin.
pub fn escape_markdown(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

/// Clean an attribute value (trim and handle empty)
pub fn clean_attribute(value: Option<&str>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_default()
}

/// A fence of `fence_char` that is longer than any run of it inside `code`.
pub fn fence_for(code: &str, fence: &str) -> String {
    let fence_char = fence.chars().next().unwrap_or('`');
    let longest_run = code
        .split(|c| c != fence_char)
        .map(|run| run.chars().count())
        .max()
        .unwrap_or(0);

    let len = fence.chars().count().max(longest_run + 1);
    std::iter::repeat(fence_char).take(len).collect()
}
