//! MarkdownService - the main entry point for Node to Markdown conversion.

use tracing::trace;

use crate::node::{Node, NodeRef, NodeType};
use crate::rules::{Filter, Resolved, Rule, Rules};
use crate::utilities::{escape_markdown, is_block};
use crate::whitespace::collapse_whitespace;
use crate::{ConvertError, Result};

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// Use setext-style headings (underlined with = or -)
    /// Only works for h1 and h2, falls back to ATX for h3-h6
    #[default]
    Setext,
    /// Use ATX-style headings (prefixed with #)
    Atx,
}

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Use indented code blocks (4 spaces)
    #[default]
    Indented,
    /// Use fenced code blocks (```)
    Fenced,
}

/// Options for MarkdownService
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Heading style (setext or atx)
    pub heading_style: HeadingStyle,

    /// Horizontal rule string
    pub hr: String,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Code block style
    pub code_block_style: CodeBlockStyle,

    /// Fence string for fenced code blocks
    pub fence: String,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Text emitted before the newline of a hard line break
    pub br: String,

    /// Deepest element nesting accepted before conversion fails
    pub max_depth: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Setext,
            hr: "* * *".to_string(),
            bullet_list_marker: '*',
            code_block_style: CodeBlockStyle::Indented,
            fence: "```".to_string(),
            em_delimiter: '_',
            strong_delimiter: "**".to_string(),
            br: "  ".to_string(),
            max_depth: 512,
        }
    }
}

/// The main service for converting DOM nodes to Markdown
pub struct MarkdownService {
    options: MarkdownOptions,
    rules: Rules,
}

impl MarkdownService {
    /// Create a new MarkdownService with default options
    pub fn new() -> Self {
        Self::with_options(MarkdownOptions::default())
    }

    /// Create a MarkdownService with custom options
    pub fn with_options(options: MarkdownOptions) -> Self {
        Self {
            options,
            rules: Rules::new(),
        }
    }

    /// Convert a DOM Node tree to Markdown.
    ///
    /// The node itself is converted, not just its children. The input is not
    /// modified; whitespace collapsing runs on a private copy.
    pub fn convert(&self, node: &Node) -> Result<String> {
        self.check_depth(node)?;
        let mut root = node.clone();
        collapse_whitespace(&mut root);

        let root_ref = NodeRef::new(&root);
        let output = match root.node_type {
            NodeType::Element => self.process_element(&root_ref, 0)?,
            NodeType::Text => escape_markdown(root.node_value.as_deref().unwrap_or("")),
            _ => self.process_children(&root_ref, 0)?,
        };

        Ok(self.post_process(&output))
    }

    /// Fail with [`ConvertError::DepthExceeded`] if `node` nests deeper than
    /// `max_depth`. Callers that walk a tree recursively before converting
    /// it should check first.
    pub fn check_depth(&self, node: &Node) -> Result<()> {
        let limit = self.options.max_depth;
        if node.depth() > limit {
            return Err(ConvertError::DepthExceeded { limit });
        }
        Ok(())
    }

    /// Parse an HTML fragment and convert it to Markdown
    #[cfg(feature = "html")]
    pub fn convert_html(&self, html: &str) -> Result<String> {
        self.convert(&crate::html::parse_html(html))
    }

    /// Add a custom rule. Custom rules are checked before the CommonMark
    /// rules, in the order they were added.
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Remove elements matching the filter
    pub fn remove(&mut self, filter: Filter) -> &mut Self {
        self.rules.remove(filter);
        self
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    /// Escape markdown special characters in a string
    pub fn escape(&self, text: &str) -> String {
        escape_markdown(text)
    }

    /// Get the current options
    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut MarkdownOptions {
        &mut self.options
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Process children of a node, joining block output with at most one
    /// blank line between pieces
    fn process_children(&self, parent: &NodeRef, depth: usize) -> Result<String> {
        let mut output = String::new();

        for (i, child) in parent.children().enumerate() {
            let child_ref = parent.child(child, i);
            let replacement = match child.node_type {
                NodeType::Text => self.process_text(&child_ref),
                NodeType::Element => self.process_element(&child_ref, depth + 1)?,
                NodeType::Document | NodeType::DocumentFragment => {
                    self.process_children(&child_ref, depth + 1)?
                }
                NodeType::Comment => continue,
            };
            join(&mut output, &replacement);
        }

        Ok(output)
    }

    /// Text inside `code`/`pre` is literal, everything else is escaped
    fn process_text(&self, node: &NodeRef) -> String {
        let text = node.node.node_value.as_deref().unwrap_or("");
        let literal = node
            .ancestors()
            .any(|a| a.is_tag("code") || a.is_tag("pre"));
        if literal {
            text.to_string()
        } else {
            escape_markdown(text)
        }
    }

    /// Process a single element
    fn process_element(&self, node: &NodeRef, depth: usize) -> Result<String> {
        if depth > self.options.max_depth {
            return Err(ConvertError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        let tag = node.tag_name();
        let block = is_block(&tag);

        let rule = match self.rules.for_node(node, &self.options) {
            Resolved::Blank => return Ok(if block { "\n\n".to_string() } else { String::new() }),
            Resolved::Remove => {
                trace!(tag = %tag, "removed element");
                return Ok(String::new());
            }
            Resolved::Rule(rule) => Some(rule),
            Resolved::Default => None,
        };

        let content = self.process_children(node, depth)?;

        // Whitespace at the edges of inline elements belongs outside the markup
        let (leading, trailing) = if block {
            ("", "")
        } else {
            flanking_whitespace(&content)
        };
        let content = if leading.is_empty() && trailing.is_empty() {
            content.as_str()
        } else {
            content.trim()
        };

        let replacement = match rule {
            Some(rule) => rule.replace(node, content, &self.options),
            None if block => format!("\n\n{}\n\n", content),
            None => content.to_string(),
        };

        Ok(format!("{}{}{}", leading, replacement, trailing))
    }

    /// Post-process the result
    fn post_process(&self, output: &str) -> String {
        output
            .trim_start_matches(['\t', '\r', '\n'])
            .trim_end()
            .to_string()
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `replacement`, merging the newlines at the seam into a separator
/// of at most two.
fn join(output: &mut String, replacement: &str) {
    let kept = output.trim_end_matches('\n').len();
    let trailing = output.len() - kept;
    let body = replacement.trim_start_matches('\n');
    let leading = replacement.len() - body.len();

    output.truncate(kept);
    output.push_str(&"\n".repeat(trailing.max(leading).min(2)));
    output.push_str(body);
}

fn flanking_whitespace(content: &str) -> (&str, &str) {
    let start = content.len() - content.trim_start().len();
    let end = content.trim_end().len();
    if content.trim().is_empty() {
        return ("", "");
    }
    (&content[..start], &content[end..])
}
