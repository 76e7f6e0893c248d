//! # chatdown-core
//!
//! Convert DOM nodes to Markdown.
//!
//! A Rust take on [turndown](https://github.com/mixmark-io/turndown): a DOM
//! tree is walked once, every element is matched against an ordered list of
//! rules, and each rule turns the element plus its already-converted content
//! into Markdown. Rules added with [`MarkdownService::add_rule`] are checked
//! before the built-in CommonMark rules, which is how site-specific markup
//! gets special treatment.
//!
//! ## Design
//!
//! The input is a CDP-style DOM [`Node`] tree. This allows:
//!
//! - **Zero parsing overhead**: When DOM is already available (e.g., from CDP/chromiumoxide)
//! - **Parser agnostic**: Any HTML parser can convert to the Node structure
//! - **Editable copies**: Trees are plain owned values, so a caller can clone
//!   and prune one before conversion without touching the input
//!
//! ## Example
//!
//! ```rust
//! use chatdown_core::{MarkdownService, Node};
//!
//! let service = MarkdownService::new();
//!
//! let mut h1 = Node::element("h1");
//! h1.add_child(Node::text("Hello World"));
//!
//! let markdown = service.convert(&h1).unwrap();
//! assert!(markdown.contains("Hello World"));
//! ```

#[cfg(feature = "html")]
pub mod html;
pub mod node;
mod rules;
mod service;
mod utilities;
mod whitespace;

#[cfg(feature = "html")]
pub use html::{parse_document, parse_html};
pub use node::{Node, NodePath, NodeRef, NodeType};
pub use rules::{Filter, Resolved, Rule, Rules};
pub use service::{CodeBlockStyle, HeadingStyle, MarkdownOptions, MarkdownService};
pub use utilities::{escape_markdown, fence_for, is_blank, is_block};
pub use whitespace::collapse_whitespace;

/// Error type for conversion
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("markup is nested more than {limit} elements deep")]
    DepthExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
