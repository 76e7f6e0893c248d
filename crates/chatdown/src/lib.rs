//! # chatdown
//!
//! Export Google AI Mode conversations to Markdown.
//!
//! The input is a DOM snapshot of the conversation page, either a CDP node
//! tree or (with the `html` feature) an HTML string. Each turn is located,
//! cleaned of page chrome on a private copy, converted with a few
//! page-specific rules on top of CommonMark, and tidied. Turns are joined
//! with horizontal rules under an optional `# title`.
//!
//! Everything the exporter knows about the page's markup lives in a
//! [`SelectorCatalog`], loaded from TOML, so markup drift is a data fix.
//!
//! ```rust
//! use chatdown::{parse_document, suggested_filename, Exporter};
//!
//! let page = parse_document(
//!     r#"<div data-scope-id="turn">
//!          <span class="VndcI veK2kb">Why Rust?</span>
//!          <div data-container-id="main-col"><p>Memory safety.</p></div>
//!        </div>"#,
//! );
//! let export = Exporter::new().export(&page, Some("Rust")).unwrap();
//! assert_eq!(
//!     export.markdown,
//!     "# Rust\n\n### User\n\nWhy Rust?\n\n### Assistant\n\nMemory safety."
//! );
//! assert_eq!(suggested_filename(export.title.as_deref()), "Rust.md");
//! ```

pub mod catalog;
mod codeblock;
mod export;
mod filename;
mod message;
mod overrides;
mod postprocess;
mod sanitize;
pub mod selector;
mod turn;

pub use catalog::{CatalogError, SelectorCatalog};
pub use codeblock::{code_block, normalize};
pub use export::{document_title, Export, Exporter, TURN_SEPARATOR};
pub use filename::{suggested_filename, FALLBACK_BASE, MAX_BASE_LEN};
pub use message::{ExportRequest, ExportResponse};
pub use overrides::{install as install_overrides, markdown_service};
pub use postprocess::{collapse_blank_lines, finalize, strip_ui_artifacts};
pub use sanitize::clean;
pub use selector::{Selector, SelectorError};
pub use turn::{compose_turn, turn_to_markdown, user_query};

#[cfg(feature = "html")]
pub use chatdown_core::{parse_document, parse_html};
pub use chatdown_core::{ConvertError, MarkdownService, Node, NodeType};

/// Why an export produced no Markdown. The messages are shown to users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("No Google AI conversation found on this page.")]
    NoConversationFound,
    #[error("Conversation content is empty or could not be converted.")]
    EmptyConversation,
    #[error("{0}")]
    ConversionFailure(String),
}

impl From<ConvertError> for ExportError {
    fn from(err: ConvertError) -> Self {
        ExportError::ConversionFailure(err.to_string())
    }
}
