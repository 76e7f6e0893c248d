//! Whole-conversation export.

use chatdown_core::{ConvertError, MarkdownService, Node};
use tracing::{debug, trace};

use crate::catalog::SelectorCatalog;
use crate::message::{ExportRequest, ExportResponse};
use crate::overrides::markdown_service;
use crate::selector::{select_all, select_first, Selector};
use crate::turn;
use crate::ExportError;

/// Separator placed between turns
pub const TURN_SEPARATOR: &str = "\n\n---\n\n";

/// A finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub markdown: String,
    /// The trimmed title, when a non-blank one was supplied
    pub title: Option<String>,
}

/// Turns a conversation page into Markdown.
///
/// Holds the selector catalog and a converter configured with the page
/// overrides. Built once and shared; exporting never mutates it.
pub struct Exporter {
    catalog: SelectorCatalog,
    service: MarkdownService,
}

impl Exporter {
    /// Exporter using the built-in catalog
    pub fn new() -> Self {
        Self::with_catalog(SelectorCatalog::builtin().clone())
    }

    pub fn with_catalog(catalog: SelectorCatalog) -> Self {
        let service = markdown_service(&catalog);
        Self { catalog, service }
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    /// The subtree turns are searched in: the conversation root when the
    /// page has one, otherwise the whole document.
    pub fn conversation_scope<'a>(&self, document: &'a Node) -> &'a Node {
        select_first(document, &self.catalog.conversation_scope).unwrap_or(document)
    }

    /// Turn containers in document order
    pub fn find_turns<'a>(&self, document: &'a Node) -> Vec<&'a Node> {
        select_all(self.conversation_scope(document), &self.catalog.turn)
    }

    /// Markdown for one turn; empty when it has neither query nor answer.
    pub fn turn_to_markdown(&self, turn: &Node) -> Result<String, ConvertError> {
        turn::turn_to_markdown(turn, &self.catalog, &self.service)
    }

    /// Export every turn of `document`, prefixed by `# {title}` when a
    /// non-blank title is given.
    pub fn export(&self, document: &Node, title: Option<&str>) -> Result<Export, ExportError> {
        let turns = self.find_turns(document);
        debug!(turns = turns.len(), "located conversation turns");
        if turns.is_empty() {
            return Err(ExportError::NoConversationFound);
        }

        let mut parts = Vec::with_capacity(turns.len());
        for (index, turn) in turns.into_iter().enumerate() {
            let markdown = self.turn_to_markdown(turn)?;
            let markdown = markdown.trim();
            if markdown.is_empty() {
                trace!(index, "skipping empty turn");
                continue;
            }
            parts.push(markdown.to_string());
        }
        if parts.is_empty() {
            return Err(ExportError::EmptyConversation);
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let body = parts.join(TURN_SEPARATOR);
        let markdown = match &title {
            Some(title) => format!("# {title}\n\n{body}"),
            None => body,
        };

        debug!(turns = parts.len(), bytes = markdown.len(), "exported conversation");
        Ok(Export { markdown, title })
    }

    /// Answer an export request; failures become an error response.
    pub fn handle(&self, request: &ExportRequest, document: &Node, title: Option<&str>) -> ExportResponse {
        match request {
            ExportRequest::ExportToMarkdown => self.export(document, title).into(),
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of the document's `<title>` element, if any.
pub fn document_title(document: &Node) -> Option<String> {
    let title = Selector::tag("title");
    let found = if document.is_tag("title") {
        Some(document)
    } else {
        select_first(document, &title)
    };
    found
        .map(|t| t.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
}
