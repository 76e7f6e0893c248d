//! JSON messages exchanged with whatever triggers an export.
//!
//! A request is `{"type": "EXPORT_TO_MARKDOWN"}`. The response carries
//! either `markdown` (and `title` when known) or a human-readable `error`.

use serde::{Deserialize, Serialize};

use crate::export::Export;
use crate::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExportRequest {
    #[serde(rename = "EXPORT_TO_MARKDOWN")]
    ExportToMarkdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportResponse {
    Success {
        markdown: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl ExportResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportResponse::Success { .. })
    }
}

impl From<Result<Export, ExportError>> for ExportResponse {
    fn from(result: Result<Export, ExportError>) -> Self {
        match result {
            Ok(Export { markdown, title }) => ExportResponse::Success { markdown, title },
            Err(err) => ExportResponse::Failure {
                error: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exporter;
    use chatdown_core::Node;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request: ExportRequest = serde_json::from_str(r#"{"type":"EXPORT_TO_MARKDOWN"}"#).unwrap();
        assert_eq!(request, ExportRequest::ExportToMarkdown);
        assert!(serde_json::from_str::<ExportRequest>(r#"{"type":"SOMETHING_ELSE"}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let ok = ExportResponse::Success {
            markdown: "# T".into(),
            title: Some("T".into()),
        };
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"markdown": "# T", "title": "T"}));

        let untitled = ExportResponse::Success {
            markdown: "x".into(),
            title: None,
        };
        assert_eq!(serde_json::to_value(&untitled).unwrap(), json!({"markdown": "x"}));

        let failure: ExportResponse = serde_json::from_value(json!({"error": "boom"})).unwrap();
        assert!(!failure.is_success());
    }

    #[test]
    fn test_handle_reports_errors_as_text() {
        let response = Exporter::new().handle(
            &ExportRequest::ExportToMarkdown,
            &Node::element("body"),
            Some("Title"),
        );
        assert_eq!(
            response,
            ExportResponse::Failure {
                error: "No Google AI conversation found on this page.".into()
            }
        );
    }
}
