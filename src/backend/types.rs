//! Wire types and errors shared by the backend client and the panel.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors returned while talking to the AI microservices backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before a usable response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Backend responded with a non-success status code.
    #[error("Unexpected backend response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response body was not the JSON shape the endpoint promises.
    #[error("Malformed backend response: {0}")]
    InvalidResponse(String),
}

/// A document chosen for upload: raw bytes plus the name sent in the multipart part.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    /// File name as presented to the backend.
    pub file_name: String,
    /// Opaque file contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Document kinds the backend knows how to index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format; the backend extracts page text.
    Pdf,
    /// Plain UTF-8 text.
    Text,
}

impl DocumentKind {
    /// Classify a file name by extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".txt") {
            Some(Self::Text)
        } else {
            None
        }
    }

    /// MIME type attached to the multipart part.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Text => "text/plain",
        }
    }
}

/// Successful `POST /docs/upload` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    /// Name the backend stored the document under.
    #[serde(default)]
    pub file: Option<String>,
    /// Number of chunks written to the vector store.
    pub chunks_indexed: u64,
}

/// Body for `POST /qa/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaRequest {
    /// Free-form question text.
    pub question: String,
    /// Number of chunks to retrieve as context.
    pub top_k: u32,
}

/// Answer record returned by `POST /qa/` and held by the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    /// Generated answer text.
    pub answer: String,
    /// Source descriptors, kept opaque and rendered verbatim.
    #[serde(default)]
    pub sources: Vec<Value>,
}

/// Body for `POST /summarize/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarizeRequest {
    /// Text to condense.
    pub text: String,
}

#[derive(Deserialize)]
pub(crate) struct SummarizeResponse {
    pub(crate) summary: String,
}

/// Experience level accepted by the learning-path endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningLevel {
    /// No prior exposure to the topic.
    #[default]
    Beginner,
    /// Comfortable with the fundamentals.
    Intermediate,
    /// Looking for depth and edge cases.
    Advanced,
}

impl fmt::Display for LearningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        })
    }
}

impl FromStr for LearningLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!(
                "unknown level '{other}' (expected beginner, intermediate, or advanced)"
            )),
        }
    }
}

/// Body for `POST /learning-path/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningPathRequest {
    /// Subject the learner wants to study.
    pub topic: String,
    /// Starting level of the learner.
    pub level: LearningLevel,
}

#[derive(Deserialize)]
pub(crate) struct LearningPathResponse {
    pub(crate) path: Vec<String>,
}

/// Payload returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// Short status keyword, `ok` when the services are up.
    pub status: String,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_supported_extensions() {
        assert_eq!(DocumentKind::from_file_name("report.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_name("notes.txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_file_name("slides.pptx"), None);
        assert_eq!(DocumentKind::from_file_name("pdf"), None);
    }

    #[test]
    fn qa_answer_defaults_missing_sources() {
        let answer: QaAnswer =
            serde_json::from_value(json!({ "answer": "No documents indexed." })).expect("answer");
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn upload_receipt_requires_chunk_count() {
        let missing = serde_json::from_value::<UploadReceipt>(json!({ "detail": "nope" }));
        assert!(missing.is_err());

        let receipt: UploadReceipt =
            serde_json::from_value(json!({ "file": "a.txt", "chunks_indexed": 3 }))
                .expect("receipt");
        assert_eq!(receipt.chunks_indexed, 3);
        assert_eq!(receipt.file.as_deref(), Some("a.txt"));
    }

    #[test]
    fn learning_level_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<LearningLevel>(), Ok(LearningLevel::Advanced));
        assert!("expert".parse::<LearningLevel>().is_err());
        assert_eq!(
            serde_json::to_value(LearningLevel::Intermediate).expect("json"),
            json!("intermediate")
        );
    }

    #[test]
    fn debug_output_omits_file_contents() {
        let document = DocumentFile {
            file_name: "secret.txt".into(),
            bytes: b"classified".to_vec(),
        };
        let rendered = format!("{document:?}");
        assert!(rendered.contains("secret.txt"));
        assert!(!rendered.contains("classified"));
    }
}
