//! Request, outcome, and error types for the document lifecycle handlers.

use crate::{
    analysis::AnalysisError, document::DocumentRecord, document::DocumentType,
    extraction::ExtractionError, metadata::MetadataError, storage::StorageError,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Input rejected before any store is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Path did not carry a document id.
    #[error("Document ID is required")]
    MissingId,
    /// Request body was not a JSON object of the expected shape.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    /// A required field was absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// Declared type is not one of the supported MIME types.
    #[error("Unsupported document type. Supported types are: {supported}")]
    UnsupportedType {
        /// The type the client declared, if any.
        declared: Option<String>,
        /// Comma-separated supported MIME types.
        supported: String,
    },
    /// Content has the wrong shape for the declared type.
    #[error("{0}")]
    InvalidContent(String),
    /// Binary content was not valid base64.
    #[error("Invalid base64 content for {0}. Please ensure your file is properly base64 encoded.")]
    InvalidEncoding(&'static str),
}

/// Failure classes the HTTP layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; maps to 400.
    Validation,
    /// Metadata record absent; maps to 404.
    NotFound,
    /// Store, extraction, analysis, or unexpected failure; maps to 500.
    Internal,
}

/// Errors emitted by the lifecycle handlers.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No metadata record exists for the id.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// Triggering event could not be handled.
    #[error("Invalid storage event: {0}")]
    InvalidEvent(String),
    /// Content store request failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Metadata store request failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// Content extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Analysis provider failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Unexpected runtime failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocumentError {
    /// Classify the error for response mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidEvent(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_)
            | Self::Metadata(_)
            | Self::Extraction(_)
            | Self::Analysis(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Body of an upload request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadRequest {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Declared MIME type.
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    /// Raw text, a JSON value, or base64 for binary types.
    #[serde(default)]
    pub content: Option<Value>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Generated document id.
    pub document_id: String,
    /// Accepted document type.
    pub doc_type: DocumentType,
}

/// Metadata merged with stored content, as returned by Get.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentView {
    /// Metadata record.
    pub record: DocumentRecord,
    /// Rendered content: parsed JSON, text, or base64 for binary objects.
    pub content: Value,
}

/// One page of the document listing.
#[derive(Debug, Clone, Default)]
pub struct ListOutcome {
    /// Records in this page.
    pub documents: Vec<DocumentRecord>,
    /// Id to resume after when more records may exist.
    pub last_evaluated_key: Option<String>,
}

/// Result of a successful processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    /// Id derived from the object key.
    pub document_id: String,
    /// Analysis attached to the record.
    pub analysis: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            DocumentError::from(ValidationError::MissingId).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            DocumentError::NotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DocumentError::from(StorageError::NotFound("x.json".into())).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            DocumentError::from(MetadataError::Backend("down".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn unsupported_type_message_lists_supported_types() {
        let error = ValidationError::UnsupportedType {
            declared: Some("application/xml".into()),
            supported: DocumentType::supported_list(),
        };
        assert_eq!(
            error.to_string(),
            "Unsupported document type. Supported types are: application/json, text/plain, application/pdf"
        );
    }
}
