//! Document data model shared by the gateways and the lifecycle handlers.

use serde_json::Value;
use time::OffsetDateTime;

/// Content types accepted by the upload handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    /// `application/json`, stored as `.json`.
    Json,
    /// `text/plain`, stored as `.txt`.
    PlainText,
    /// `application/pdf`, stored as `.pdf`.
    Pdf,
}

impl DocumentType {
    /// Every supported type, in the order reported to clients.
    pub const ALL: [DocumentType; 3] = [Self::Json, Self::PlainText, Self::Pdf];

    /// Resolve a declared MIME type. Image types are not accepted.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/json" => Some(Self::Json),
            "text/plain" => Some(Self::PlainText),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// MIME type string persisted in the `type` field.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain",
            Self::Pdf => "application/pdf",
        }
    }

    /// Extension used to build the content object key.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::PlainText => "txt",
            Self::Pdf => "pdf",
        }
    }

    /// Whether uploads of this type carry base64-encoded content.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Pdf)
    }

    /// Comma-separated list of supported MIME types for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.mime())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lifecycle state of a document. The only transition is `Pending -> Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Stored, awaiting analysis.
    Pending,
    /// Analysis attached.
    Processed,
}

impl DocumentStatus {
    /// Wire representation stored in the metadata table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
        }
    }

    /// Parse the stored representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "PROCESSED" => Some(Self::Processed),
            _ => None,
        }
    }
}

/// Semantic view of a metadata record.
///
/// Every field other than `id` is optional: a record missing an attribute in the table maps to
/// `None` here and to `null` in API responses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentRecord {
    /// Primary key, generated at upload.
    pub id: String,
    /// User-supplied display name.
    pub name: Option<String>,
    /// Declared MIME type.
    pub doc_type: Option<String>,
    /// Extension of the stored content object.
    pub file_extension: Option<String>,
    /// Lifecycle state.
    pub status: Option<DocumentStatus>,
    /// RFC3339 creation timestamp.
    pub created_at: Option<String>,
    /// RFC3339 timestamp of the transition to `PROCESSED`.
    pub processed_at: Option<String>,
    /// Structured analysis result, present once processed.
    pub analysis: Option<Value>,
}

impl DocumentRecord {
    /// Build the record written by the upload handler.
    pub fn pending(id: String, name: String, doc_type: DocumentType) -> Self {
        Self {
            id,
            name: Some(name),
            doc_type: Some(doc_type.mime().to_string()),
            file_extension: Some(doc_type.extension().to_string()),
            status: Some(DocumentStatus::Pending),
            created_at: Some(current_timestamp_rfc3339()),
            processed_at: None,
            analysis: None,
        }
    }
}

/// Partial update applied when a document finishes processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedUpdate {
    /// Analysis result to attach.
    pub analysis: Value,
    /// RFC3339 completion timestamp.
    pub processed_at: String,
}

impl ProcessedUpdate {
    /// Build an update stamped with the current time.
    pub fn now(analysis: Value) -> Self {
        Self {
            analysis,
            processed_at: current_timestamp_rfc3339(),
        }
    }
}

/// Current UTC time formatted as RFC3339.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
