//! Type-specific content extraction.
//!
//! [`extract`] is the single entry point: it turns raw object bytes into either plain text or a
//! parsed JSON value, dispatching on the object extension. Adding a format means adding a
//! [`ContentFormat`] variant and its arm here; callers stay unchanged.

use serde_json::Value;
use thiserror::Error;

/// Errors produced while extracting document content.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No extractor exists for the extension.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    /// Text-based content was not valid UTF-8.
    #[error("Content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// JSON content failed to parse.
    #[error("Failed to parse JSON content: {0}")]
    Json(#[from] serde_json::Error),
    /// PDF text extraction failed.
    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),
}

/// Formats the engine can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    /// `.txt`: UTF-8 passthrough.
    Text,
    /// `.json`: parsed structured value.
    Json,
    /// `.pdf`: extracted text, layout and images discarded.
    Pdf,
}

impl ContentFormat {
    /// Resolve a format from an extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Normalized content handed to the analysis step.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// Plain text.
    Text(String),
    /// Structured JSON.
    Structured(Value),
}

impl ExtractedContent {
    /// Render the content for embedding in a prompt. Structured values are pretty-printed.
    pub fn to_prompt_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Size of the rendered content in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Structured(value) => value.to_string().len(),
        }
    }

    /// Whether the rendered content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract content from `bytes` according to `extension`.
///
/// PDF extraction is CPU-bound; async callers should run this on a blocking thread.
pub fn extract(bytes: Vec<u8>, extension: &str) -> Result<ExtractedContent, ExtractionError> {
    let format = ContentFormat::from_extension(extension)
        .ok_or_else(|| ExtractionError::UnsupportedType(extension.to_string()))?;

    match format {
        ContentFormat::Text => Ok(ExtractedContent::Text(String::from_utf8(bytes)?)),
        ContentFormat::Json => {
            let text = String::from_utf8(bytes)?;
            Ok(ExtractedContent::Structured(serde_json::from_str(&text)?))
        }
        ContentFormat::Pdf => pdf_extract::extract_text_from_mem(&bytes)
            .map(ExtractedContent::Text)
            .map_err(|err| ExtractionError::Pdf(err.to_string())),
    }
}
