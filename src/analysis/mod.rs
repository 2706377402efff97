//! Model-backed analysis of extracted document content.
//!
//! Every provider sends one prompt built by [`build_invocation`] with fixed sampling
//! parameters and parses the raw response body as JSON. There is no retry, streaming, or
//! truncation of oversized input; documents larger than the model's input limit fail.

mod bedrock;
mod http;

pub use bedrock::BedrockAnalysisClient;
pub use http::HttpAnalysisClient;

use crate::extraction::ExtractedContent;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Upper bound on generated tokens.
pub const MAX_TOKENS_TO_SAMPLE: u32 = 1000;
/// Sampling temperature.
pub const TEMPERATURE: f32 = 0.7;

const INSTRUCTION: &str = "Analyze the following document and extract key information:";

/// Errors surfaced while invoking the analysis provider.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Provider could not be reached or rejected the call before responding.
    #[error("Analysis request failed: {0}")]
    Request(String),
    /// Provider responded with a failure status.
    #[error("Analysis provider returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status reported by the provider.
        status: u16,
        /// Response body accompanying the failure.
        body: String,
    },
    /// Provider response was not valid JSON.
    #[error("Malformed analysis response: {0}")]
    InvalidResponse(String),
    /// Invocation body could not be serialized.
    #[error("Failed to build analysis request: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Request body sent to the inference endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvocationBody {
    /// Prompt embedding the document content.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens_to_sample: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Interface implemented by analysis providers.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Analyze extracted content and return the provider's parsed response.
    async fn analyze(&self, content: &ExtractedContent) -> Result<Value, AnalysisError>;
}

/// Build the prompt for a document.
pub fn build_prompt(content: &ExtractedContent) -> String {
    format!(
        "\n\nHuman: {INSTRUCTION}\n\n{}\n\nAssistant:",
        content.to_prompt_text()
    )
}

/// Build the full invocation body for a document.
pub fn build_invocation(content: &ExtractedContent) -> InvocationBody {
    InvocationBody {
        prompt: build_prompt(content),
        max_tokens_to_sample: MAX_TOKENS_TO_SAMPLE,
        temperature: TEMPERATURE,
    }
}

/// Parse a provider response body.
pub(crate) fn parse_response(body: &[u8]) -> Result<Value, AnalysisError> {
    serde_json::from_slice(body).map_err(|err| AnalysisError::InvalidResponse(err.to_string()))
}
