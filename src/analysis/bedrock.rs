//! Bedrock runtime analysis provider.

use super::{AnalysisClient, AnalysisError, build_invocation, parse_response};
use crate::extraction::ExtractedContent;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use serde_json::Value;

/// Analysis provider invoking a Bedrock model.
#[derive(Clone)]
pub struct BedrockAnalysisClient {
    client: Client,
    model_id: String,
}

impl BedrockAnalysisClient {
    /// Build a client from shared AWS configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig, model_id: String) -> Self {
        tracing::debug!(model_id = %model_id, "Initialized Bedrock runtime client");
        Self {
            client: Client::new(sdk_config),
            model_id,
        }
    }
}

#[async_trait]
impl AnalysisClient for BedrockAnalysisClient {
    async fn analyze(&self, content: &ExtractedContent) -> Result<Value, AnalysisError> {
        let body = serde_json::to_vec(&build_invocation(content))?;
        tracing::debug!(model_id = %self.model_id, prompt_bytes = body.len(), "Calling Bedrock for analysis");

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|err| AnalysisError::Request(DisplayErrorContext(err).to_string()))?;

        parse_response(output.body().as_ref())
    }
}
