//! Analysis provider for plain HTTP inference endpoints.

use super::{AnalysisClient, AnalysisError, build_invocation, parse_response};
use crate::extraction::ExtractedContent;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Analysis provider posting the invocation body to `{base_url}/model/{model_id}/invoke`.
pub struct HttpAnalysisClient {
    http: Client,
    base_url: String,
    model_id: String,
}

impl HttpAnalysisClient {
    /// Build a client for the given endpoint and model.
    pub fn new(base_url: String, model_id: String) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .user_agent("docflow/analysis")
            .build()
            .map_err(|err| AnalysisError::Request(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            model_id,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/model/{}/invoke",
            self.base_url.trim_end_matches('/'),
            self.model_id
        )
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, content: &ExtractedContent) -> Result<Value, AnalysisError> {
        let payload = build_invocation(content);
        tracing::debug!(endpoint = %self.endpoint(), "Calling HTTP analysis endpoint");

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                AnalysisError::Request(format!(
                    "failed to reach analysis endpoint at {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| AnalysisError::Request(error.to_string()))?;

        if !status.is_success() {
            return Err(AnalysisError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        parse_response(&body)
    }
}
