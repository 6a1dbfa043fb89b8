use crate::constants::completion::EMPTY_RESPONSE;
use crate::error::PitbossError;
use crate::llm::traits::*;
use serde::Deserialize;
use std::time::Duration;

/// Talks to the completion proxy over plain JSON POST.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, PitbossError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: Option<String>,
}

#[async_trait::async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, PitbossError> {
        tracing::debug!(
            "POST {} with {} messages",
            self.endpoint,
            request.messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(PitbossError::status(status.as_u16(), response_text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| PitbossError::Completion(format!("Failed to parse response: {e}")))?;

        Ok(parsed
            .content
            .unwrap_or_else(|| EMPTY_RESPONSE.to_string()))
    }
}
