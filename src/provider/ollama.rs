// src/provider/ollama.rs - Ollama /api/chat client (direct or through the relay)

use async_trait::async_trait;
use std::time::Duration;

use super::{ChatRequest, ChatResponse, ExchangeClient, Message};
use crate::infra::config::BackendConfig;
use crate::infra::errors::ExchangeError;

pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Fails if the HTTP client cannot be built; `timeout` bounds every request.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        Self::new(&config.base_url, &config.model, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check that something is answering at `base_url`.
    ///
    /// Ollama answers `/api/tags`; the relay only answers `/health`.
    pub async fn probe(&self) -> Result<(), ExchangeError> {
        for path in ["/api/tags", "/health"] {
            let resp = self
                .client
                .get(format!("{}{}", self.base_url, path))
                .timeout(Duration::from_secs(3))
                .send()
                .await
                .map_err(|e| ExchangeError::new(format!("Cannot reach backend: {}", e)))?;
            if resp.status().is_success() {
                return Ok(());
            }
        }
        Err(ExchangeError::new(format!(
            "Backend at {} did not answer a health probe",
            self.base_url
        )))
    }
}

#[async_trait]
impl ExchangeClient for OllamaClient {
    async fn exchange(&self, history: &[Message]) -> Result<Message, ExchangeError> {
        let body = ChatRequest::new(&self.model, history);

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExchangeError::new(format!("Request timed out: {}", e))
                } else {
                    ExchangeError::new(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::new(format!(
                "HTTP error {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let resp: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::new(format!("Failed to parse response: {}", e)))?;

        Ok(Message::from_reply(&resp.message.content))
    }
}
