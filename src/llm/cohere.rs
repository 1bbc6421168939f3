//! Cohere chat API client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LlmBackend, LlmError};
use crate::config::{defaults, LlmConfig};

/// Longest error body echoed back in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    text: Option<String>,
}

/// HTTP client for the Cohere chat endpoint
#[derive(Clone)]
pub struct CohereBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl std::fmt::Debug for CohereBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohereBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl CohereBackend {
    pub fn new(api_key: &str, cfg: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_key: api_key.to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }

    /// Build a client from `COHERE_API_KEY`; `Ok(None)` when it is unset or
    /// blank.
    pub fn from_env(cfg: &LlmConfig) -> Result<Option<Self>, LlmError> {
        match std::env::var(defaults::API_KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::new(key.trim(), cfg).map(Some),
            _ => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmBackend for CohereBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            message: prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let body: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(status = %status, "Cohere chat request rejected");
            return Err(LlmError::Status { status, body });
        }

        let reply: ChatReply = resp.json().await?;
        let text = reply
            .text
            .ok_or_else(|| LlmError::MalformedResponse("missing 'text' field".to_string()))?;
        debug!(chars = text.len(), "Cohere reply received");
        Ok(text.trim().to_string())
    }

    fn backend_name(&self) -> &'static str {
        "cohere"
    }
}
