//! LLM Backend Module
//!
//! Hosted chat-completion APIs behind a small async trait so the chat
//! service (and tests) can swap backends.
//!
//! - **CohereBackend**: Cohere chat API (`POST /v1/chat`), keyed by
//!   `COHERE_API_KEY`

use async_trait::async_trait;

mod cohere;
pub use cohere::CohereBackend;

/// LLM call failures. The chat service turns these into an inline warning
/// in the reply instead of an HTTP error.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response from the LLM given a prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}
