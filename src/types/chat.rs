//! Chat endpoint request/response bodies

use serde::{Deserialize, Serialize};

use super::HealthPrediction;

/// Body of `POST /chat`. A missing `message` is treated as empty text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Reply to a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated (or template) explanation for the user
    pub message: String,
    pub health_prediction: HealthPrediction,
}
