//! API route handlers

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use super::envelope;
use crate::assistant::ChatService;
use crate::types::{ChatRequest, ChatResponse};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self {
            chat,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Chat Endpoint
// ============================================================================

/// POST /chat - answer a free-text message
///
/// An empty body or JSON `null` counts as an empty message; a body that is
/// not JSON is a 400.
pub async fn post_chat(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ChatRequest::default()
    } else {
        match serde_json::from_slice::<Option<ChatRequest>>(&body) {
            Ok(req) => req.unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "Rejected chat body");
                return envelope::invalid_chat_body(&e);
            }
        }
    };

    let reply: ChatResponse = state.chat.respond(&request.message).await;
    Json(reply).into_response()
}

// ============================================================================
// DTC Lookup Endpoint
// ============================================================================

/// GET /api/v1/dtc/:code - look up a single trouble code
pub async fn get_dtc(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.chat.dtc_table().lookup(&code) {
        Some(record) => envelope::dtc_found(record),
        None => envelope::dtc_not_found(&code),
    }
}

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    /// Number of codes in the loaded DTC table
    pub dtc_codes: usize,
    pub llm_backend: &'static str,
}

/// GET /health - liveness check
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        dtc_codes: state.chat.dtc_table().len(),
        llm_backend: state.chat.backend_name(),
    })
}
