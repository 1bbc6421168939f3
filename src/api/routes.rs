//! API route definitions
//!
//! - `POST /chat` - chat reply plus health prediction
//! - `GET /health` - liveness, table size and LLM backend
//! - `GET /api/v1/dtc/:code` - DTC lookup (enveloped)

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Versioned, enveloped endpoints
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/dtc/:code", get(handlers::get_dtc))
        .with_state(state)
}

/// Unversioned endpoints at the root
pub fn root_routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handlers::post_chat))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
