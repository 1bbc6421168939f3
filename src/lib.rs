//! Vehicle Diagnostics Assistant
//!
//! Chat assistant for vehicle owners plus an offline sensor-anomaly
//! training pipeline.
//!
//! ## Architecture
//!
//! - **Chat flow**: message → [`parsing`] → [`dtc`] lookup → [`health`]
//!   predictor → [`assistant`] prompt → [`llm`] backend → JSON reply
//!   served by [`api`]
//! - **Offline flow**: sensor logs → [`dataset`] merge → [`features`] →
//!   [`anomaly`] scaler + isolation forest → JSON artifacts
//!
//! The two flows share configuration only.

pub mod anomaly;
pub mod api;
pub mod assistant;
pub mod config;
pub mod dataset;
pub mod dtc;
pub mod features;
pub mod health;
pub mod llm;
pub mod parsing;
pub mod types;

// Re-export configuration
pub use config::{AssistantConfig, HealthThresholds};

// Re-export commonly used types
pub use types::{ChatRequest, ChatResponse, DtcRecord, HealthPrediction, ParsedSignals};

// Re-export the chat flow
pub use assistant::ChatService;
pub use dtc::{DtcError, DtcTable};
pub use health::predict_vehicle_health;
pub use llm::{CohereBackend, LlmBackend, LlmError};
pub use parsing::parse_message;

// Re-export the offline flow
pub use anomaly::{AnomalyError, ForestParams, IsolationForest, StandardScaler};
pub use dataset::{DataTable, DatasetError};
pub use features::{FeatureError, FeatureMatrix};
