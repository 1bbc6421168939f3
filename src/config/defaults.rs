//! System-wide default constants.
//!
//! Centralises the magic numbers used by the chat server and the offline
//! training pipeline. Grouped by subsystem for easy discovery.

// ============================================================================
// Configuration discovery
// ============================================================================

/// Environment variable holding an explicit config file path.
pub const CONFIG_ENV_VAR: &str = "DIAG_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "diag_config.toml";

// ============================================================================
// Server
// ============================================================================

/// Listen port when neither `PORT` nor the config sets one.
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variable that overrides the listen port.
pub const PORT_ENV_VAR: &str = "PORT";

/// Comma-separated CORS origins; unset means any origin.
pub const CORS_ORIGINS_ENV_VAR: &str = "DIAG_CORS_ORIGINS";

/// Maximum accepted request body (bytes).
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

// ============================================================================
// Data files
// ============================================================================

/// Directory holding the DTC table, sensor logs and trained artifacts.
pub const DATA_DIR: &str = "./data";

/// DTC lookup table file name.
pub const DTC_TABLE_FILE: &str = "dtc_dataset.csv";

/// Merged sensor table produced by `merge-datasets`.
pub const MERGED_FILE: &str = "merged_sensors.csv";

/// Serialized isolation forest.
pub const MODEL_FILE: &str = "anomaly_model.json";

/// Serialized standard scaler.
pub const SCALER_FILE: &str = "scaler.json";

// ============================================================================
// LLM
// ============================================================================

/// Environment variable with the chat API credential.
pub const API_KEY_ENV_VAR: &str = "COHERE_API_KEY";

/// Cohere chat endpoint.
pub const COHERE_CHAT_ENDPOINT: &str = "https://api.cohere.ai/v1/chat";

/// Chat model name.
pub const COHERE_MODEL: &str = "command-a-03-2025";

/// Sampling temperature for replies.
pub const LLM_TEMPERATURE: f64 = 0.7;

/// Reply length cap (tokens).
pub const LLM_MAX_TOKENS: u32 = 200;

/// HTTP client timeout for chat requests (seconds).
pub const LLM_HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Training
// ============================================================================

/// Numeric sensor columns used as model features.
pub const FEATURE_BASE_COLUMNS: &[&str] = &[
    "soc",          // state of charge
    "soh",          // state of health
    "battery_temp",
    "motor_rpm",
    "motor_torque",
];

/// Rolling-mean window sizes (rows).
pub const ROLLING_WINDOWS: &[usize] = &[5, 10];

/// Trees in the isolation forest.
pub const FOREST_ESTIMATORS: usize = 100;

/// Upper bound on rows sub-sampled per tree.
pub const FOREST_MAX_SAMPLES: usize = 256;

/// Expected share of anomalous rows.
pub const FOREST_CONTAMINATION: f64 = 0.05;

/// Seed for reproducible forests.
pub const FOREST_SEED: u64 = 42;
