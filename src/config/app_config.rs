//! Assistant Configuration - server, DTC table, LLM and rule thresholds as TOML
//!
//! Every section implements `Default` with the values the assistant ships with,
//! so a missing or partial config file behaves exactly like no file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an assistant deployment.
///
/// Load with `AssistantConfig::load()` which searches:
/// 1. `$DIAG_CONFIG` env var
/// 2. `./diag_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// DTC lookup table location
    #[serde(default)]
    pub dtc: DtcConfig,

    /// Chat-completion API settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Rule-based health predictor limits
    #[serde(default)]
    pub thresholds: HealthThresholds,

    /// Offline merge + anomaly training
    #[serde(default)]
    pub training: TrainingConfig,
}

impl AssistantConfig {
    /// Load configuration using the standard search order:
    /// 1. `$DIAG_CONFIG` environment variable
    /// 2. `./diag_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded assistant config from DIAG_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from DIAG_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "DIAG_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded assistant config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No diag_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate values for internal consistency.
    ///
    /// Rules:
    /// - Contamination must lie in (0, 0.5]
    /// - Estimator count, sub-sample size and rolling windows must be > 0
    /// - LLM temperature must be within [0, 5] and max tokens > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let t = &self.training;
        if !(t.contamination > 0.0 && t.contamination <= 0.5) {
            errors.push(format!(
                "training.contamination ({}) must be in (0, 0.5]",
                t.contamination
            ));
        }
        if t.n_estimators == 0 {
            errors.push("training.n_estimators must be > 0".to_string());
        }
        if t.max_samples == 0 {
            errors.push("training.max_samples must be > 0".to_string());
        }
        if t.rolling_windows.iter().any(|&w| w == 0) {
            errors.push("training.rolling_windows entries must be > 0".to_string());
        }
        if t.base_columns.is_empty() {
            errors.push("training.base_columns must not be empty".to_string());
        }

        let l = &self.llm;
        if !(0.0..=5.0).contains(&l.temperature) {
            errors.push(format!("llm.temperature ({}) must be in [0, 5]", l.temperature));
        }
        if l.max_tokens == 0 {
            errors.push("llm.max_tokens must be > 0".to_string());
        }

        if self.dtc.table_path.as_os_str().is_empty() {
            errors.push("dtc.table_path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address; `PORT` overrides the port part at startup.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: format!("0.0.0.0:{}", defaults::DEFAULT_PORT),
        }
    }
}

// ============================================================================
// DTC Table
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DtcConfig {
    pub table_path: PathBuf,
}

impl Default for DtcConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from(defaults::DATA_DIR).join(defaults::DTC_TABLE_FILE),
        }
    }
}

// ============================================================================
// LLM
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat endpoint URL
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::COHERE_CHAT_ENDPOINT.to_string(),
            model: defaults::COHERE_MODEL.to_string(),
            temperature: defaults::LLM_TEMPERATURE,
            max_tokens: defaults::LLM_MAX_TOKENS,
            timeout_secs: defaults::LLM_HTTP_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Health Thresholds
// ============================================================================

/// Strict upper limits; a reading above a limit triggers its warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub max_temperature_c: i64,
    pub max_rpm: i64,
    pub max_speed_kmh: i64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_temperature_c: 100,
            max_rpm: 5000,
            max_speed_kmh: 120,
        }
    }
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Directory holding raw sensor logs and all produced artifacts
    pub data_dir: PathBuf,
    pub merged_file: String,
    pub model_file: String,
    pub scaler_file: String,
    /// Numeric columns that get cleaned and rolling-averaged
    pub base_columns: Vec<String>,
    pub rolling_windows: Vec<usize>,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            merged_file: defaults::MERGED_FILE.to_string(),
            model_file: defaults::MODEL_FILE.to_string(),
            scaler_file: defaults::SCALER_FILE.to_string(),
            base_columns: defaults::FEATURE_BASE_COLUMNS
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
            rolling_windows: defaults::ROLLING_WINDOWS.to_vec(),
            n_estimators: defaults::FOREST_ESTIMATORS,
            max_samples: defaults::FOREST_MAX_SAMPLES,
            contamination: defaults::FOREST_CONTAMINATION,
            seed: defaults::FOREST_SEED,
        }
    }
}

impl TrainingConfig {
    pub fn merged_path(&self) -> PathBuf {
        self.data_dir.join(&self.merged_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.data_dir.join(&self.scaler_file)
    }
}

// ============================================================================
// Tests
// ============================================================================
