//! Assistant Configuration Module
//!
//! Provides deployment configuration loaded from TOML files: server address,
//! DTC table location, chat API settings, predictor thresholds and the
//! offline training parameters.
//!
//! ## Loading Order
//!
//! 1. `DIAG_CONFIG` environment variable (path to TOML file)
//! 2. `diag_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(AssistantConfig::load());
//!
//! // Anywhere in the codebase:
//! let limit = config::get().thresholds.max_rpm;
//! ```

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;

use std::sync::OnceLock;

/// Global assistant configuration, initialized once at startup.
static ASSISTANT_CONFIG: OnceLock<AssistantConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: AssistantConfig) {
    if ASSISTANT_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global configuration, or the built-in defaults when `init()` has
/// not run (tests, library use).
pub fn get() -> &'static AssistantConfig {
    ASSISTANT_CONFIG.get_or_init(AssistantConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    ASSISTANT_CONFIG.get().is_some()
}
