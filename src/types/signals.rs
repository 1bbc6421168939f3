//! Per-request signal and prediction types

use serde::{Deserialize, Serialize};

/// Readings extracted from one user message.
///
/// Each field is independently present or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSignals {
    pub rpm: Option<i64>,
    pub speed: Option<i64>,
    pub temperature: Option<i64>,
    pub dtc_code: Option<String>,
}

/// Rule-based assessment of a set of signals.
///
/// Serialized with the capitalised keys clients already consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPrediction {
    #[serde(rename = "RPM")]
    pub rpm: Option<i64>,
    #[serde(rename = "Speed")]
    pub speed: Option<i64>,
    #[serde(rename = "Temperature")]
    pub temperature: Option<i64>,
    #[serde(rename = "DTC")]
    pub dtc: Option<String>,
    pub message: String,
}
