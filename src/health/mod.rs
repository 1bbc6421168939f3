//! Rule-Based Health Predictor
//!
//! Produces a one-line assessment from the parsed signals: a base message
//! describing the trouble code, followed by one warning per exceeded limit
//! in a fixed order (temperature, RPM, speed). Limits are strict: a reading
//! equal to its limit does not warn.

use std::collections::HashMap;

use crate::config::HealthThresholds;
use crate::types::{HealthPrediction, ParsedSignals};

pub const HIGH_TEMPERATURE_WARNING: &str = "Engine temperature is too high!";
pub const HIGH_RPM_WARNING: &str = "Engine RPM unusually high.";
pub const HIGH_SPEED_WARNING: &str = "Speed exceeds safe highway limits.";
pub const NO_DTC_MESSAGE: &str = "✅ No diagnostic trouble code detected.";

/// Warnings for every limit the signals exceed, in fixed order.
pub fn threshold_findings(signals: &ParsedSignals, limits: &HealthThresholds) -> Vec<&'static str> {
    let mut findings = Vec::new();
    if signals.temperature.is_some_and(|t| t > limits.max_temperature_c) {
        findings.push(HIGH_TEMPERATURE_WARNING);
    }
    if signals.rpm.is_some_and(|r| r > limits.max_rpm) {
        findings.push(HIGH_RPM_WARNING);
    }
    if signals.speed.is_some_and(|s| s > limits.max_speed_kmh) {
        findings.push(HIGH_SPEED_WARNING);
    }
    findings
}

/// Assess the signals against the code meanings and limits.
///
/// Deterministic: identical inputs always produce the identical message.
pub fn predict_vehicle_health(
    signals: &ParsedSignals,
    meanings: &HashMap<String, String>,
    limits: &HealthThresholds,
) -> HealthPrediction {
    let mut message = match signals.dtc_code.as_deref() {
        Some(code) => match meanings.get(code) {
            Some(meaning) => format!("⚠️ DTC {code}: {meaning}"),
            None => format!("❓ DTC {code} not found in database."),
        },
        None => NO_DTC_MESSAGE.to_string(),
    };

    for finding in threshold_findings(signals, limits) {
        message.push(' ');
        message.push_str(finding);
    }

    HealthPrediction {
        rpm: signals.rpm,
        speed: signals.speed,
        temperature: signals.temperature,
        dtc: signals.dtc_code.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meanings() -> HashMap<String, String> {
        HashMap::from([(
            "P0141".to_string(),
            "O2 Sensor Heater Circuit Malfunction".to_string(),
        )])
    }

    fn signals(rpm: Option<i64>, speed: Option<i64>, temp: Option<i64>, dtc: Option<&str>) -> ParsedSignals {
        ParsedSignals {
            rpm,
            speed,
            temperature: temp,
            dtc_code: dtc.map(str::to_string),
        }
    }

    #[test]
    fn test_known_code_with_high_rpm() {
        let p = predict_vehicle_health(
            &signals(Some(6000), None, None, Some("P0141")),
            &meanings(),
            &HealthThresholds::default(),
        );
        assert_eq!(
            p.message,
            "⚠️ DTC P0141: O2 Sensor Heater Circuit Malfunction Engine RPM unusually high."
        );
        assert_eq!(p.rpm, Some(6000));
        assert_eq!(p.dtc.as_deref(), Some("P0141"));
    }

    #[test]
    fn test_unknown_code() {
        let p = predict_vehicle_health(
            &signals(None, None, None, Some("P9999")),
            &meanings(),
            &HealthThresholds::default(),
        );
        assert_eq!(p.message, "❓ DTC P9999 not found in database.");
    }

    #[test]
    fn test_no_code_all_warnings_in_order() {
        let p = predict_vehicle_health(
            &signals(Some(5001), Some(121), Some(101), None),
            &meanings(),
            &HealthThresholds::default(),
        );
        assert_eq!(
            p.message,
            "✅ No diagnostic trouble code detected. Engine temperature is too high! \
             Engine RPM unusually high. Speed exceeds safe highway limits."
        );
    }

    #[test]
    fn test_limits_are_strict() {
        let s = signals(Some(5000), Some(120), Some(100), None);
        assert!(threshold_findings(&s, &HealthThresholds::default()).is_empty());
        let p = predict_vehicle_health(&s, &meanings(), &HealthThresholds::default());
        assert_eq!(p.message, NO_DTC_MESSAGE);
    }

    #[test]
    fn test_each_warning_independent() {
        let limits = HealthThresholds::default();
        assert_eq!(
            threshold_findings(&signals(None, Some(200), None, None), &limits),
            vec![HIGH_SPEED_WARNING]
        );
        assert_eq!(
            threshold_findings(&signals(None, None, Some(130), None), &limits),
            vec![HIGH_TEMPERATURE_WARNING]
        );
    }

    #[test]
    fn test_custom_limits() {
        let limits = HealthThresholds {
            max_temperature_c: 90,
            max_rpm: 3000,
            max_speed_kmh: 100,
        };
        let findings = threshold_findings(&signals(Some(3500), Some(110), Some(95), None), &limits);
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let s = signals(Some(7000), Some(50), Some(105), Some("P0141"));
        let a = predict_vehicle_health(&s, &meanings(), &HealthThresholds::default());
        let b = predict_vehicle_health(&s, &meanings(), &HealthThresholds::default());
        assert_eq!(a, b);
    }
}
