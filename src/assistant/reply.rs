//! Template reply used when no LLM backend is available

use crate::types::DtcRecord;

pub const NO_ANOMALIES: &str = "No immediate anomalies detected in the provided snapshot.";
pub const CLOSING_OFFER: &str =
    "If you'd like, I can simplify this explanation or suggest checks to do before visiting a mechanic.";

/// One-paragraph summary of a trouble code; empty fields are left out.
pub fn format_dtc_summary(record: &DtcRecord) -> String {
    let mut out = format!("Detected trouble code {}. {}", record.code, record.meaning);
    if !record.possible_cause.is_empty() {
        out.push_str(&format!(". Possible cause: {}", record.possible_cause));
    }
    if !record.fix_suggestion.is_empty() {
        out.push_str(&format!(". Suggested fix: {}", record.fix_suggestion));
    }
    if !record.urgency.is_empty() {
        out.push_str(&format!(". Urgency: {}", record.urgency));
    }
    out
}

pub fn format_anomalies(anomalies: &[&str]) -> String {
    if anomalies.is_empty() {
        return NO_ANOMALIES.to_string();
    }
    let mut out = String::from("I detected the following issues:");
    for a in anomalies {
        out.push_str("\n- ");
        out.push_str(a);
    }
    out
}

/// Assemble the full reply, sections separated by blank lines.
pub fn assemble_reply(record: Option<&DtcRecord>, anomalies: &[&str]) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(record) = record {
        parts.push(format_dtc_summary(record));
    }
    parts.push(format_anomalies(anomalies));
    parts.push(CLOSING_OFFER.to_string());
    parts.join("\n\n")
}
