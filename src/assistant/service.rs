//! Chat flow: parse → look up → predict → prompt → reply

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{prompts, reply};
use crate::config::HealthThresholds;
use crate::dtc::DtcTable;
use crate::health::{predict_vehicle_health, threshold_findings};
use crate::llm::LlmBackend;
use crate::parsing::parse_message;
use crate::types::ChatResponse;

/// Name reported when replies come from the built-in template.
pub const TEMPLATE_BACKEND: &str = "template";

/// Inline text returned in place of a reply when the LLM call fails.
pub fn llm_error_notice(error: &impl std::fmt::Display) -> String {
    format!("(⚠️ LLM API error: {error})")
}

/// Answers chat messages. Cheap to share behind an `Arc`; holds no
/// per-request state.
pub struct ChatService {
    dtc: Arc<DtcTable>,
    meanings: HashMap<String, String>,
    llm: Option<Arc<dyn LlmBackend>>,
    thresholds: HealthThresholds,
}

impl ChatService {
    pub fn new(
        dtc: Arc<DtcTable>,
        llm: Option<Arc<dyn LlmBackend>>,
        thresholds: HealthThresholds,
    ) -> Self {
        let meanings = dtc.meanings();
        Self {
            dtc,
            meanings,
            llm,
            thresholds,
        }
    }

    pub fn dtc_table(&self) -> &DtcTable {
        &self.dtc
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    /// Backend producing replies, or [`TEMPLATE_BACKEND`].
    pub fn backend_name(&self) -> &'static str {
        self.llm.as_ref().map_or(TEMPLATE_BACKEND, |b| b.backend_name())
    }

    /// Run the whole chat flow for one message.
    ///
    /// Never fails: an LLM error becomes an inline notice in `message`.
    pub async fn respond(&self, message: &str) -> ChatResponse {
        let signals = parse_message(message);
        let record = signals
            .dtc_code
            .as_deref()
            .and_then(|code| self.dtc.lookup(code));
        let health_prediction = predict_vehicle_health(&signals, &self.meanings, &self.thresholds);
        debug!(
            dtc = ?signals.dtc_code,
            rpm = ?signals.rpm,
            speed = ?signals.speed,
            temperature = ?signals.temperature,
            known = record.is_some(),
            "Parsed chat message"
        );

        let reply = match &self.llm {
            Some(backend) => {
                let prompt = match record {
                    Some(rec) => prompts::known_dtc_prompt(rec),
                    None => prompts::free_text_prompt(message),
                };
                match backend.generate(&prompt).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(backend = backend.backend_name(), error = %e, "LLM request failed");
                        llm_error_notice(&e)
                    }
                }
            }
            None => {
                let findings = threshold_findings(&signals, &self.thresholds);
                reply::assemble_reply(record, &findings)
            }
        };

        info!(
            dtc = signals.dtc_code.as_deref().unwrap_or("-"),
            backend = self.backend_name(),
            "Chat reply generated"
        );

        ChatResponse {
            message: reply,
            health_prediction,
        }
    }
}
