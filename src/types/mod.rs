//! Shared data structures for the diagnostics assistant
//!
//! - `DtcRecord`: one row of the static trouble-code table
//! - `ParsedSignals`: numeric readings and code pulled out of a chat message
//! - `HealthPrediction`: rule-based assessment returned with every reply
//! - `ChatRequest` / `ChatResponse`: HTTP wire shapes of the chat endpoint

mod chat;
mod dtc;
mod signals;

pub use chat::*;
pub use dtc::*;
pub use signals::*;
