//! Assistant Module - turns a chat message into a reply
//!
//! - `prompts`: LLM prompt templates
//! - `reply`: template reply used when no LLM is configured
//! - `service`: [`ChatService`], the end-to-end chat flow

pub mod prompts;
pub mod reply;
pub mod service;

pub use reply::assemble_reply;
pub use service::{llm_error_notice, ChatService, TEMPLATE_BACKEND};
