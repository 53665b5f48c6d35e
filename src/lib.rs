//! chat-relay: HTTP relay in front of a text-generation backend
//!
//! Features:
//! - Conversation history normalization (null, object, list, string, or stringified JSON)
//! - Prompt flattening for single-prompt backends
//! - Single-shot backend relay with timeout and structured failure mapping
//! - Permissive CORS headers on every response

pub mod api;
pub mod config;
pub mod history;
pub mod relay;
pub mod server;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::AppConfig;
pub use history::{normalize, Normalized, Role, Turn};
pub use relay::{GenerationRequest, GenerationResult, Relay, RelayError};
pub use server::run_server;
