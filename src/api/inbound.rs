//! Caller-facing request/response bodies

use serde::{Deserialize, Serialize};

use crate::history::Turn;

/// Inbound chat request
///
/// `conversation_history` is kept as raw JSON; its shape is only settled by
/// [`crate::history::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "conversationHistory", alias = "conversation_history")]
    pub conversation_history: serde_json::Value,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default, alias = "max_tokens")]
    pub max_new_tokens: Option<u32>,
    #[serde(default)]
    pub do_sample: Option<bool>,
}

/// Successful relay response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    #[serde(rename = "conversationHistory")]
    pub conversation_history: Vec<Turn>,
}

impl ChatResponse {
    pub fn new(response: String, conversation_history: Vec<Turn>) -> Self {
        Self {
            success: true,
            response,
            conversation_history,
        }
    }
}

/// Failed relay response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(rename = "conversationHistory", skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<Turn>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            conversation_history: None,
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.conversation_history = Some(history);
        self
    }
}
