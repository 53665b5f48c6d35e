//! Generation backend payloads

use serde::{Deserialize, Serialize};

use super::ChatRequest;
use crate::history::Turn;

/// Sampling knobs sent with prompt-style requests
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_new_tokens() -> u32 {
    512
}

fn default_do_sample() -> bool {
    true
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_new_tokens: default_max_new_tokens(),
            do_sample: default_do_sample(),
        }
    }
}

impl GenerationParams {
    /// Apply per-request overrides on top of these defaults
    pub fn with_overrides(self, request: &ChatRequest) -> Self {
        Self {
            temperature: request.temperature.unwrap_or(self.temperature),
            top_p: request.top_p.unwrap_or(self.top_p),
            max_new_tokens: request.max_new_tokens.unwrap_or(self.max_new_tokens),
            do_sample: request.do_sample.unwrap_or(self.do_sample),
        }
    }
}

/// Body for prompt-contract backends
#[derive(Debug, Serialize)]
pub struct PromptPayload<'a> {
    pub prompt: &'a str,
    #[serde(flatten)]
    pub params: GenerationParams,
}

/// Body for chat-contract backends
#[derive(Debug, Serialize)]
pub struct ChatPayload<'a> {
    pub message: &'a str,
    #[serde(rename = "conversationHistory")]
    pub conversation_history: &'a [Turn],
}

/// Pull the generated text out of a backend reply
///
/// Accepts `{"generated_text": ...}`, chat-style `{"response": ...}`,
/// list-shaped `[{"generated_text": ...}]` and OpenAI-style
/// `{"choices": [{"message": {"content": ...}}]}`. Anything else is `None`.
pub fn extract_generated_text(body: &serde_json::Value) -> Option<String> {
    let text = match body {
        serde_json::Value::Array(items) => items.first()?.get("generated_text"),
        serde_json::Value::Object(_) => body
            .get("generated_text")
            .or_else(|| body.get("response"))
            .or_else(|| body.pointer("/choices/0/message/content"))
            .or_else(|| body.pointer("/choices/0/text")),
        _ => None,
    }?;

    text.as_str().map(str::to_string)
}
