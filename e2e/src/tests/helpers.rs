//! Common test helpers and JSON builders

use serde_json::{json, Value};

// ─── Request builders ────────────────────────────────────────────────────────

/// Build a chat request with a message and an arbitrary history value
pub fn chat_request(message: &str, history: Value) -> Value {
    json!({
        "message": message,
        "conversationHistory": history
    })
}

/// Build a request with a well-formed two-turn history
pub fn request_with_history(message: &str) -> Value {
    chat_request(
        message,
        json!([
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello! how can I help?"}
        ]),
    )
}

// ─── Response builders ────────────────────────────────────────────────────────

/// A prompt-contract backend reply
pub fn backend_generated_text(text: &str) -> String {
    json!({ "generated_text": text }).to_string()
}

/// A backend reply that parses as JSON but carries no text field
pub fn backend_without_text() -> String {
    json!({ "tokens": 12, "finish_reason": "length" }).to_string()
}

// ─── Assertion helpers ────────────────────────────────────────────────────────

/// Assert two strings are equal, with context on failure
pub fn assert_eq_str(actual: &str, expected: &str, label: &str) -> anyhow::Result<()> {
    if actual != expected {
        Err(anyhow::anyhow!("{label}: expected {:?} but got {:?}", expected, actual))
    } else {
        Ok(())
    }
}

/// Assert condition is true, with message
pub fn assert_true(cond: bool, msg: &str) -> anyhow::Result<()> {
    if !cond {
        Err(anyhow::anyhow!("{}", msg))
    } else {
        Ok(())
    }
}

/// Assert the relay answered with a status code
pub fn assert_status(actual: u16, expected: u16) -> anyhow::Result<()> {
    assert_true(actual == expected, &format!("Expected {}, got {}", expected, actual))
}
