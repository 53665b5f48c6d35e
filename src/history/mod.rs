//! Conversation history normalization
//!
//! Callers send `conversationHistory` in whatever shape their frontend produced:
//! nothing at all, a single turn object, a list of turns, a plain string, or a
//! JSON document that was stringified one time too many. Everything is folded
//! into one canonical `Vec<Turn>` here, before any network call is made.

mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

pub use prompt::flatten_prompt;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a caller-supplied role string onto a canonical role.
    ///
    /// Anything that is not recognizably the model speaking is treated as the user.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "assistant" | "bot" | "ai" | "model" => Role::Assistant,
            _ => Role::User,
        }
    }

    /// Label used when rendering a flattened prompt
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Result of normalizing one inbound request
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Canonical history as the caller sent it, without the new message
    pub prior: Vec<Turn>,
    /// The new user message (empty when the caller sent none)
    pub message: String,
}

impl Normalized {
    /// Canonical history with the new user turn appended
    pub fn history(&self) -> Vec<Turn> {
        let mut history = Vec::with_capacity(self.prior.len() + 1);
        history.extend(self.prior.iter().cloned());
        history.push(Turn::user(self.message.clone()));
        history
    }

    /// Single-string prompt for backends that take one prompt instead of turns
    pub fn prompt(&self) -> String {
        flatten_prompt(&self.prior, &self.message)
    }
}

/// Normalize an inbound message and raw history value
///
/// A missing message becomes empty text rather than an error; the backend may
/// still reject it, which is reported as a relay failure.
pub fn normalize(raw_message: Option<&str>, raw_history: &Value) -> Normalized {
    Normalized {
        prior: canonicalize(raw_history),
        message: raw_message.unwrap_or_default().to_string(),
    }
}

/// Fold any accepted history shape into a canonical turn list
pub fn canonicalize(raw_history: &Value) -> Vec<Turn> {
    RawHistory::classify(raw_history).into_turns()
}

/// Accepted shapes of `conversationHistory`
#[derive(Debug)]
enum RawHistory<'a> {
    Empty,
    Single(&'a Map<String, Value>),
    List(&'a [Value]),
    Text(Cow<'a, str>),
}

impl<'a> RawHistory<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => RawHistory::Empty,
            Value::Object(map) => RawHistory::Single(map),
            Value::Array(items) => RawHistory::List(items),
            Value::String(text) => RawHistory::Text(Cow::Borrowed(text)),
            Value::Bool(_) | Value::Number(_) => RawHistory::Text(Cow::Owned(value.to_string())),
        }
    }

    fn into_turns(self) -> Vec<Turn> {
        match self {
            RawHistory::Empty => Vec::new(),
            RawHistory::Single(map) => turn_from_object(map).into_iter().collect(),
            RawHistory::List(items) => items.iter().filter_map(turn_from_item).collect(),
            RawHistory::Text(text) => turns_from_text(&text),
        }
    }
}

/// A string history is either stringified JSON or a prior textual turn
///
/// Anything that does not decode, blank text included, is kept verbatim as
/// one user turn.
fn turns_from_text(text: &str) -> Vec<Turn> {
    match serde_json::from_str::<Value>(text.trim()) {
        // Decode one level only: a list of strings is not decoded again
        Ok(decoded @ (Value::Null | Value::Object(_) | Value::Array(_))) => {
            tracing::debug!("Decoded JSON-encoded conversation history");
            RawHistory::classify(&decoded).into_turns()
        }
        Ok(Value::String(inner)) => vec![Turn::user(inner)],
        Ok(_) | Err(_) => vec![Turn::user(text)],
    }
}

fn turn_from_item(item: &Value) -> Option<Turn> {
    match item {
        Value::Object(map) => turn_from_object(map),
        Value::String(text) => Some(Turn::user(text.clone())),
        Value::Number(_) | Value::Bool(_) => Some(Turn::user(item.to_string())),
        Value::Null | Value::Array(_) => {
            tracing::debug!("Dropping malformed conversation history entry");
            None
        }
    }
}

fn turn_from_object(map: &Map<String, Value>) -> Option<Turn> {
    let role = map
        .get("role")
        .and_then(|r| r.as_str())
        .map(Role::from_label)
        .unwrap_or(Role::User);

    let content = ["content", "text", "message"]
        .iter()
        .find_map(|key| map.get(*key).and_then(content_text))?;

    Some(Turn { role, content })
}

/// Extract text content (handles string, scalar, or array-of-parts content)
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(content.to_string()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(_) if part.get("type").and_then(|t| t.as_str()) == Some("text") => {
                        part.get("text").and_then(|t| t.as_str())
                    }
                    _ => None,
                })
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join(" "))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_history() {
        let n = normalize(Some("hello"), &Value::Null);
        assert!(n.prior.is_empty());
        assert_eq!(n.history(), vec![Turn::user("hello")]);
    }

    #[test]
    fn test_empty_list_history() {
        let n = normalize(Some("hello"), &json!([]));
        assert_eq!(n.history().len(), 1);
    }

    #[test]
    fn test_single_object_history() {
        let n = normalize(Some("and you?"), &json!({"role": "assistant", "content": "I am fine"}));
        assert_eq!(
            n.history(),
            vec![Turn::assistant("I am fine"), Turn::user("and you?")]
        );
    }

    #[test]
    fn test_list_history_preserves_order() {
        let raw = json!([
            {"role": "user", "content": "one"},
            {"role": "assistant", "content": "two"},
            {"role": "user", "content": "three"}
        ]);
        let n = normalize(Some("four"), &raw);
        let history = n.history();
        assert_eq!(history.len(), 4);
        let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three", "four"]);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[3].role, Role::User);
    }

    #[test]
    fn test_opaque_text_history() {
        let n = normalize(Some("hello"), &json!("we talked about rust earlier"));
        let history = n.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Turn::user("we talked about rust earlier"));
    }

    #[test]
    fn test_json_encoded_list_history() {
        let encoded = r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello!"}]"#;
        let n = normalize(Some("how are you"), &Value::String(encoded.to_string()));
        assert_eq!(
            n.history(),
            vec![
                Turn::user("hi"),
                Turn::assistant("hello!"),
                Turn::user("how are you")
            ]
        );
    }

    #[test]
    fn test_json_encoded_object_history() {
        let encoded = r#"{"role":"assistant","content":"previous answer"}"#;
        let n = normalize(Some("ok"), &Value::String(encoded.to_string()));
        assert_eq!(n.prior, vec![Turn::assistant("previous answer")]);
    }

    #[test]
    fn test_broken_json_text_falls_back_to_opaque() {
        let text = r#"[{"role":"user","content":"unterminated"#;
        let n = normalize(Some("next"), &Value::String(text.to_string()));
        assert_eq!(n.prior, vec![Turn::user(text)]);
    }

    #[test]
    fn test_json_number_text_is_opaque() {
        let n = normalize(Some("next"), &json!("42"));
        assert_eq!(n.prior, vec![Turn::user("42")]);
    }

    #[test]
    fn test_blank_text_history_is_one_turn() {
        for raw in ["", "   ", "\n"] {
            let n = normalize(Some("hello"), &json!(raw));
            assert_eq!(n.prior, vec![Turn::user(raw)], "raw={:?}", raw);
            assert_eq!(n.history().len(), 2, "raw={:?}", raw);
        }
    }

    #[test]
    fn test_json_encoded_empty_string_is_one_turn() {
        let n = normalize(Some("hello"), &json!("\"\""));
        assert_eq!(n.prior, vec![Turn::user("")]);
    }

    #[test]
    fn test_missing_message_is_empty_text() {
        let n = normalize(None, &Value::Null);
        assert_eq!(n.message, "");
        assert_eq!(n.history(), vec![Turn::user("")]);
    }

    #[test]
    fn test_malformed_entries_dropped() {
        let raw = json!([
            null,
            {"role": "user"},
            {"role": "assistant", "content": null},
            {"role": "assistant", "content": {"nested": true}},
            [1, 2],
            {"role": "assistant", "content": "kept"}
        ]);
        let n = normalize(Some("x"), &raw);
        assert_eq!(n.prior, vec![Turn::assistant("kept")]);
    }

    #[test]
    fn test_role_aliases() {
        assert_eq!(Role::from_label("assistant"), Role::Assistant);
        assert_eq!(Role::from_label("Bot"), Role::Assistant);
        assert_eq!(Role::from_label("model"), Role::Assistant);
        assert_eq!(Role::from_label("human"), Role::User);
        assert_eq!(Role::from_label("system"), Role::User);
        assert_eq!(Role::from_label(""), Role::User);
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let n = normalize(Some("x"), &json!([{"content": "no role here"}]));
        assert_eq!(n.prior, vec![Turn::user("no role here")]);
    }

    #[test]
    fn test_content_fallback_keys() {
        let raw = json!([
            {"role": "user", "text": "from text"},
            {"role": "assistant", "message": "from message"}
        ]);
        let n = normalize(Some("x"), &raw);
        assert_eq!(
            n.prior,
            vec![Turn::user("from text"), Turn::assistant("from message")]
        );
    }

    #[test]
    fn test_content_parts_joined() {
        let raw = json!([{
            "role": "user",
            "content": [
                {"type": "text", "text": "Part 1"},
                {"type": "image_url", "image_url": {"url": "http://x"}},
                {"type": "text", "text": "Part 2"}
            ]
        }]);
        let n = normalize(Some("x"), &raw);
        assert_eq!(n.prior, vec![Turn::user("Part 1 Part 2")]);
    }

    #[test]
    fn test_scalar_content_stringified() {
        let n = normalize(Some("x"), &json!([{"role": "assistant", "content": 7}]));
        assert_eq!(n.prior, vec![Turn::assistant("7")]);
    }

    #[test]
    fn test_bare_strings_in_list() {
        let n = normalize(Some("x"), &json!(["first", "second"]));
        assert_eq!(n.prior, vec![Turn::user("first"), Turn::user("second")]);
    }

    #[test]
    fn test_turn_serde_shape() {
        let turn = Turn::assistant("hi there");
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({"role": "assistant", "content": "hi there"})
        );
    }
}
