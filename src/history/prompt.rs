//! Prompt flattening for single-prompt backends

use super::{Role, Turn};

/// Render prior turns plus the new message as one prompt string
///
/// Each turn becomes a `"<Role>: <content>"` line in conversation order, then
/// the new message as a user line, then an open `"Assistant:"` slot for the
/// model to complete. No truncation is applied.
pub fn flatten_prompt(prior: &[Turn], message: &str) -> String {
    let mut lines: Vec<String> = prior
        .iter()
        .map(|turn| format!("{}: {}", turn.role.prompt_label(), turn.content))
        .collect();

    lines.push(format!("{}: {}", Role::User.prompt_label(), message));
    lines.push(format!("{}:", Role::Assistant.prompt_label()));

    lines.join("\n")
}
