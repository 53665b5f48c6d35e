//! One-line request/outcome log formatting

use crate::config::BackendContract;
use crate::history::Normalized;
use crate::relay::{GenerationResult, RelayError};

/// Format a request log message in compact format
pub fn format_request_log(contract: BackendContract, normalized: &Normalized) -> String {
    let mut parts = vec![
        format!("contract={}", contract.as_str()),
        format!("turns={}", normalized.prior.len() + 1),
    ];

    if normalized.message.trim().is_empty() {
        parts.push("empty_message".to_string());
    } else {
        let preview = truncate_message(&normalize_whitespace(&normalized.message));
        parts.push(format!("\"{}\"", preview));
    }

    format!("→ {}", parts.join(" "))
}

/// Format the outcome of one relay call
pub fn format_result_log(result: &Result<GenerationResult, RelayError>, elapsed_ms: u128) -> String {
    match result {
        Ok(generation) => format!(
            "← ok {}ms reply_chars={} turns={}",
            elapsed_ms,
            generation.text.chars().count(),
            generation.history.len()
        ),
        Err(e) => format!("← {} {}ms", e.kind(), elapsed_ms),
    }
}

/// Convert newlines and tabs to single spaces, collapse multiple spaces
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate message according to rules:
/// - If <= 100 chars: show all
/// - If > 100 chars: first 25 + " ... " + last 75
fn truncate_message(s: &str) -> String {
    const MAX_TOTAL: usize = 100;
    const PREFIX_LEN: usize = 25;
    const SUFFIX_LEN: usize = 75;
    const ELLIPSIS: &str = " ... ";

    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= MAX_TOTAL {
        return s.to_string();
    }

    let prefix: String = chars[..PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - SUFFIX_LEN..].iter().collect();

    format!("{}{}{}", prefix, ELLIPSIS, suffix)
}
