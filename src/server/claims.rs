//! Caller identity from an upstream-issued bearer token
//!
//! Tokens are verified by the identity layer in front of the relay. Here the
//! payload is only decoded so the caller can be named in logs.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Email (or username) claim of the caller's JWT, if one is present and readable
pub fn caller_identity(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();

    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;

    ["email", "cognito:username", "preferred_username", "sub"]
        .iter()
        .find_map(|key| claims.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
