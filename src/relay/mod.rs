//! Backend relay: one outbound generation call per invocation
//!
//! Every call ends in exactly one of three outcomes: a complete
//! [`GenerationResult`], [`RelayError::Transport`] (connect failure, timeout,
//! non-2xx), or [`RelayError::MalformedResponse`] (2xx without usable text).
//! Nothing is retried.

use axum::http::header;
use std::time::Duration;

use crate::api::{extract_generated_text, ChatPayload, GenerationParams, PromptPayload};
use crate::config::{BackendConfig, BackendContract};
use crate::history::{Normalized, Turn};

/// Outbound request, shaped for the configured backend contract
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Prompt {
        prompt: String,
        params: GenerationParams,
    },
    Chat {
        message: String,
        history: Vec<Turn>,
    },
}

impl GenerationRequest {
    /// Build the request for `contract` from a normalized inbound request
    pub fn build(contract: BackendContract, normalized: &Normalized, params: GenerationParams) -> Self {
        match contract {
            BackendContract::Prompt => GenerationRequest::Prompt {
                prompt: normalized.prompt(),
                params,
            },
            BackendContract::Chat => GenerationRequest::Chat {
                message: normalized.message.clone(),
                history: normalized.prior.clone(),
            },
        }
    }

    fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            GenerationRequest::Prompt { prompt, params } => serde_json::to_value(PromptPayload {
                prompt,
                params: *params,
            }),
            GenerationRequest::Chat { message, history } => serde_json::to_value(ChatPayload {
                message,
                conversation_history: history,
            }),
        }
    }
}

/// Generated reply plus the history it extends
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    pub history: Vec<Turn>,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Relay setup failed: {0}")]
    Setup(String),
}

impl RelayError {
    /// Short outcome label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "transport_failure",
            RelayError::MalformedResponse(_) => "malformed_response",
            RelayError::Setup(_) => "setup",
        }
    }
}

/// Client for the configured generation backend
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections across invocations.
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl Relay {
    pub fn new(backend: &BackendConfig) -> Result<Self, RelayError> {
        let endpoint = backend
            .endpoint()
            .ok_or_else(|| RelayError::Setup("backend URL is not configured".to_string()))?;
        let timeout = Duration::from_secs(backend.timeout_seconds);

        Ok(Self {
            client: build_http_client(backend, timeout)?,
            endpoint,
            api_key: backend.api_key.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Relay with the configured timeout
    pub async fn relay(
        &self,
        request: &GenerationRequest,
        history: Vec<Turn>,
    ) -> Result<GenerationResult, RelayError> {
        self.relay_with_timeout(request, history, self.timeout).await
    }

    /// Send `request` once and append the reply to `history`
    ///
    /// `history` must already end with the new user turn. It is returned with
    /// the assistant turn appended only on success.
    pub async fn relay_with_timeout(
        &self,
        request: &GenerationRequest,
        mut history: Vec<Turn>,
        timeout: Duration,
    ) -> Result<GenerationResult, RelayError> {
        let payload = request
            .payload()
            .map_err(|e| RelayError::Setup(format!("failed to encode backend request: {}", e)))?;

        let mut backend_req = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload);

        if let Some(ref api_key) = self.api_key {
            backend_req = backend_req.bearer_auth(api_key);
        }

        tracing::debug!(endpoint = %self.endpoint, timeout_ms = timeout.as_millis() as u64, "Sending backend request");

        let backend_response = backend_req.send().await.map_err(|e| {
            tracing::error!(error = %e, endpoint = %self.endpoint, "Failed to reach backend");
            RelayError::Transport(describe_transport_error(&e))
        })?;

        let status = backend_response.status();
        let body = backend_response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read backend response");
            RelayError::Transport(format!("failed to read backend response: {}", e))
        })?;

        if !status.is_success() {
            let preview = String::from_utf8_lossy(&body[..body.len().min(200)]).into_owned();
            tracing::error!(status = %status, error_body = %preview, "Backend returned error response");
            return Err(RelayError::Transport(format!("backend returned {}: {}", status, preview.trim())));
        }

        let json: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(
                body_size = body.len(),
                body_preview = %String::from_utf8_lossy(&body[..body.len().min(200)]),
                "Backend response is not valid JSON"
            );
            RelayError::MalformedResponse(format!("response body is not valid JSON: {}", e))
        })?;

        let text = extract_generated_text(&json).ok_or_else(|| {
            RelayError::MalformedResponse("response has no generated text field".to_string())
        })?;

        history.push(Turn::assistant(text.clone()));
        Ok(GenerationResult { text, history })
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("backend timed out: {}", e)
    } else if e.is_connect() {
        format!("failed to connect to backend: {}", e)
    } else {
        format!("failed to reach backend: {}", e)
    }
}

/// Build an HTTP client with TLS configuration
fn build_http_client(backend: &BackendConfig, timeout: Duration) -> Result<reqwest::Client, RelayError> {
    let mut client_builder = reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10);

    if let Some(ref tls) = backend.tls {
        if tls.accept_invalid_certs {
            client_builder = client_builder.danger_accept_invalid_certs(true);
            tracing::warn!("TLS: Accepting invalid certificates (use only for development/testing)");
        }

        if let Some(ref ca_path) = tls.ca_cert_path {
            let ca_cert = std::fs::read(ca_path)
                .map_err(|e| RelayError::Setup(format!("failed to read CA certificate {}: {}", ca_path, e)))?;
            let ca_cert = reqwest::Certificate::from_pem(&ca_cert)
                .map_err(|e| RelayError::Setup(format!("invalid CA certificate {}: {}", ca_path, e)))?;
            client_builder = client_builder.add_root_certificate(ca_cert);
            tracing::info!("TLS: Loaded custom CA certificate from {}", ca_path);
        }
    }

    client_builder
        .build()
        .map_err(|e| RelayError::Setup(format!("failed to build HTTP client: {}", e)))
}
