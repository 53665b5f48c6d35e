//! Relay request handler

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tracing::Instrument;

use super::claims::caller_identity;
use super::error::ApiError;
use super::router::RelayState;
use crate::api::{ChatRequest, ChatResponse};
use crate::history::normalize;
use crate::relay::GenerationRequest;
use crate::stats::{format_request_log, format_result_log};

/// Handles one inbound chat request end to end
pub struct RelayHandler {
    state: RelayState,
}

impl RelayHandler {
    pub fn new(state: RelayState) -> Self {
        Self { state }
    }

    /// Handle an incoming request; every outcome becomes a JSON response
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Response {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("relay", request_id = %request_id);

        async move {
            match self.process(headers, body).await {
                Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
                Err(e) => e.into_response(),
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, headers: &HeaderMap, body: &[u8]) -> Result<ChatResponse, ApiError> {
        let start = Instant::now();

        if let Some(user) = caller_identity(headers) {
            tracing::info!(user = %user, "Authenticated caller");
        }

        let request = parse_request(body)?;
        let normalized = normalize(request.message.as_deref(), &request.conversation_history);

        let contract = self.state.config.backend.contract;
        let params = self.state.config.generation.with_overrides(&request);
        tracing::info!("{}", format_request_log(contract, &normalized));

        let generation = GenerationRequest::build(contract, &normalized, params);
        let result = self.state.relay.relay(&generation, normalized.history()).await;
        tracing::info!("{}", format_result_log(&result, start.elapsed().as_millis()));

        match result {
            Ok(generation) => Ok(ChatResponse::new(generation.text, generation.history)),
            Err(source) => Err(ApiError::Relay {
                source,
                history: normalized.prior,
            }),
        }
    }
}

/// Parse the inbound body; an empty body is an empty request
fn parse_request(body: &[u8]) -> Result<ChatRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| ApiError::Input(format!("Invalid request body: {}", e)))
}
