//! Failure-to-response mapping at the handler boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::ErrorResponse;
use crate::history::Turn;
use crate::relay::RelayError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Inbound body could not be parsed
    #[error("{0}")]
    Input(String),

    /// Relay call failed; `history` is the caller's normalized prior history
    #[error("{source}")]
    Relay {
        source: RelayError,
        history: Vec<Turn>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Input(_) => StatusCode::BAD_REQUEST,
            ApiError::Relay {
                source: RelayError::Transport(_),
                ..
            } => StatusCode::BAD_GATEWAY,
            ApiError::Relay { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Relay request failed");
        } else {
            tracing::warn!(status = %status, error = %message, "Rejected relay request");
        }

        let body = match self {
            ApiError::Relay { history, .. } => ErrorResponse::new(message).with_history(history),
            ApiError::Input(_) | ApiError::Internal(_) => ErrorResponse::new(message),
        };

        (status, Json(body)).into_response()
    }
}
