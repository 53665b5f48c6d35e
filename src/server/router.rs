//! Relay HTTP server

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::handler::RelayHandler;
use crate::config::AppConfig;
use crate::relay::Relay;

/// Headers attached to every response, whatever the outcome
pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
pub const CORS_ALLOW_METHODS: &str = "OPTIONS,POST";

/// Shared state for the relay server
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<AppConfig>,
    pub relay: Arc<Relay>,
}

impl RelayState {
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        let relay = Relay::new(&config.backend)?;
        Ok(Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
        })
    }
}

/// Build the router with all routes and layers
pub fn build_router(state: RelayState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/", post(relay_handler).options(preflight_handler))
        .route("/chat", post(relay_handler).options(preflight_handler))
        .with_state(state);

    apply_layers(router)
}

fn apply_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(CORS_ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Run the relay server
///
/// Fails before binding if the configuration cannot serve requests.
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = RelayState::new(config)?;
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let endpoint = state.relay.endpoint().to_string();
    let contract = state.config.backend.contract;

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("chat-relay listening on {}", addr);
    tracing::info!(contract = contract.as_str(), "Relaying to {}", endpoint);

    Ok(axum::serve(listener, app).await?)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// CORS preflight; the header layers fill in the rest
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn relay_handler(State(state): State<RelayState>, headers: HeaderMap, body: Bytes) -> Response {
    let handler = RelayHandler::new(state);
    handler.handle(&headers, &body).await
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(detail).into_response()
}
