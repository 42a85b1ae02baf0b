//! Error types for the client gateway.
//!
//! [`GatewayError`] covers failures answering an HTTP request and converts
//! into an Axum response. [`ServerError`] covers process startup and the
//! serve loop.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dragonkeep_core::ConfigError;
use dragonkeep_store::StoreError;
use dragonkeep_types::PlayerId;

/// Errors that can occur answering an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path parameter could not be understood.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The player already has a live session on this server.
    #[error("player {0} is already connected")]
    AlreadyConnected(PlayerId),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyConnected(_) => StatusCode::CONFLICT,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Errors that can occur starting or running the gateway.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configuration file or catalog is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The persistent store could not be reached.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
