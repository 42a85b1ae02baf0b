//! Axum router construction for the gateway.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /ws/{player_id}` -- game protocol `WebSocket`
/// - `GET /api/players/{id}` -- player connection status
/// - `GET /api/players/{id}/data/{key}` -- one key of a loaded record
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws/{player_id}", get(ws::ws_player))
        // REST API
        .route("/api/players/{id}", get(handlers::get_player))
        .route("/api/players/{id}/data/{key}", get(handlers::get_player_data))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
