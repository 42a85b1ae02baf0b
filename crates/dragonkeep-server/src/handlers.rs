//! REST endpoint handlers for the gateway.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/players/{id}` | Connection and load status of a player |
//! | `GET` | `/api/players/{id}/data/{key}` | One key of a loaded player record |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use dragonkeep_types::{DataKey, DataValue, PlayerId};

use crate::error::GatewayError;
use crate::state::AppState;

/// Connection and load status of one player.
#[derive(Debug, serde::Serialize)]
pub struct PlayerStatus {
    /// The player.
    pub player: PlayerId,
    /// Whether a client session is open.
    pub connected: bool,
    /// Whether the player's record is held in memory.
    pub loaded: bool,
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Report whether a player is connected and loaded.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Json<PlayerStatus> {
    let player = PlayerId(id);
    Json(PlayerStatus {
        player,
        connected: state.game.outboxes().is_connected(player),
        loaded: state.game.data().is_loaded(player),
    })
}

/// Read one key of a loaded player record.
pub async fn get_player_data(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(u64, String)>,
) -> Result<Json<DataValue>, GatewayError> {
    let player = PlayerId(id);
    let key: DataKey = key
        .parse()
        .map_err(|e| GatewayError::InvalidRequest(format!("{e}")))?;
    let value = state
        .game
        .data()
        .get(player, key)
        .map_err(|e| GatewayError::NotFound(format!("{e}")))?;
    Ok(Json(value))
}
