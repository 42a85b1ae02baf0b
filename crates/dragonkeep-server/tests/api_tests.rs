//! Integration tests for the gateway's HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use dragonkeep_core::{Catalog, Game, GameConfig, LiveScene, ManualClock};
use dragonkeep_server::{AppState, build_router};
use dragonkeep_store::{AnyStore, MemoryStore};
use dragonkeep_types::{ClientRequest, PlayerId};
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let game = Arc::new(Game::new(
        AnyStore::Memory(MemoryStore::new()),
        &GameConfig::default(),
        Catalog::default(),
        Arc::new(ManualClock::at(1_700_000_000)),
        Arc::new(LiveScene::new()),
    ));
    Arc::new(AppState::new(game))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health() {
    let (status, json) = get(make_test_state(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_unknown_player_is_offline() {
    let (status, json) = get(make_test_state(), "/api/players/42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["player"], 42);
    assert_eq!(json["connected"], false);
    assert_eq!(json["loaded"], false);
}

#[tokio::test]
async fn test_connected_player_data_is_readable() {
    let state = make_test_state();
    let (session, _outbox) = state.game.connect(PlayerId(42));
    session
        .handle_request(ClientRequest::InitializeData)
        .await
        .unwrap();

    let (_, json) = get(Arc::clone(&state), "/api/players/42").await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["loaded"], true);

    let (status, json) = get(Arc::clone(&state), "/api/players/42/data/gold").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!(250.0));

    let (status, json) = get(state, "/api/players/42/data/buildings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["id"], "HATCHERY");
}

#[tokio::test]
async fn test_unknown_key_is_bad_request() {
    let (status, json) = get(make_test_state(), "/api/players/42/data/mana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_unloaded_player_data_is_not_found() {
    let (status, json) = get(make_test_state(), "/api/players/42/data/gold").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let response = build_router(make_test_state())
        .oneshot(Request::get("/ws/42").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_non_numeric_player_id_is_rejected() {
    let response = build_router(make_test_state())
        .oneshot(Request::get("/api/players/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
