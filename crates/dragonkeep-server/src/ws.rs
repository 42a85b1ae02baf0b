//! `WebSocket` handler carrying the game protocol.
//!
//! Clients connect to `GET /ws/{player_id}`. Each text frame from the
//! client is one JSON [`ClientMessage`]; each frame to the client is one
//! JSON [`ServerMessage`]. Events queued for the player are forwarded in
//! the order they were produced, and a call's reply is only sent after
//! every event its handling produced.
//!
//! A player may hold at most one session per server; a second connection
//! is refused with `409 Conflict` while the first is alive.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use dragonkeep_core::{Outbox, PlayerSession};
use dragonkeep_store::AnyStore;
use dragonkeep_types::{ClientMessage, PlayerId, ServerMessage};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::state::AppState;

type Sink = SplitSink<WebSocket, Message>;

/// Upgrade an HTTP request to a `WebSocket` connection and open a session
/// for the player.
///
/// # Route
///
/// `GET /ws/{player_id}`
pub async fn ws_player(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let player = PlayerId(player_id);
    let (session, outbox) = state
        .game
        .try_connect(player)
        .ok_or(GatewayError::AlreadyConnected(player))?;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, session, outbox)))
}

/// Run one session until either side goes away, then leave.
async fn handle_ws(socket: WebSocket, session: PlayerSession<AnyStore>, mut outbox: Outbox) {
    let player = session.player();
    let (mut sink, mut stream) = socket.split();
    debug!(%player, "WebSocket client connected");

    loop {
        tokio::select! {
            event = outbox.recv() => {
                let Some(event) = event else {
                    debug!(%player, "Outbox closed, ending session");
                    break;
                };
                if !deliver(&mut sink, &ServerMessage::Event(event)).await {
                    debug!(%player, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(message) => session.handle_message(message).await,
                            Err(e) => {
                                warn!(%player, "Unreadable client frame: {e}");
                                Some(ServerMessage::Error {
                                    id: None,
                                    message: format!("unreadable frame: {e}"),
                                })
                            }
                        };
                        if !flush(&mut sink, &mut outbox, reply).await {
                            debug!(%player, "WebSocket client disconnected (send failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            debug!(%player, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%player, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(%player, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }

    if let Err(e) = session.leave().await {
        warn!(%player, error = %e, "Session ended without persisting lastOnline");
    }
}

/// Send every event already queued, then `reply` if there is one.
async fn flush(sink: &mut Sink, outbox: &mut Outbox, reply: Option<ServerMessage>) -> bool {
    while let Ok(event) = outbox.try_recv() {
        if !deliver(sink, &ServerMessage::Event(event)).await {
            return false;
        }
    }
    match reply {
        Some(reply) => deliver(sink, &reply).await,
        None => true,
    }
}

/// Serialize and send one frame. Returns `false` once the client is gone.
async fn deliver(sink: &mut Sink, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize server message: {e}");
            return true;
        }
    };
    sink.send(Message::Text(json.into())).await.is_ok()
}
