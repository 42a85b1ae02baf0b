//! Per-player notification outboxes.
//!
//! Each connected client owns one unbounded, ordered channel. Every one-way
//! notification for that player goes through it, so two updates to the same
//! key always arrive in the order they were made.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use dragonkeep_types::{PlayerId, ServerEvent};
use tokio::sync::mpsc;

/// Receiving end handed to the connection that serves a player.
pub type Outbox = mpsc::UnboundedReceiver<ServerEvent>;

/// Registry of connected players' outboxes.
#[derive(Debug, Default)]
pub struct Outboxes {
    senders: RwLock<HashMap<PlayerId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl Outboxes {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbox for `player`, replacing any previous one.
    pub fn register(&self, player: PlayerId) -> Outbox {
        let (tx, rx) = mpsc::unbounded_channel();
        let previous = self
            .senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player, tx);
        if previous.is_some() {
            tracing::info!(%player, "Replaced existing outbox");
        }
        rx
    }

    /// Open an outbox for `player` unless a live one is already open.
    pub fn try_register(&self, player: PlayerId) -> Option<Outbox> {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        if senders.get(&player).is_some_and(|tx| !tx.is_closed()) {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        senders.insert(player, tx);
        Some(rx)
    }

    /// Close `player`'s outbox.
    pub fn unregister(&self, player: PlayerId) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player);
    }

    /// Whether `player` has an open outbox.
    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Queue `event` for `player`. Returns `false` if nobody is listening.
    pub fn send(&self, player: PlayerId, event: ServerEvent) -> bool {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = senders.get(&player) else {
            tracing::debug!(%player, event = event.name(), "No outbox, dropping event");
            return false;
        };
        let name = event.name();
        if tx.send(event).is_err() {
            tracing::debug!(%player, event = name, "Outbox closed, dropping event");
            return false;
        }
        true
    }
}
