//! Shared application state for the gateway.

use std::sync::Arc;

use dragonkeep_core::Game;
use dragonkeep_store::AnyStore;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Every game service, shared by all connections.
    pub game: Arc<Game<AnyStore>>,
}

impl AppState {
    /// Wrap an assembled game.
    pub const fn new(game: Arc<Game<AnyStore>>) -> Self {
        Self { game }
    }
}
