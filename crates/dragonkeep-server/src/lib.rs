//! Client gateway for the Dragonkeep game server.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/{player_id}`) carrying the game
//!   protocol: client requests and calls in, data updates, building
//!   replay events and call replies out
//! - **REST endpoints** for health checks and read-only inspection of
//!   loaded player records
//!
//! # Architecture
//!
//! Every connection owns one [`PlayerSession`] from `dragonkeep-core`.
//! Frames from the client are handled one at a time in arrival order;
//! events queued in the player's outbox are forwarded as they appear.
//! When the socket closes the session leaves, which stamps the player's
//! `lastOnline` and releases their record.
//!
//! [`PlayerSession`]: dragonkeep_core::PlayerSession

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::{GatewayError, ServerError};
pub use router::build_router;
pub use server::start_server;
pub use state::AppState;
