//! Persistent store adapters for Dragonkeep player data.
//!
//! The data service owns the authoritative in-memory record of every
//! connected player and writes through to a [`PlayerStore`] on every
//! mutation. This crate provides that seam and its implementations.
//!
//! # Architecture
//!
//! ```text
//! DataService
//!     |
//!     +-- write-through ---------> PlayerStore::save
//!     |                              |-- MemoryStore    (in-process)
//!     |                              +-- DragonflyStore (hash per player)
//!     |
//!     +-- change feed <----------- PlayerStore::subscribe
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`PlayerStore`] trait, change feed types, [`AnyStore`]
//! - [`memory`] -- In-process store for development and tests
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) store
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{AnyStore, PlayerStore, StoreChange, WriterId};
