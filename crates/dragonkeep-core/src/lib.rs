//! Player data, building timers and island replay for the Dragonkeep game
//! server.
//!
//! The services are explicitly constructed and share one store, clock,
//! scene and outbox registry (see [`session::Game`]):
//!
//! ```text
//! client frames -> PlayerSession -> PlacementService --+
//!                        |                             v
//!                        +------> TimerService ---> DataService ---> PlayerStore
//!                        |                             ^                |
//!                        +------> BuildingLoader ------+          change feed
//!                                                                       |
//! Outboxes <--- dataUpdate / placeBuilding / timerFinished <------------+
//! ```
//!
//! # Modules
//!
//! - [`building_loader`] -- Replays stored buildings, dragons and eggs on
//!   join and credits offline gold.
//! - [`catalog`] -- Static dragon and building data.
//! - [`clock`] -- Whole-second wall clock and a manual clock for tests.
//! - [`config`] -- Configuration loading from `dragonkeep.yaml`.
//! - [`data_service`] -- Authoritative per-player records with write-through
//!   persistence and client notifications.
//! - [`error`] -- Error types for every service.
//! - [`format`] -- Human-readable durations.
//! - [`geometry`] -- Storable and scene-space position conversion.
//! - [`outbox`] -- Ordered per-player notification channels.
//! - [`placement`] -- Building, dragon and egg placement requests.
//! - [`scene`] -- Registry of instantiated buildings and timer markers.
//! - [`session`] -- Service wiring and per-player frame dispatch.
//! - [`timer_service`] -- Building timers and reconciliation.

pub mod building_loader;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod data_service;
pub mod error;
pub mod format;
pub mod geometry;
pub mod outbox;
pub mod placement;
pub mod scene;
pub mod session;
pub mod timer_service;

pub use building_loader::{BuildingLoader, Replay};
pub use catalog::{BuildingEntry, Catalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig, StoreBackend};
pub use data_service::DataService;
pub use error::{DataError, PlacementError, SessionError, TimerError};
pub use outbox::{Outbox, Outboxes};
pub use placement::PlacementService;
pub use scene::{LiveScene, Scene};
pub use session::{Game, PlayerSession};
pub use timer_service::{Reconciliation, TimerService};
