//! The store adapter seam.
//!
//! [`PlayerStore`] is everything the data service needs from persistent
//! storage: keyed reads and writes partitioned by player, erasing a
//! player's whole namespace, and a feed of changes so writes made by other
//! processes reach the owning client.

use std::collections::BTreeMap;
use std::future::Future;

use dragonkeep_types::{DataKey, DataValue, PlayerId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dragonfly::DragonflyStore;
use crate::error::StoreError;
use crate::memory::MemoryStore;

/// Capacity of the change feed broadcast channel.
pub(crate) const CHANGE_FEED_CAPACITY: usize = 1024;

/// Identifies the process (or service instance) that wrote a value.
///
/// Every write carries its writer so a subscriber can tell its own writes
/// apart from external ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriterId(pub Uuid);

impl WriterId {
    /// A fresh writer id (UUID v7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for WriterId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for WriterId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    /// Owner of the value.
    pub player: PlayerId,
    /// Key written.
    pub key: DataKey,
    /// The value now stored.
    pub value: DataValue,
    /// Who wrote it.
    pub origin: WriterId,
}

/// Persistent per-player key/value storage.
///
/// Values are partitioned by player and key. All keys of one player live
/// under a single namespace so they can be loaded or erased together.
pub trait PlayerStore: Send + Sync + 'static {
    /// Read one key. `None` when the player never stored a value for it.
    fn load(
        &self,
        player: PlayerId,
        key: DataKey,
    ) -> impl Future<Output = Result<Option<DataValue>, StoreError>> + Send;

    /// Read every stored key of a player.
    fn load_all(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<BTreeMap<DataKey, DataValue>, StoreError>> + Send;

    /// Write one key and publish the change.
    fn save(
        &self,
        player: PlayerId,
        key: DataKey,
        value: &DataValue,
        origin: WriterId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove every key of a player.
    fn erase(&self, player: PlayerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribe to the change feed.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// A store selected at runtime from configuration.
#[derive(Clone)]
pub enum AnyStore {
    /// In-process store (development and tests).
    Memory(MemoryStore),
    /// `Dragonfly` (Redis-compatible) store.
    Dragonfly(DragonflyStore),
}

impl PlayerStore for AnyStore {
    async fn load(&self, player: PlayerId, key: DataKey) -> Result<Option<DataValue>, StoreError> {
        match self {
            Self::Memory(store) => store.load(player, key).await,
            Self::Dragonfly(store) => store.load(player, key).await,
        }
    }

    async fn load_all(&self, player: PlayerId) -> Result<BTreeMap<DataKey, DataValue>, StoreError> {
        match self {
            Self::Memory(store) => store.load_all(player).await,
            Self::Dragonfly(store) => store.load_all(player).await,
        }
    }

    async fn save(
        &self,
        player: PlayerId,
        key: DataKey,
        value: &DataValue,
        origin: WriterId,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(player, key, value, origin).await,
            Self::Dragonfly(store) => store.save(player, key, value, origin).await,
        }
    }

    async fn erase(&self, player: PlayerId) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.erase(player).await,
            Self::Dragonfly(store) => store.erase(player).await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        match self {
            Self::Memory(store) => store.subscribe(),
            Self::Dragonfly(store) => store.subscribe(),
        }
    }
}

/// Decode a stored JSON value, attributing failures to the player and key.
pub(crate) fn decode_stored(
    player: PlayerId,
    key: DataKey,
    json: serde_json::Value,
) -> Result<DataValue, StoreError> {
    DataValue::decode(key, json).map_err(|e| StoreError::Corrupt {
        player,
        key,
        reason: e.to_string(),
    })
}
