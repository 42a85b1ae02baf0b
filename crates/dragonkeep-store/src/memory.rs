//! In-process [`PlayerStore`] used in development and tests.
//!
//! Values are kept as JSON, exactly as the networked store would hold them,
//! so decoding goes through the same path as production reads.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dragonkeep_types::{DataKey, DataValue, PlayerId};
use tokio::sync::{RwLock, broadcast};

use crate::error::StoreError;
use crate::store::{CHANGE_FEED_CAPACITY, PlayerStore, StoreChange, WriterId, decode_stored};

type Namespace = BTreeMap<DataKey, serde_json::Value>;

struct Inner {
    records: RwLock<BTreeMap<PlayerId, Namespace>>,
    changes: broadcast::Sender<StoreChange>,
    unavailable: AtomicBool,
}

/// In-memory store. Cloning shares the same underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(BTreeMap::new()),
                changes,
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`]
    /// (or succeed again when `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The raw JSON persisted for a player.
    pub async fn raw(&self, player: PlayerId) -> BTreeMap<DataKey, serde_json::Value> {
        self.inner
            .records
            .read()
            .await
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStore for MemoryStore {
    async fn load(&self, player: PlayerId, key: DataKey) -> Result<Option<DataValue>, StoreError> {
        let json = self
            .inner
            .records
            .read()
            .await
            .get(&player)
            .and_then(|ns| ns.get(&key))
            .cloned();
        json.map(|j| decode_stored(player, key, j)).transpose()
    }

    async fn load_all(&self, player: PlayerId) -> Result<BTreeMap<DataKey, DataValue>, StoreError> {
        let namespace = self.raw(player).await;
        let mut values = BTreeMap::new();
        for (key, json) in namespace {
            values.insert(key, decode_stored(player, key, json)?);
        }
        Ok(values)
    }

    async fn save(
        &self,
        player: PlayerId,
        key: DataKey,
        value: &DataValue,
        origin: WriterId,
    ) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "write of {key} for player {player} refused"
            )));
        }

        let json = serde_json::to_value(value)?;
        self.inner
            .records
            .write()
            .await
            .entry(player)
            .or_default()
            .insert(key, json);

        // send only fails when nobody is subscribed.
        let _ = self.inner.changes.send(StoreChange {
            player,
            key,
            value: value.clone(),
            origin,
        });
        Ok(())
    }

    async fn erase(&self, player: PlayerId) -> Result<(), StoreError> {
        self.inner.records.write().await.remove(&player);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: PlayerId = PlayerId(1);

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let saved = store
            .save(PLAYER, DataKey::Gold, &DataValue::Number(250.0), WriterId::new())
            .await;
        assert!(saved.is_ok());

        let loaded = store.load(PLAYER, DataKey::Gold).await;
        assert_eq!(loaded.ok().flatten(), Some(DataValue::Number(250.0)));

        let missing = store.load(PLAYER, DataKey::Food).await;
        assert_eq!(missing.ok().flatten(), None);
    }

    #[tokio::test]
    async fn erase_removes_whole_namespace() {
        let store = MemoryStore::new();
        let origin = WriterId::new();
        let _ = store.save(PLAYER, DataKey::Gold, &DataValue::Number(1.0), origin).await;
        let _ = store.save(PLAYER, DataKey::Xp, &DataValue::Number(2.0), origin).await;
        let _ = store.save(PlayerId(2), DataKey::Xp, &DataValue::Number(3.0), origin).await;

        assert!(store.erase(PLAYER).await.is_ok());

        assert!(store.raw(PLAYER).await.is_empty());
        assert_eq!(store.raw(PlayerId(2)).await.len(), 1);
    }

    #[tokio::test]
    async fn writes_are_published_with_origin() {
        let store = MemoryStore::new();
        let mut feed = store.subscribe();
        let origin = WriterId::new();

        let _ = store.save(PLAYER, DataKey::Food, &DataValue::Number(20.0), origin).await;

        let change = feed.recv().await;
        assert!(change.is_ok());
        if let Ok(change) = change {
            assert_eq!(change.player, PLAYER);
            assert_eq!(change.key, DataKey::Food);
            assert_eq!(change.origin, origin);
        }
    }

    #[tokio::test]
    async fn unavailable_store_refuses_writes() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = store
            .save(PLAYER, DataKey::Gold, &DataValue::Number(1.0), WriterId::new())
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(store.raw(PLAYER).await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_values_are_reported() {
        let store = MemoryStore::new();
        store
            .inner
            .records
            .write()
            .await
            .entry(PLAYER)
            .or_default()
            .insert(DataKey::Gold, serde_json::json!("not a number"));

        let result = store.load_all(PLAYER).await;
        assert!(matches!(
            result,
            Err(StoreError::Corrupt { key: DataKey::Gold, .. })
        ));
    }
}
