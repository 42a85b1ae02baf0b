//! The data service: sole owner and mutator of player records.
//!
//! The in-memory record is authoritative. Every mutation is applied to it,
//! pushed to the owning client as a `dataUpdate` notification, and then
//! written through to the [`PlayerStore`]. Reads never wait on the store.
//! Writes of one player are serialized by a per-player lock held until the
//! store write completes, so notifications and stored values follow the
//! order in which writes were issued.
//!
//! # Change feed
//!
//! Writes made by another process arrive on the store's change feed. The
//! listener started by [`DataService::spawn_change_listener`] applies those
//! (and only those) to the in-memory record and forwards them to the
//! client, once per actual value change.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dragonkeep_store::{PlayerStore, StoreChange, WriterId};
use dragonkeep_types::{
    Building, BuildingId, DataKey, DataValue, Dragon, PlayerId, PlayerRecord, ServerEvent,
    TimeInfo,
};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::PlayerDefaults;
use crate::error::DataError;
use crate::outbox::Outboxes;

#[derive(Debug, Default)]
struct PlayerState {
    record: PlayerRecord,
    /// Keys whose external changes are forwarded to the client.
    watched: BTreeSet<DataKey>,
}

#[derive(Debug, Default)]
struct PlayerSlot {
    state: RwLock<PlayerState>,
    /// Held from the in-memory update until the store write completes.
    writes: Mutex<()>,
}

impl PlayerSlot {
    fn read(&self) -> RwLockReadGuard<'_, PlayerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlayerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An update committed to memory and announced to the client.
#[derive(Debug)]
pub(crate) struct Commit<T> {
    /// What the update computed alongside the value.
    pub output: T,
    /// Outcome of the write-through. The in-memory value stands either way.
    pub persisted: Result<(), DataError>,
}

/// Owns the authoritative per-player state.
pub struct DataService<S> {
    store: S,
    outboxes: Arc<Outboxes>,
    clock: Arc<dyn Clock>,
    defaults: PlayerDefaults,
    origin: WriterId,
    players: RwLock<HashMap<PlayerId, Arc<PlayerSlot>>>,
}

impl<S: PlayerStore> DataService<S> {
    /// Create a service writing to `store` and notifying through
    /// `outboxes`.
    pub fn new(
        store: S,
        outboxes: Arc<Outboxes>,
        clock: Arc<dyn Clock>,
        defaults: PlayerDefaults,
    ) -> Self {
        Self {
            store,
            outboxes,
            clock,
            defaults,
            origin: WriterId::new(),
            players: RwLock::new(HashMap::new()),
        }
    }

    /// The writer id stamped on this service's store writes.
    pub const fn origin(&self) -> WriterId {
        self.origin
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn slot(&self, player: PlayerId) -> Option<Arc<PlayerSlot>> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .cloned()
    }

    fn slot_or_insert(&self, player: PlayerId) -> Arc<PlayerSlot> {
        Arc::clone(
            self.players
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(player)
                .or_default(),
        )
    }

    /// Whether every key of `player` is initialized.
    pub fn is_loaded(&self, player: PlayerId) -> bool {
        self.slot(player)
            .is_some_and(|slot| slot.read().record.is_complete())
    }

    /// Initialize `player`'s record.
    ///
    /// Each key takes the stored value when the store has one and the
    /// configured default otherwise; defaults are persisted. Every key is
    /// then sent to the client, followed by `dataLoaded`.
    ///
    /// Returns `false` without doing anything if the player is already
    /// initialized.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Store`] if loading or persisting fails, or
    /// [`DataError::TypeMismatch`] if a configured default has the wrong
    /// shape. The record is left uninitialized on error.
    pub async fn setup(&self, player: PlayerId) -> Result<bool, DataError> {
        let slot = self.slot_or_insert(player);
        let _writing = slot.writes.lock().await;
        if slot.read().record.is_complete() {
            tracing::debug!(%player, "Player data already initialized");
            return Ok(false);
        }

        let mut stored = self.store.load_all(player).await?;
        let mut record = PlayerRecord::new();
        let mut created = Vec::new();
        for key in DataKey::ALL {
            let value = match stored.remove(&key) {
                Some(value) => value,
                None => {
                    let value = self.defaults.value_for(key);
                    created.push((key, value.clone()));
                    value
                }
            };
            record.insert(key, value)?;
        }

        for (key, value) in &created {
            self.store.save(player, *key, value, self.origin).await?;
        }

        {
            let mut state = slot.write();
            state.record = record;
            state.watched.extend(DataKey::ALL);
            for key in DataKey::ALL {
                if let Some(value) = state.record.get(key) {
                    self.notify(player, key, value);
                }
            }
        }

        self.outboxes.send(player, ServerEvent::DataLoaded);
        tracing::info!(%player, defaulted = created.len(), "Player data initialized");
        Ok(true)
    }

    /// The current value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingKey`] if `key` was never initialized for
    /// `player`.
    pub fn get(&self, player: PlayerId, key: DataKey) -> Result<DataValue, DataError> {
        let slot = self.slot(player).ok_or(DataError::MissingKey(key))?;
        let state = slot.read();
        state
            .record
            .get(key)
            .cloned()
            .ok_or(DataError::MissingKey(key))
    }

    /// Overwrite `key`, notify the client and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::TypeMismatch`] if `value` does not fit `key` or
    /// [`DataError::OutOfRange`] if a numeric key would go negative (nothing
    /// changes in either case), or [`DataError::Store`] if the write fails
    /// (the in-memory value and the client keep the new value).
    pub async fn set(
        &self,
        player: PlayerId,
        key: DataKey,
        value: DataValue,
    ) -> Result<(), DataError> {
        let slot = self.slot_or_insert(player);
        let commit = self
            .commit(&slot, player, key, |_| Ok::<_, DataError>((Some(value), ())))
            .await?;
        commit.persisted
    }

    /// Add `amount` to a numeric key and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotNumeric`] for keys that do not hold numbers,
    /// [`DataError::MissingKey`] if `key` is uninitialized,
    /// [`DataError::OutOfRange`] if the result would be negative, or
    /// [`DataError::Store`] if the write fails.
    pub async fn increment(
        &self,
        player: PlayerId,
        key: DataKey,
        amount: f64,
    ) -> Result<f64, DataError> {
        if !key.is_numeric() {
            return Err(DataError::NotNumeric(key));
        }
        let slot = self.slot_or_insert(player);
        let commit = self
            .commit(&slot, player, key, |current| {
                let current = current.ok_or(DataError::MissingKey(key))?;
                let number = current.as_number().ok_or(DataError::NotNumeric(key))?;
                let next = number + amount;
                Ok::<_, DataError>((Some(DataValue::Number(next)), next))
            })
            .await?;
        commit.persisted.map(|()| commit.output)
    }

    /// Read-modify-write an initialized key under the player's write lock.
    ///
    /// `update` sees the current value and returns the replacement (or
    /// `None` to leave the key alone) together with any output the caller
    /// needs afterwards. An error from `update` changes nothing.
    pub(crate) async fn update<T, E, F>(
        &self,
        player: PlayerId,
        key: DataKey,
        update: F,
    ) -> Result<Commit<T>, E>
    where
        F: FnOnce(&DataValue) -> Result<(Option<DataValue>, T), E> + Send,
        T: Send,
        E: From<DataError> + Send,
    {
        let slot = self.slot(player).ok_or(DataError::MissingKey(key))?;
        self.commit(&slot, player, key, |current| {
            let current = current.ok_or(DataError::MissingKey(key))?;
            update(current)
        })
        .await
    }

    /// Compute and commit a new value, announce it, then write it through.
    async fn commit<T, E, F>(
        &self,
        slot: &PlayerSlot,
        player: PlayerId,
        key: DataKey,
        update: F,
    ) -> Result<Commit<T>, E>
    where
        F: FnOnce(Option<&DataValue>) -> Result<(Option<DataValue>, T), E> + Send,
        T: Send,
        E: From<DataError> + Send,
    {
        let _writing = slot.writes.lock().await;

        let (value, output) = {
            let mut state = slot.write();
            let (value, output) = update(state.record.get(key))?;
            if let Some(value) = &value {
                check_range(key, value)?;
                state.record.insert(key, value.clone()).map_err(DataError::from)?;
                if state.watched.insert(key) {
                    tracing::debug!(%player, %key, "Watching key for external changes");
                }
                self.notify(player, key, value);
            }
            (value, output)
        };

        let persisted = match &value {
            Some(value) => {
                let saved = self.store.save(player, key, value, self.origin).await;
                if saved.is_ok() {
                    tracing::debug!(%player, %key, "Data set");
                }
                saved.map_err(DataError::from)
            }
            None => Ok(()),
        };
        Ok(Commit { output, persisted })
    }

    /// Send the current value of `key` to the client.
    pub fn notify(&self, player: PlayerId, key: DataKey, value: &DataValue) -> bool {
        self.outboxes.send(
            player,
            ServerEvent::DataUpdate {
                key,
                value: value.clone(),
            },
        )
    }

    /// Apply a change read from the store's change feed.
    ///
    /// Changes written by this service, changes to players or keys that are
    /// not being watched, and changes that do not alter the value are
    /// ignored. Returns whether the client was notified.
    pub fn apply_external(&self, change: &StoreChange) -> bool {
        if change.origin == self.origin {
            return false;
        }
        let Some(slot) = self.slot(change.player) else {
            return false;
        };
        let mut state = slot.write();
        if !state.watched.contains(&change.key) {
            return false;
        }
        if state.record.get(change.key) == Some(&change.value) {
            return false;
        }
        if let Err(e) = state.record.insert(change.key, change.value.clone()) {
            tracing::warn!(player = %change.player, error = %e, "Ignoring external change");
            return false;
        }
        tracing::debug!(
            player = %change.player,
            key = %change.key,
            origin = %change.origin,
            "Applied external change"
        );
        self.notify(change.player, change.key, &change.value)
    }

    /// Forward external store changes until the feed closes or the service
    /// is dropped.
    pub fn spawn_change_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut feed = self.store.subscribe();
        let service = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(change) => {
                        let Some(service) = service.upgrade() else {
                            return;
                        };
                        service.apply_external(&change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Store change feed lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Store change feed closed");
                        return;
                    }
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Typed accessors
    // -----------------------------------------------------------------------

    /// The player's buildings.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingKey`] if buildings are not initialized.
    pub fn buildings(&self, player: PlayerId) -> Result<Vec<Building>, DataError> {
        self.get(player, DataKey::Buildings)?
            .into_buildings()
            .ok_or(DataError::TypeMismatch(DataKey::Buildings))
    }

    /// The player's dragons.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingKey`] if dragons are not initialized.
    pub fn dragons(&self, player: PlayerId) -> Result<Vec<Dragon>, DataError> {
        self.get(player, DataKey::Dragons)?
            .into_dragons()
            .ok_or(DataError::TypeMismatch(DataKey::Dragons))
    }

    /// The player's time bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingKey`] if time info is not initialized.
    pub fn time_info(&self, player: PlayerId) -> Result<TimeInfo, DataError> {
        self.get(player, DataKey::TimeInfo)?
            .into_time_info()
            .ok_or(DataError::TypeMismatch(DataKey::TimeInfo))
    }

    /// Look up a building by id. An unknown id is `None`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingKey`] if buildings are not initialized.
    pub fn find_building(
        &self,
        player: PlayerId,
        id: &BuildingId,
    ) -> Result<Option<Building>, DataError> {
        Ok(self
            .buildings(player)?
            .into_iter()
            .find(|b| &b.id == id))
    }

    // -----------------------------------------------------------------------
    // Session end
    // -----------------------------------------------------------------------

    /// Stamp `lastOnline` and release the in-memory record.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Store`] if the stamp cannot be persisted; the
    /// record is released regardless.
    pub async fn on_player_leave(&self, player: PlayerId) -> Result<(), DataError> {
        let result = if self.is_loaded(player) {
            let now = self.clock.now();
            self.update(player, DataKey::TimeInfo, |current| {
                let mut info = current.clone().into_time_info().unwrap_or_default();
                info.last_online = Some(now);
                Ok::<_, DataError>((Some(DataValue::TimeInfo(info)), ()))
            })
            .await
            .and_then(|commit| commit.persisted)
        } else {
            Ok(())
        };
        self.release(player);
        tracing::info!(%player, "Player left");
        result
    }

    /// Drop `player`'s in-memory record without writing anything.
    pub fn release(&self, player: PlayerId) {
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player);
    }
}

/// Numeric keys hold finite, non-negative amounts.
const fn check_range(key: DataKey, value: &DataValue) -> Result<(), DataError> {
    match value.as_number() {
        Some(number) if key.is_numeric() && (!number.is_finite() || number < 0.0) => {
            Err(DataError::OutOfRange { key, value: number })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use dragonkeep_store::MemoryStore;
    use dragonkeep_types::{BuildingCategory, BuildingKind, StorableVector3};

    use super::*;
    use crate::clock::ManualClock;
    use crate::outbox::Outbox;

    const PLAYER: PlayerId = PlayerId(11);

    fn service(store: MemoryStore) -> (DataService<MemoryStore>, Outbox) {
        let outboxes = Arc::new(Outboxes::new());
        let rx = outboxes.register(PLAYER);
        let service = DataService::new(
            store,
            outboxes,
            Arc::new(ManualClock::at(1_700_000_000)),
            PlayerDefaults::default(),
        );
        (service, rx)
    }

    fn drain(rx: &mut Outbox) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn setup_defaults_every_key_then_announces() {
        let (data, mut rx) = service(MemoryStore::new());

        assert!(data.setup(PLAYER).await.unwrap_or(false));
        assert!(data.is_loaded(PLAYER));

        let events = drain(&mut rx);
        assert_eq!(events.len(), DataKey::ALL.len() + 1);
        assert_eq!(events.last(), Some(&ServerEvent::DataLoaded));

        let gold = data.get(PLAYER, DataKey::Gold).ok();
        assert_eq!(gold, Some(DataValue::Number(250.0)));
        assert_eq!(data.store().raw(PLAYER).await.len(), DataKey::ALL.len());
    }

    #[tokio::test]
    async fn setup_keeps_stored_values() {
        let store = MemoryStore::new();
        let _ = store
            .save(PLAYER, DataKey::Gold, &DataValue::Number(900.0), WriterId::new())
            .await;
        let (data, _rx) = service(store);

        let _ = data.setup(PLAYER).await;
        let gold = data.get(PLAYER, DataKey::Gold).ok();
        assert_eq!(gold, Some(DataValue::Number(900.0)));
        let food = data.get(PLAYER, DataKey::Food).ok();
        assert_eq!(food, Some(DataValue::Number(20.0)));
    }

    #[tokio::test]
    async fn second_setup_is_a_no_op() {
        let (data, mut rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        assert!(!data.setup(PLAYER).await.unwrap_or(true));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn get_before_setup_is_missing() {
        let (data, _rx) = service(MemoryStore::new());
        assert!(matches!(
            data.get(PLAYER, DataKey::Gold),
            Err(DataError::MissingKey(DataKey::Gold))
        ));
    }

    #[tokio::test]
    async fn set_notifies_and_writes_through() {
        let (data, mut rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        assert!(data.set(PLAYER, DataKey::Gold, 300.0.into()).await.is_ok());

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::DataUpdate {
                key: DataKey::Gold,
                value: DataValue::Number(300.0),
            }]
        );
        let stored = data.store().load(PLAYER, DataKey::Gold).await.ok().flatten();
        assert_eq!(stored, Some(DataValue::Number(300.0)));
    }

    #[tokio::test]
    async fn increment_adds_and_rejects_non_numbers() {
        let (data, _rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;

        assert_eq!(data.increment(PLAYER, DataKey::Gold, 50.0).await.ok(), Some(300.0));
        assert_eq!(data.increment(PLAYER, DataKey::Gold, -100.0).await.ok(), Some(200.0));
        assert!(matches!(
            data.increment(PLAYER, DataKey::Buildings, 1.0).await,
            Err(DataError::NotNumeric(DataKey::Buildings))
        ));
    }

    #[tokio::test]
    async fn numeric_keys_never_go_negative() {
        let (data, mut rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        assert!(matches!(
            data.increment(PLAYER, DataKey::Gold, -251.0).await,
            Err(DataError::OutOfRange { key: DataKey::Gold, .. })
        ));
        assert!(matches!(
            data.set(PLAYER, DataKey::Food, (-1.0).into()).await,
            Err(DataError::OutOfRange { key: DataKey::Food, .. })
        ));
        assert!(matches!(
            data.set(PLAYER, DataKey::Xp, f64::NAN.into()).await,
            Err(DataError::OutOfRange { key: DataKey::Xp, .. })
        ));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(data.get(PLAYER, DataKey::Gold).ok(), Some(DataValue::Number(250.0)));
        let stored = data.store().load(PLAYER, DataKey::Food).await.ok().flatten();
        assert_eq!(stored, Some(DataValue::Number(20.0)));

        // Spending down to exactly zero is fine.
        assert_eq!(data.increment(PLAYER, DataKey::Gold, -250.0).await.ok(), Some(0.0));
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let (data, _rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        let data = Arc::new(data);

        let mut tasks = Vec::new();
        for n in 0..16 {
            let data = Arc::clone(&data);
            tasks.push(tokio::spawn(async move {
                let building_id = BuildingId::from(format!("B{n}").as_str());
                data.update(PLAYER, DataKey::Buildings, |current| {
                    let mut buildings = current
                        .clone()
                        .into_buildings()
                        .ok_or(DataError::TypeMismatch(DataKey::Buildings))?;
                    buildings.push(Building {
                        id: building_id,
                        name: "Farm".to_owned(),
                        position: StorableVector3::default(),
                        kind: BuildingKind::new(BuildingCategory::Building),
                    });
                    Ok::<_, DataError>((Some(buildings.into()), ()))
                })
                .await
                .map(|commit| commit.persisted.is_ok())
            }));
        }
        for task in tasks {
            assert!(matches!(task.await, Ok(Ok(true))));
        }

        // The hatchery plus every building pushed above.
        assert_eq!(data.buildings(PLAYER).map(|b| b.len()).ok(), Some(17));
        let stored = data
            .store()
            .load(PLAYER, DataKey::Buildings)
            .await
            .ok()
            .flatten()
            .and_then(DataValue::into_buildings);
        assert_eq!(stored.map(|b| b.len()), Some(17));
    }

    #[tokio::test]
    async fn update_can_leave_the_key_alone() {
        let (data, mut rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        let commit = data
            .update(PLAYER, DataKey::Gold, |current| {
                Ok::<_, DataError>((None, current.as_number()))
            })
            .await;
        assert!(matches!(commit, Ok(Commit { output: Some(_), persisted: Ok(()) })));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn failed_write_surfaces_but_memory_stays_authoritative() {
        let store = MemoryStore::new();
        let (data, mut rx) = service(store.clone());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        store.set_unavailable(true);
        let result = data.set(PLAYER, DataKey::Gold, 1.0.into()).await;
        assert!(matches!(result, Err(DataError::Store(_))));

        assert_eq!(drain(&mut rx).len(), 1);
        let gold = data.get(PLAYER, DataKey::Gold).ok();
        assert_eq!(gold, Some(DataValue::Number(1.0)));
        let stored = store.load(PLAYER, DataKey::Gold).await.ok().flatten();
        assert_eq!(stored, Some(DataValue::Number(250.0)));
    }

    #[tokio::test]
    async fn wrong_shape_changes_nothing() {
        let (data, mut rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        let result = data.set(PLAYER, DataKey::TimeInfo, 5.0.into()).await;
        assert!(matches!(result, Err(DataError::TypeMismatch(DataKey::TimeInfo))));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn external_changes_notify_once() {
        let (data, mut rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;
        drain(&mut rx);

        let change = StoreChange {
            player: PLAYER,
            key: DataKey::Diamonds,
            value: DataValue::Number(40.0),
            origin: WriterId::new(),
        };
        assert!(data.apply_external(&change));
        // Same value again: nothing changed, nothing sent.
        assert!(!data.apply_external(&change));
        assert_eq!(drain(&mut rx).len(), 1);

        let own = StoreChange {
            player: PLAYER,
            key: DataKey::Diamonds,
            value: DataValue::Number(41.0),
            origin: data.origin(),
        };
        assert!(!data.apply_external(&own));
    }

    #[tokio::test]
    async fn find_building_returns_none_for_unknown_ids() {
        let (data, _rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;

        let hatchery = data.find_building(PLAYER, &BuildingId::from("HATCHERY"));
        assert!(matches!(
            hatchery.ok().flatten().map(|b| b.kind),
            Some(BuildingKind::Hatchery { .. })
        ));
        let missing = data.find_building(PLAYER, &BuildingId::from("nope"));
        assert!(matches!(missing, Ok(None)));
    }

    #[tokio::test]
    async fn leaving_stamps_last_online_and_releases() {
        let (data, _rx) = service(MemoryStore::new());
        let _ = data.setup(PLAYER).await;

        assert!(data.on_player_leave(PLAYER).await.is_ok());
        assert!(!data.is_loaded(PLAYER));

        let stored = data.store().load(PLAYER, DataKey::TimeInfo).await.ok().flatten();
        let last_online = stored
            .and_then(DataValue::into_time_info)
            .and_then(|info| info.last_online)
            .map(|t| t.timestamp());
        assert_eq!(last_online, Some(1_700_000_000));
    }
}
