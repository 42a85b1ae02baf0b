//! Building timers: construction, upgrades, hatching.
//!
//! Timers live in the player's `timeInfo` and are only ever read and
//! written through the [`DataService`], never against the store directly.
//! A timer is active while `now < beganAt + length`; once that boundary is
//! crossed the next reconciliation pass removes it, clears the building's
//! in-progress marker and tells the client `timerFinished`.

use std::sync::Arc;

use dragonkeep_store::PlayerStore;
use dragonkeep_types::{BuildingId, DataKey, DataValue, PlayerId, ServerEvent, TimeInfo, Timer};

use crate::clock::Clock;
use crate::data_service::DataService;
use crate::error::{DataError, TimerError};
use crate::outbox::Outboxes;
use crate::scene::Scene;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Expired timers that were removed.
    pub finished: Vec<Timer>,
    /// Buildings that gained an in-progress marker.
    pub marked: Vec<BuildingId>,
    /// Timers whose building is not in the scene (left untouched).
    pub missing: Vec<BuildingId>,
}

impl Reconciliation {
    /// Whether the pass changed anything.
    pub fn is_noop(&self) -> bool {
        self.finished.is_empty() && self.marked.is_empty()
    }
}

/// Tracks per-building timers for every player.
pub struct TimerService<S> {
    data: Arc<DataService<S>>,
    scene: Arc<dyn Scene>,
    outboxes: Arc<Outboxes>,
    clock: Arc<dyn Clock>,
}

impl<S: PlayerStore> TimerService<S> {
    /// Create a timer service on top of `data`.
    pub fn new(
        data: Arc<DataService<S>>,
        scene: Arc<dyn Scene>,
        outboxes: Arc<Outboxes>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            data,
            scene,
            outboxes,
            clock,
        }
    }

    /// Whether a timer for `building_id` is running right now.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Data`] if `timeInfo` is not initialized.
    pub fn is_timer_active(
        &self,
        player: PlayerId,
        building_id: &BuildingId,
    ) -> Result<bool, TimerError> {
        let now = self.clock.now();
        let info = self.data.time_info(player)?;
        Ok(info.timer(building_id).is_some_and(|t| t.is_active(now)))
    }

    /// Seconds left on the running timer of `building_id`, `None` when no
    /// timer is running.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Data`] if `timeInfo` is not initialized.
    pub fn remaining(
        &self,
        player: PlayerId,
        building_id: &BuildingId,
    ) -> Result<Option<u64>, TimerError> {
        let now = self.clock.now();
        let info = self.data.time_info(player)?;
        Ok(info
            .timer(building_id)
            .filter(|t| t.is_active(now))
            .map(|t| t.remaining_seconds(now)))
    }

    /// Start a `length`-second timer on `building_id`, then reconcile.
    ///
    /// An expired timer still stored for the building is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::UnknownBuilding`] if the player has no such
    /// building, [`TimerError::AlreadyActive`] if a timer for it is still
    /// running, or [`TimerError::Data`] if persisting fails.
    pub async fn add_building_timer(
        &self,
        player: PlayerId,
        building_id: BuildingId,
        length: u64,
    ) -> Result<Timer, TimerError> {
        if self.data.find_building(player, &building_id)?.is_none() {
            return Err(TimerError::UnknownBuilding(building_id));
        }

        let now = self.clock.now();
        let commit = self
            .data
            .update(player, DataKey::TimeInfo, |current| {
                let mut info = time_info_of(current)?;
                if let Some(existing) = info.timer(&building_id).filter(|t| t.is_active(now)) {
                    return Err(TimerError::AlreadyActive {
                        remaining: existing.remaining_seconds(now),
                        building_id: building_id.clone(),
                    });
                }
                let timer = Timer {
                    building_id: building_id.clone(),
                    began_at: now,
                    length,
                };
                info.timers.retain(|t| t.building_id != building_id);
                info.timers.push(timer.clone());
                Ok((Some(info.into()), timer))
            })
            .await?;
        let timer = commit.output;
        tracing::info!(
            %player,
            building_id = %timer.building_id,
            length,
            "Timer started"
        );

        let reconciled = self.reconcile(player).await;
        commit.persisted?;
        reconciled?;
        Ok(timer)
    }

    /// Remove the timer of `building_id`. Returns whether one existed.
    ///
    /// The marker is cleared even when persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Data`] if reading or persisting fails.
    pub async fn remove_timer(
        &self,
        player: PlayerId,
        building_id: &BuildingId,
    ) -> Result<bool, TimerError> {
        let commit = self
            .data
            .update(player, DataKey::TimeInfo, |current| {
                let mut info = time_info_of(current)?;
                let before = info.timers.len();
                info.timers.retain(|t| &t.building_id != building_id);
                if info.timers.len() == before {
                    return Ok::<_, TimerError>((None, false));
                }
                Ok((Some(info.into()), true))
            })
            .await?;
        if commit.output {
            self.scene.set_timer_marker(player, building_id, false);
            tracing::debug!(%player, %building_id, "Timer removed");
        }
        commit.persisted?;
        Ok(commit.output)
    }

    /// Bring markers and stored timers in line with the clock.
    ///
    /// Timers whose building is not in the scene are logged and skipped.
    /// Expired timers are removed in a single write and announced with
    /// `timerFinished`; running timers get a marker if they lack one.
    /// Running the pass twice in a row does nothing the second time.
    ///
    /// Markers and `timerFinished` follow the in-memory `timeInfo`, so a
    /// failed write still clears the markers of finished timers.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Data`] if reading or persisting fails.
    pub async fn reconcile(&self, player: PlayerId) -> Result<Reconciliation, TimerError> {
        let now = self.clock.now();
        let scene = &self.scene;
        let commit = self
            .data
            .update(player, DataKey::TimeInfo, |current| {
                let mut info = time_info_of(current)?;
                let mut report = Reconciliation::default();
                for timer in &info.timers {
                    if !scene.contains(player, &timer.building_id) {
                        report.missing.push(timer.building_id.clone());
                    } else if timer.is_active(now) {
                        if !scene.has_timer_marker(player, &timer.building_id) {
                            report.marked.push(timer.building_id.clone());
                        }
                    } else {
                        report.finished.push(timer.clone());
                    }
                }
                if report.finished.is_empty() {
                    return Ok::<_, TimerError>((None, report));
                }
                info.timers.retain(|t| !report.finished.contains(t));
                Ok((Some(info.into()), report))
            })
            .await?;
        let report = commit.output;

        for building_id in &report.missing {
            tracing::warn!(
                %player,
                %building_id,
                "MissingTimerTarget: building not in scene, skipping timer"
            );
        }
        for building_id in &report.marked {
            self.scene.set_timer_marker(player, building_id, true);
        }
        for timer in &report.finished {
            self.scene.set_timer_marker(player, &timer.building_id, false);
            self.outboxes.send(
                player,
                ServerEvent::TimerFinished {
                    timer: timer.clone(),
                },
            );
        }

        if !report.is_noop() {
            tracing::debug!(
                %player,
                finished = report.finished.len(),
                marked = report.marked.len(),
                missing = report.missing.len(),
                "Timers reconciled"
            );
        }
        commit.persisted?;
        Ok(report)
    }
}

fn time_info_of(value: &DataValue) -> Result<TimeInfo, DataError> {
    value
        .clone()
        .into_time_info()
        .ok_or(DataError::TypeMismatch(DataKey::TimeInfo))
}

#[cfg(test)]
mod tests {
    use dragonkeep_store::MemoryStore;
    use dragonkeep_types::BuildingCategory;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::PlayerDefaults;
    use crate::geometry::ScenePoint;
    use crate::outbox::Outbox;
    use crate::scene::LiveScene;

    const PLAYER: PlayerId = PlayerId(21);
    const T0: i64 = 1_700_000_000;

    struct Fixture {
        timers: TimerService<MemoryStore>,
        data: Arc<DataService<MemoryStore>>,
        store: MemoryStore,
        scene: Arc<LiveScene>,
        clock: ManualClock,
        rx: Outbox,
    }

    async fn fixture() -> Fixture {
        let outboxes = Arc::new(Outboxes::new());
        let rx = outboxes.register(PLAYER);
        let clock = ManualClock::at(T0);
        let scene = Arc::new(LiveScene::new());
        let store = MemoryStore::new();
        let data = Arc::new(DataService::new(
            store.clone(),
            Arc::clone(&outboxes),
            Arc::new(clock.clone()),
            PlayerDefaults::default(),
        ));
        let _ = data.setup(PLAYER).await;
        scene.instantiate(
            PLAYER,
            &hatchery(),
            BuildingCategory::Hatchery,
            ScenePoint::zeros(),
        );
        let timers = TimerService::new(
            Arc::clone(&data),
            Arc::clone(&scene) as Arc<dyn Scene>,
            outboxes,
            Arc::new(clock.clone()),
        );
        let mut fixture = Fixture {
            timers,
            data,
            store,
            scene,
            clock,
            rx,
        };
        while fixture.rx.try_recv().is_ok() {}
        fixture
    }

    fn hatchery() -> BuildingId {
        BuildingId::from("HATCHERY")
    }

    #[tokio::test]
    async fn timer_is_active_until_its_end() {
        let f = fixture().await;
        let added = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;
        assert!(added.is_ok());

        f.clock.advance(59);
        assert!(f.timers.is_timer_active(PLAYER, &hatchery()).unwrap_or(false));
        assert_eq!(f.timers.remaining(PLAYER, &hatchery()).ok().flatten(), Some(1));

        f.clock.advance(1);
        assert!(!f.timers.is_timer_active(PLAYER, &hatchery()).unwrap_or(true));
        assert_eq!(f.timers.remaining(PLAYER, &hatchery()).ok().flatten(), None);
    }

    #[tokio::test]
    async fn adding_marks_the_building() {
        let f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;
        assert!(f.scene.has_timer_marker(PLAYER, &hatchery()));
    }

    #[tokio::test]
    async fn duplicate_running_timer_is_rejected() {
        let f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;
        f.clock.advance(10);

        let second = f.timers.add_building_timer(PLAYER, hatchery(), 30).await;
        assert!(matches!(
            second,
            Err(TimerError::AlreadyActive { remaining: 50, .. })
        ));
        let info = f.data.time_info(PLAYER).unwrap_or_default();
        assert_eq!(info.timers.len(), 1);
    }

    #[tokio::test]
    async fn expired_timer_is_replaced() {
        let f = fixture().await;
        // Stored but never reconciled: the building left the scene first.
        let stale = TimeInfo {
            last_online: None,
            timers: vec![Timer {
                building_id: hatchery(),
                began_at: f.clock.now(),
                length: 5,
            }],
        };
        let _ = f.data.set(PLAYER, DataKey::TimeInfo, stale.into()).await;
        f.clock.advance(100);

        let added = f.timers.add_building_timer(PLAYER, hatchery(), 30).await;
        assert!(added.is_ok());
        let info = f.data.time_info(PLAYER).unwrap_or_default();
        assert_eq!(info.timers.len(), 1);
        assert_eq!(info.timers.first().map(|t| t.length), Some(30));
    }

    #[tokio::test]
    async fn unknown_building_is_rejected() {
        let f = fixture().await;
        let result = f
            .timers
            .add_building_timer(PLAYER, BuildingId::from("ghost"), 10)
            .await;
        assert!(matches!(result, Err(TimerError::UnknownBuilding(_))));
    }

    #[tokio::test]
    async fn reconcile_finishes_expired_timers_once() {
        let mut f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;
        while f.rx.try_recv().is_ok() {}

        f.clock.advance(60);
        let first = f.timers.reconcile(PLAYER).await.unwrap_or_default();
        assert_eq!(first.finished.len(), 1);
        assert!(!f.scene.has_timer_marker(PLAYER, &hatchery()));

        let mut finished = 0;
        while let Ok(event) = f.rx.try_recv() {
            if matches!(event, ServerEvent::TimerFinished { .. }) {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);

        let writes = f.scene.marker_writes(PLAYER);
        let second = f.timers.reconcile(PLAYER).await.unwrap_or_default();
        assert!(second.is_noop());
        assert_eq!(f.scene.marker_writes(PLAYER), writes);
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn timers_for_missing_buildings_are_skipped() {
        let f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;
        f.scene.clear(PLAYER);
        f.clock.advance(120);

        let report = f.timers.reconcile(PLAYER).await.unwrap_or_default();
        assert_eq!(report.missing, vec![hatchery()]);
        assert!(report.finished.is_empty());
        let info = f.data.time_info(PLAYER).unwrap_or_default();
        assert_eq!(info.timers.len(), 1);
    }

    #[tokio::test]
    async fn remove_timer_clears_marker() {
        let f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;

        assert!(f.timers.remove_timer(PLAYER, &hatchery()).await.unwrap_or(false));
        assert!(!f.scene.has_timer_marker(PLAYER, &hatchery()));
        assert!(!f.timers.remove_timer(PLAYER, &hatchery()).await.unwrap_or(true));
    }

    #[tokio::test]
    async fn failed_write_still_finishes_timers() {
        let mut f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;
        while f.rx.try_recv().is_ok() {}
        f.clock.advance(60);

        f.store.set_unavailable(true);
        let result = f.timers.reconcile(PLAYER).await;
        assert!(matches!(
            result,
            Err(TimerError::Data(DataError::Store(_)))
        ));
        assert!(!f.scene.has_timer_marker(PLAYER, &hatchery()));
        assert!(f.data.time_info(PLAYER).unwrap_or_default().timers.is_empty());
        let mut finished = 0;
        while let Ok(event) = f.rx.try_recv() {
            if matches!(event, ServerEvent::TimerFinished { .. }) {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);

        f.store.set_unavailable(false);
        let again = f.timers.reconcile(PLAYER).await.unwrap_or_default();
        assert!(again.is_noop());
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_write_still_clears_removed_marker() {
        let f = fixture().await;
        let _ = f.timers.add_building_timer(PLAYER, hatchery(), 60).await;

        f.store.set_unavailable(true);
        let removed = f.timers.remove_timer(PLAYER, &hatchery()).await;
        assert!(matches!(
            removed,
            Err(TimerError::Data(DataError::Store(_)))
        ));
        assert!(!f.scene.has_timer_marker(PLAYER, &hatchery()));
        assert!(!f.timers.is_timer_active(PLAYER, &hatchery()).unwrap_or(true));
    }
}
