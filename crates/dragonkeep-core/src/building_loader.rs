//! Replays a player's persisted island once their data is loaded.
//!
//! For every stored building the loader instantiates it in the scene and
//! tells the client to render it. Habitats also get their dragons placed
//! and then credit the gold those dragons produced while the player was
//! away; hatcheries get their unhatched eggs back. `buildingsLoaded` goes
//! out last.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dragonkeep_store::PlayerStore;
use dragonkeep_types::{
    Building, BuildingKind, DataKey, Dragon, DragonId, PlayerId, ServerEvent,
};

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::data_service::DataService;
use crate::error::DataError;
use crate::geometry::{to_storable_vector3, to_usable_vector3};
use crate::outbox::Outboxes;
use crate::scene::Scene;

/// Minutes between `last_online` and `now`; zero without a previous
/// session or if the clock went backwards.
pub fn minutes_offline(last_online: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    last_online
        .and_then(|last| now.signed_duration_since(last).to_std().ok())
        .map_or(0.0, |elapsed| elapsed.as_secs_f64() / 60.0)
}

/// Whole gold earned at `rate` gold per minute over `minutes`.
///
/// Fractions are dropped. Negative or non-finite inputs earn nothing.
pub fn offline_gold(rate: f64, minutes: f64) -> f64 {
    let gained = (rate * minutes).floor();
    if gained.is_finite() && gained > 0.0 {
        gained
    } else {
        0.0
    }
}

/// Totals from one replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replay {
    /// Buildings placed.
    pub buildings: usize,
    /// Dragons placed into habitats.
    pub dragons: usize,
    /// Eggs put back into hatcheries.
    pub eggs: usize,
    /// Gold credited for time offline.
    pub offline_gold: f64,
}

/// Rebuilds a player's island from their record.
pub struct BuildingLoader<S> {
    data: Arc<DataService<S>>,
    scene: Arc<dyn Scene>,
    outboxes: Arc<Outboxes>,
    clock: Arc<dyn Clock>,
    catalog: Arc<Catalog>,
}

impl<S: PlayerStore> BuildingLoader<S> {
    /// Create a loader.
    pub fn new(
        data: Arc<DataService<S>>,
        scene: Arc<dyn Scene>,
        outboxes: Arc<Outboxes>,
        clock: Arc<dyn Clock>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            data,
            scene,
            outboxes,
            clock,
            catalog,
        }
    }

    /// Replay every stored building of `player`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingKey`] if the player's data is not
    /// loaded. A failure to credit offline gold is logged and the replay
    /// carries on.
    pub async fn replay(&self, player: PlayerId) -> Result<Replay, DataError> {
        let buildings = self.data.buildings(player)?;
        let dragons = self.data.dragons(player)?;
        let last_online = self.data.time_info(player)?.last_online;
        let minutes = minutes_offline(last_online, self.clock.now());

        let mut replay = Replay::default();
        for building in &buildings {
            self.place_building(player, building);
            replay.buildings = replay.buildings.saturating_add(1);

            match &building.kind {
                BuildingKind::Habitat { dragon_ids, .. } => {
                    let (placed, rate) = self.place_dragons(player, building, dragon_ids, &dragons);
                    replay.dragons = replay.dragons.saturating_add(placed);

                    let gained = offline_gold(rate, minutes);
                    if gained > 0.0 {
                        match self.data.increment(player, DataKey::Gold, gained).await {
                            Ok(_) => {
                                replay.offline_gold += gained;
                                tracing::debug!(%player, habitat = %building.id, gained, "Offline gold credited");
                            }
                            // Credited in memory; the store catches up on the next gold write.
                            Err(DataError::Store(e)) => {
                                replay.offline_gold += gained;
                                tracing::error!(
                                    %player,
                                    habitat = %building.id,
                                    gained,
                                    error = %e,
                                    "Offline gold not persisted"
                                );
                            }
                            Err(e) => {
                                tracing::error!(
                                    %player,
                                    habitat = %building.id,
                                    gained,
                                    error = %e,
                                    "Offline gold not credited"
                                );
                            }
                        }
                    }
                }
                BuildingKind::Hatchery { eggs, .. } => {
                    for egg in eggs.iter().filter(|egg| !egg.hatched) {
                        self.outboxes.send(
                            player,
                            ServerEvent::AddEggToHatchery {
                                hatchery_id: building.id.clone(),
                                egg: egg.clone(),
                                is_loaded: true,
                            },
                        );
                        replay.eggs = replay.eggs.saturating_add(1);
                    }
                }
                BuildingKind::Building { .. } => {}
            }
        }

        self.outboxes
            .send(player, ServerEvent::BuildingsLoaded { buildings });
        tracing::info!(
            %player,
            buildings = replay.buildings,
            dragons = replay.dragons,
            eggs = replay.eggs,
            offline_gold = replay.offline_gold,
            minutes_offline = minutes,
            "Buildings loaded"
        );
        Ok(replay)
    }

    fn place_building(&self, player: PlayerId, building: &Building) {
        let position = to_usable_vector3(building.position);
        let category = building.category();
        self.scene
            .instantiate(player, &building.id, category, position);
        self.outboxes.send(
            player,
            ServerEvent::PlaceBuilding {
                name: building.name.clone(),
                category,
                position: to_storable_vector3(&position),
                id: building.id.clone(),
            },
        );
    }

    /// Place each housed dragon and return how many were placed and their
    /// combined gold rate.
    fn place_dragons(
        &self,
        player: PlayerId,
        habitat: &Building,
        dragon_ids: &[DragonId],
        owned: &[Dragon],
    ) -> (usize, f64) {
        let mut placed = 0_usize;
        let mut rate = 0.0;
        for dragon_id in dragon_ids {
            let Some(dragon) = owned.iter().find(|d| &d.id == dragon_id) else {
                tracing::warn!(%player, habitat = %habitat.id, %dragon_id, "Habitat lists a dragon the player does not own");
                continue;
            };
            let Some(info) = self.catalog.dragon(&dragon.name) else {
                tracing::warn!(%player, %dragon_id, species = %dragon.name, "Dragon species not in catalog");
                continue;
            };
            self.outboxes.send(
                player,
                ServerEvent::PlaceDragon {
                    dragon_info: info.clone(),
                    habitat_id: habitat.id.clone(),
                    dragon_id: Some(dragon_id.clone()),
                },
            );
            placed = placed.saturating_add(1);
            rate += info.gold_per_minute;
        }
        (placed, rate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }

    #[test]
    fn ten_minutes_at_five_per_minute_is_fifty() {
        let minutes = minutes_offline(Some(at(1_000)), at(1_600));
        assert!((minutes - 10.0).abs() < f64::EPSILON);
        assert!((offline_gold(5.0, minutes) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fractions_are_dropped() {
        let minutes = minutes_offline(Some(at(0)), at(90));
        assert!((offline_gold(3.0, minutes) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_previous_session_earns_nothing() {
        assert!(minutes_offline(None, at(1_000)).abs() < f64::EPSILON);
    }

    #[test]
    fn clock_going_backwards_earns_nothing() {
        let now = at(1_000);
        let later = now + TimeDelta::seconds(60);
        assert!(minutes_offline(Some(later), now).abs() < f64::EPSILON);
        assert!(offline_gold(-5.0, 10.0).abs() < f64::EPSILON);
        assert!(offline_gold(f64::NAN, 10.0).abs() < f64::EPSILON);
    }
}
