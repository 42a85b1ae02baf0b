//! The live scene: which buildings are instantiated for each player.
//!
//! Timer reconciliation only touches buildings that actually exist in the
//! scene, and marks the ones still under construction. The [`Scene`] trait
//! is what the services see; [`LiveScene`] is the in-process registry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dragonkeep_types::{BuildingCategory, BuildingId, PlayerId};

use crate::geometry::ScenePoint;

/// Scene operations the services depend on.
pub trait Scene: Send + Sync + 'static {
    /// Instantiate (or move) a building.
    fn instantiate(
        &self,
        player: PlayerId,
        id: &BuildingId,
        category: BuildingCategory,
        position: ScenePoint,
    );

    /// Whether the building is instantiated.
    fn contains(&self, player: PlayerId, id: &BuildingId) -> bool;

    /// Whether the building shows an in-progress timer marker.
    fn has_timer_marker(&self, player: PlayerId, id: &BuildingId) -> bool;

    /// Show or hide the in-progress timer marker. No-op for buildings that
    /// are not instantiated.
    fn set_timer_marker(&self, player: PlayerId, id: &BuildingId, shown: bool);

    /// Drop everything instantiated for `player`.
    fn clear(&self, player: PlayerId);
}

/// A building as held by [`LiveScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct LiveBuilding {
    /// Category it was instantiated as.
    pub category: BuildingCategory,
    /// Scene position.
    pub position: ScenePoint,
    /// Whether the in-progress marker is shown.
    pub timer_marker: bool,
}

#[derive(Debug, Default)]
struct Island {
    buildings: HashMap<BuildingId, LiveBuilding>,
    marker_writes: u64,
}

/// In-process scene registry.
#[derive(Debug, Default)]
pub struct LiveScene {
    islands: Mutex<HashMap<PlayerId, Island>>,
}

impl LiveScene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PlayerId, Island>> {
        self.islands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of one building.
    pub fn building(&self, player: PlayerId, id: &BuildingId) -> Option<LiveBuilding> {
        self.lock()
            .get(&player)
            .and_then(|island| island.buildings.get(id))
            .cloned()
    }

    /// Number of buildings instantiated for `player`.
    pub fn building_count(&self, player: PlayerId) -> usize {
        self.lock()
            .get(&player)
            .map_or(0, |island| island.buildings.len())
    }

    /// How many times a marker was actually shown or hidden for `player`.
    pub fn marker_writes(&self, player: PlayerId) -> u64 {
        self.lock()
            .get(&player)
            .map_or(0, |island| island.marker_writes)
    }
}

impl Scene for LiveScene {
    fn instantiate(
        &self,
        player: PlayerId,
        id: &BuildingId,
        category: BuildingCategory,
        position: ScenePoint,
    ) {
        let mut islands = self.lock();
        let island = islands.entry(player).or_default();
        let timer_marker = island
            .buildings
            .get(id)
            .is_some_and(|existing| existing.timer_marker);
        island.buildings.insert(
            id.clone(),
            LiveBuilding {
                category,
                position,
                timer_marker,
            },
        );
    }

    fn contains(&self, player: PlayerId, id: &BuildingId) -> bool {
        self.lock()
            .get(&player)
            .is_some_and(|island| island.buildings.contains_key(id))
    }

    fn has_timer_marker(&self, player: PlayerId, id: &BuildingId) -> bool {
        self.lock()
            .get(&player)
            .and_then(|island| island.buildings.get(id))
            .is_some_and(|b| b.timer_marker)
    }

    fn set_timer_marker(&self, player: PlayerId, id: &BuildingId, shown: bool) {
        let mut islands = self.lock();
        let Some(island) = islands.get_mut(&player) else {
            return;
        };
        let Some(building) = island.buildings.get_mut(id) else {
            return;
        };
        if building.timer_marker != shown {
            building.timer_marker = shown;
            island.marker_writes = island.marker_writes.saturating_add(1);
        }
    }

    fn clear(&self, player: PlayerId) {
        self.lock().remove(&player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: PlayerId = PlayerId(3);

    #[test]
    fn markers_only_apply_to_live_buildings() {
        let scene = LiveScene::new();
        let id = BuildingId::from("B1");

        scene.set_timer_marker(PLAYER, &id, true);
        assert!(!scene.has_timer_marker(PLAYER, &id));

        scene.instantiate(PLAYER, &id, BuildingCategory::Habitat, ScenePoint::zeros());
        assert!(scene.contains(PLAYER, &id));
        scene.set_timer_marker(PLAYER, &id, true);
        assert!(scene.has_timer_marker(PLAYER, &id));
        assert_eq!(scene.marker_writes(PLAYER), 1);

        // Setting the same state again changes nothing.
        scene.set_timer_marker(PLAYER, &id, true);
        assert_eq!(scene.marker_writes(PLAYER), 1);
    }

    #[test]
    fn reinstantiating_keeps_the_marker() {
        let scene = LiveScene::new();
        let id = BuildingId::from("B1");
        scene.instantiate(PLAYER, &id, BuildingCategory::Building, ScenePoint::zeros());
        scene.set_timer_marker(PLAYER, &id, true);

        let moved = ScenePoint::new(4.0, 0.0, 2.0);
        scene.instantiate(PLAYER, &id, BuildingCategory::Building, moved);

        let live = scene.building(PLAYER, &id);
        assert_eq!(live.as_ref().map(|b| b.position), Some(moved));
        assert!(live.is_some_and(|b| b.timer_marker));
    }

    #[test]
    fn clear_drops_one_player_only() {
        let scene = LiveScene::new();
        let id = BuildingId::from("B1");
        scene.instantiate(PLAYER, &id, BuildingCategory::Building, ScenePoint::zeros());
        scene.instantiate(PlayerId(4), &id, BuildingCategory::Building, ScenePoint::zeros());

        scene.clear(PLAYER);
        assert_eq!(scene.building_count(PLAYER), 0);
        assert_eq!(scene.building_count(PlayerId(4)), 1);
    }
}
