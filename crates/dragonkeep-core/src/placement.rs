//! Client-driven changes to the island: new buildings, moving dragons
//! between habitats, and hatchery eggs.
//!
//! The client renders these optimistically; the server persists them
//! through the [`DataService`] and echoes only what other views need
//! (egg additions and removals).

use std::sync::Arc;

use dragonkeep_store::PlayerStore;
use dragonkeep_types::{
    Building, BuildingCategory, BuildingId, BuildingKind, DataKey, DataValue, DragonId, Egg,
    EggId, PlayerId, ServerEvent, StorableVector3,
};

use crate::catalog::Catalog;
use crate::data_service::DataService;
use crate::error::{DataError, PlacementError};
use crate::geometry::to_usable_vector3;
use crate::outbox::Outboxes;
use crate::scene::Scene;
use crate::timer_service::TimerService;

/// Persists island edits made by the client.
pub struct PlacementService<S> {
    data: Arc<DataService<S>>,
    timers: Arc<TimerService<S>>,
    scene: Arc<dyn Scene>,
    outboxes: Arc<Outboxes>,
    catalog: Arc<Catalog>,
}

impl<S: PlayerStore> PlacementService<S> {
    /// Create a placement service.
    pub fn new(
        data: Arc<DataService<S>>,
        timers: Arc<TimerService<S>>,
        scene: Arc<dyn Scene>,
        outboxes: Arc<Outboxes>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            data,
            timers,
            scene,
            outboxes,
            catalog,
        }
    }

    /// Persist a newly placed building under a fresh id and start its
    /// construction timer when the catalog gives it a build time.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::CategoryMismatch`] if the catalog knows the
    /// building under another category, or a data/timer error if
    /// persisting fails.
    pub async fn place_building(
        &self,
        player: PlayerId,
        name: &str,
        category: BuildingCategory,
        position: StorableVector3,
    ) -> Result<Building, PlacementError> {
        let build_seconds = match self.catalog.building(name) {
            Some(entry) if entry.category != category => {
                return Err(PlacementError::CategoryMismatch {
                    name: name.to_owned(),
                    expected: entry.category,
                    requested: category,
                });
            }
            Some(entry) => entry.build_seconds,
            None => {
                tracing::debug!(%player, name, "Building not in catalog, placing without timer");
                0
            }
        };

        let building = Building {
            id: BuildingId::generate(),
            name: name.to_owned(),
            position,
            kind: BuildingKind::new(category),
        };
        let commit = self
            .data
            .update(player, DataKey::Buildings, |current| {
                let mut buildings = buildings_of(current)?;
                buildings.push(building.clone());
                Ok::<_, PlacementError>((Some(buildings.into()), ()))
            })
            .await?;
        self.scene.instantiate(
            player,
            &building.id,
            category,
            to_usable_vector3(position),
        );
        tracing::info!(%player, building_id = %building.id, name, %category, "Building placed");

        let timed = if build_seconds > 0 {
            self.timers
                .add_building_timer(player, building.id.clone(), build_seconds)
                .await
                .map(|_| ())
        } else {
            Ok(())
        };
        commit.persisted?;
        timed?;
        Ok(building)
    }

    /// Move an owned dragon into `habitat_id`, taking it out of whichever
    /// habitat held it before.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::MissingDragon`],
    /// [`PlacementError::MissingBuilding`] or [`PlacementError::NotAHabitat`]
    /// when the ids do not resolve, or a data error if persisting fails.
    pub async fn place_dragon(
        &self,
        player: PlayerId,
        dragon_id: &DragonId,
        habitat_id: &BuildingId,
    ) -> Result<(), PlacementError> {
        if !self.data.dragons(player)?.iter().any(|d| &d.id == dragon_id) {
            return Err(PlacementError::MissingDragon(dragon_id.clone()));
        }

        let commit = self
            .data
            .update(player, DataKey::Buildings, |current| {
                let mut buildings = buildings_of(current)?;
                let target = buildings
                    .iter()
                    .find(|b| &b.id == habitat_id)
                    .ok_or_else(|| PlacementError::MissingBuilding(habitat_id.clone()))?;
                if !target.is_habitat() {
                    return Err(PlacementError::NotAHabitat(habitat_id.clone()));
                }
                for building in &mut buildings {
                    if let BuildingKind::Habitat { dragon_ids, .. } = &mut building.kind {
                        dragon_ids.retain(|id| id != dragon_id);
                        if &building.id == habitat_id {
                            dragon_ids.push(dragon_id.clone());
                        }
                    }
                }
                Ok((Some(buildings.into()), ()))
            })
            .await?;
        tracing::info!(%player, %dragon_id, %habitat_id, "Dragon placed");
        commit.persisted?;
        Ok(())
    }

    /// Put `egg` into a hatchery and tell the client.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::MissingBuilding`],
    /// [`PlacementError::NotAHatchery`] or [`PlacementError::DuplicateEgg`],
    /// or a data error if persisting fails.
    pub async fn add_egg(
        &self,
        player: PlayerId,
        hatchery_id: &BuildingId,
        egg: Egg,
    ) -> Result<(), PlacementError> {
        let commit = self
            .data
            .update(player, DataKey::Buildings, |current| {
                let mut buildings = buildings_of(current)?;
                if buildings.iter().any(|b| {
                    matches!(&b.kind, BuildingKind::Hatchery { eggs, .. } if eggs.iter().any(|e| e.id == egg.id))
                }) {
                    return Err(PlacementError::DuplicateEgg(egg.id.clone()));
                }
                hatchery_eggs(&mut buildings, hatchery_id)?.push(egg.clone());
                Ok((Some(buildings.into()), ()))
            })
            .await?;

        tracing::info!(%player, %hatchery_id, egg_id = %egg.id, "Egg added to hatchery");
        self.outboxes.send(
            player,
            ServerEvent::AddEggToHatchery {
                hatchery_id: hatchery_id.clone(),
                egg,
                is_loaded: false,
            },
        );
        commit.persisted?;
        Ok(())
    }

    /// Take an egg out of a hatchery. Returns whether it was there.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::MissingBuilding`] or
    /// [`PlacementError::NotAHatchery`], or a data error if persisting
    /// fails.
    pub async fn remove_egg(
        &self,
        player: PlayerId,
        hatchery_id: &BuildingId,
        egg_id: &EggId,
    ) -> Result<bool, PlacementError> {
        let commit = self
            .data
            .update(player, DataKey::Buildings, |current| {
                let mut buildings = buildings_of(current)?;
                let eggs = hatchery_eggs(&mut buildings, hatchery_id)?;
                let before = eggs.len();
                eggs.retain(|e| &e.id != egg_id);
                if eggs.len() == before {
                    return Ok::<_, PlacementError>((None, false));
                }
                Ok((Some(buildings.into()), true))
            })
            .await?;
        if !commit.output {
            return Ok(false);
        }

        tracing::info!(%player, %hatchery_id, %egg_id, "Egg removed from hatchery");
        self.outboxes.send(
            player,
            ServerEvent::RemoveEggFromHatchery {
                egg_id: egg_id.clone(),
            },
        );
        commit.persisted?;
        Ok(true)
    }
}

fn buildings_of(value: &DataValue) -> Result<Vec<Building>, DataError> {
    value
        .clone()
        .into_buildings()
        .ok_or(DataError::TypeMismatch(DataKey::Buildings))
}

fn hatchery_eggs<'a>(
    buildings: &'a mut [Building],
    hatchery_id: &BuildingId,
) -> Result<&'a mut Vec<Egg>, PlacementError> {
    let building = buildings
        .iter_mut()
        .find(|b| &b.id == hatchery_id)
        .ok_or_else(|| PlacementError::MissingBuilding(hatchery_id.clone()))?;
    match &mut building.kind {
        BuildingKind::Hatchery { eggs, .. } => Ok(eggs),
        BuildingKind::Building { .. } | BuildingKind::Habitat { .. } => {
            Err(PlacementError::NotAHatchery(hatchery_id.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use dragonkeep_store::MemoryStore;
    use dragonkeep_types::{Dragon, Rarity};

    use super::*;
    use crate::catalog::BuildingEntry;
    use crate::clock::{Clock, ManualClock};
    use crate::config::PlayerDefaults;
    use crate::outbox::Outbox;
    use crate::scene::LiveScene;

    const PLAYER: PlayerId = PlayerId(31);

    struct Fixture {
        placement: PlacementService<MemoryStore>,
        data: Arc<DataService<MemoryStore>>,
        timers: Arc<TimerService<MemoryStore>>,
        scene: Arc<LiveScene>,
        rx: Outbox,
    }

    async fn fixture() -> Fixture {
        let outboxes = Arc::new(Outboxes::new());
        let rx = outboxes.register(PLAYER);
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::at(1_700_000_000));
        let scene = Arc::new(LiveScene::new());
        let catalog = Arc::new(
            Catalog::default()
                .with_building(
                    "Fire Habitat",
                    BuildingEntry {
                        category: BuildingCategory::Habitat,
                        build_seconds: 3600,
                    },
                )
                .with_building(
                    "Farm",
                    BuildingEntry {
                        category: BuildingCategory::Building,
                        build_seconds: 0,
                    },
                ),
        );
        let data = Arc::new(DataService::new(
            MemoryStore::new(),
            Arc::clone(&outboxes),
            Arc::clone(&clock),
            PlayerDefaults::default(),
        ));
        let _ = data.setup(PLAYER).await;
        let timers = Arc::new(TimerService::new(
            Arc::clone(&data),
            Arc::clone(&scene) as Arc<dyn Scene>,
            Arc::clone(&outboxes),
            clock,
        ));
        let placement = PlacementService::new(
            Arc::clone(&data),
            Arc::clone(&timers),
            Arc::clone(&scene) as Arc<dyn Scene>,
            outboxes,
            catalog,
        );
        let mut fixture = Fixture {
            placement,
            data,
            timers,
            scene,
            rx,
        };
        while fixture.rx.try_recv().is_ok() {}
        fixture
    }

    fn dragon(id: &str) -> Dragon {
        Dragon {
            id: DragonId::from(id),
            name: "Fire Dragon".to_owned(),
            xp: 0,
            empowerment: 0,
            combat_badge: 0,
            elements: vec!["fire".to_owned()],
        }
    }

    fn egg(id: &str) -> Egg {
        Egg {
            id: EggId::from(id),
            name: "Fire Egg".to_owned(),
            rarity: Rarity::Basic,
            hatched: false,
        }
    }

    #[tokio::test]
    async fn placed_building_is_persisted_and_timed() {
        let f = fixture().await;
        let placed = f
            .placement
            .place_building(
                PLAYER,
                "Fire Habitat",
                BuildingCategory::Habitat,
                StorableVector3::new(1.0, 0.0, 1.0),
            )
            .await;
        assert!(placed.is_ok(), "{placed:?}");
        let Ok(building) = placed else { return };

        assert!(f.data.find_building(PLAYER, &building.id).ok().flatten().is_some());
        assert!(f.scene.contains(PLAYER, &building.id));
        assert!(f.timers.is_timer_active(PLAYER, &building.id).unwrap_or(false));
        assert!(f.scene.has_timer_marker(PLAYER, &building.id));
    }

    #[tokio::test]
    async fn instant_buildings_get_no_timer() {
        let f = fixture().await;
        let placed = f
            .placement
            .place_building(PLAYER, "Farm", BuildingCategory::Building, StorableVector3::default())
            .await;
        assert!(placed.is_ok(), "{placed:?}");
        let Ok(building) = placed else { return };
        assert!(!f.timers.is_timer_active(PLAYER, &building.id).unwrap_or(true));
    }

    #[tokio::test]
    async fn category_must_match_catalog() {
        let f = fixture().await;
        let placed = f
            .placement
            .place_building(PLAYER, "Farm", BuildingCategory::Habitat, StorableVector3::default())
            .await;
        assert!(matches!(placed, Err(PlacementError::CategoryMismatch { .. })));
    }

    #[tokio::test]
    async fn dragons_move_between_habitats() {
        let f = fixture().await;
        let _ = f
            .data
            .set(PLAYER, DataKey::Dragons, vec![dragon("D1")].into())
            .await;
        let mut ids = Vec::new();
        for _ in 0..2 {
            let placed = f
                .placement
                .place_building(
                    PLAYER,
                    "Fire Habitat",
                    BuildingCategory::Habitat,
                    StorableVector3::default(),
                )
                .await;
            if let Ok(b) = placed {
                ids.push(b.id);
            }
        }
        assert_eq!(ids.len(), 2);
        let [first, second] = ids.as_slice() else {
            return;
        };

        let d1 = DragonId::from("D1");
        assert!(f.placement.place_dragon(PLAYER, &d1, first).await.is_ok());
        assert!(f.placement.place_dragon(PLAYER, &d1, second).await.is_ok());

        let housed = |id: &BuildingId| {
            let kind = f.data.find_building(PLAYER, id).ok().flatten().map(|b| b.kind);
            match kind {
                Some(BuildingKind::Habitat { dragon_ids, .. }) => dragon_ids,
                _ => Vec::new(),
            }
        };
        assert!(housed(first).is_empty());
        assert_eq!(housed(second), vec![d1]);
    }

    #[tokio::test]
    async fn dragons_only_go_into_owned_habitats() {
        let f = fixture().await;
        let _ = f
            .data
            .set(PLAYER, DataKey::Dragons, vec![dragon("D1")].into())
            .await;

        let hatchery = BuildingId::from("HATCHERY");
        assert!(matches!(
            f.placement.place_dragon(PLAYER, &DragonId::from("D1"), &hatchery).await,
            Err(PlacementError::NotAHabitat(_))
        ));
        assert!(matches!(
            f.placement.place_dragon(PLAYER, &DragonId::from("D9"), &hatchery).await,
            Err(PlacementError::MissingDragon(_))
        ));
    }

    #[tokio::test]
    async fn eggs_are_added_and_removed_with_events() {
        let mut f = fixture().await;
        let hatchery = BuildingId::from("HATCHERY");

        assert!(f.placement.add_egg(PLAYER, &hatchery, egg("E1")).await.is_ok());
        assert!(matches!(
            f.placement.add_egg(PLAYER, &hatchery, egg("E1")).await,
            Err(PlacementError::DuplicateEgg(_))
        ));

        let mut names = Vec::new();
        while let Ok(event) = f.rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(names, vec!["dataUpdate", "addEggToHatchery"]);

        let removed = f.placement.remove_egg(PLAYER, &hatchery, &EggId::from("E1")).await;
        assert!(removed.unwrap_or(false));
        let again = f.placement.remove_egg(PLAYER, &hatchery, &EggId::from("E1")).await;
        assert!(!again.unwrap_or(true));

        let mut last = None;
        while let Ok(event) = f.rx.try_recv() {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(ServerEvent::RemoveEggFromHatchery {
                egg_id: EggId::from("E1"),
            })
        );
    }
}
