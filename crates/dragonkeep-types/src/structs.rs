//! Entity structs persisted inside a player's record.
//!
//! Field names on the wire follow the game client's conventions
//! (`camelCase`, with `buildingID`/`dragonIDs` spelled as the client expects).
//! Timestamps travel as whole Unix seconds.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BuildingCategory, Rarity};
use crate::ids::{BuildingId, DragonId, EggId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A 3-component position in its storable (plain data) form.
///
/// The in-engine vector form lives next to the scene code; this type is
/// what gets persisted and sent over the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StorableVector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl StorableVector3 {
    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Dragons and eggs
// ---------------------------------------------------------------------------

/// A dragon owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Dragon {
    /// Unique id of this dragon.
    pub id: DragonId,
    /// Species name; keys into the static dragon catalog.
    pub name: String,
    /// Accumulated experience.
    #[serde(default)]
    #[ts(type = "number")]
    pub xp: u64,
    /// Empowerment tier.
    #[serde(default)]
    pub empowerment: u32,
    /// Combat badge tier.
    #[serde(default)]
    pub combat_badge: u32,
    /// Element affinities.
    #[serde(default)]
    pub elements: Vec<String>,
}

/// Static metadata for a dragon species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DragonInfo {
    /// Species name.
    pub name: String,
    /// Rarity tier.
    #[serde(default)]
    pub rarity: Rarity,
    /// Element affinities of the species.
    #[serde(default)]
    pub elements: Vec<String>,
    /// Gold produced per minute while housed in a habitat.
    #[serde(default)]
    pub gold_per_minute: f64,
    /// Food needed to feed one level of growth.
    #[serde(default)]
    pub food_cost: f64,
}

/// An egg, either in the inventory or incubating in a hatchery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Egg {
    /// Unique id of this egg.
    pub id: EggId,
    /// Egg species name.
    pub name: String,
    /// Rarity tier.
    #[serde(default)]
    pub rarity: Rarity,
    /// Whether the egg already hatched.
    #[serde(default)]
    pub hatched: bool,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// A building placed on a player's island.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Building {
    /// Unique id of the placed building.
    pub id: BuildingId,
    /// Asset name of the building.
    pub name: String,
    /// Position in storable form.
    pub position: StorableVector3,
    /// Category-specific fields, tagged by `category`.
    #[serde(flatten)]
    pub kind: BuildingKind,
}

/// Category-specific building fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "category", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BuildingKind {
    /// A plain building.
    Building {
        /// Upgrade level.
        #[serde(default = "default_level")]
        level: u32,
    },
    /// A habitat housing dragons.
    Habitat {
        /// Upgrade level.
        #[serde(default = "default_level")]
        level: u32,
        /// Ids of the dragons living here.
        #[serde(rename = "dragonIDs", default)]
        dragon_ids: Vec<DragonId>,
    },
    /// A hatchery incubating eggs.
    Hatchery {
        /// Upgrade level.
        #[serde(default = "default_level")]
        level: u32,
        /// Eggs currently in the hatchery.
        #[serde(default)]
        eggs: Vec<Egg>,
    },
}

const fn default_level() -> u32 {
    1
}

impl BuildingKind {
    /// Fresh, empty fields for a newly placed building of `category`.
    pub const fn new(category: BuildingCategory) -> Self {
        match category {
            BuildingCategory::Building => Self::Building { level: 1 },
            BuildingCategory::Habitat => Self::Habitat {
                level: 1,
                dragon_ids: Vec::new(),
            },
            BuildingCategory::Hatchery => Self::Hatchery {
                level: 1,
                eggs: Vec::new(),
            },
        }
    }
}

impl Building {
    /// Classify this building. Total and exclusive: every building has
    /// exactly one category.
    pub const fn category(&self) -> BuildingCategory {
        match self.kind {
            BuildingKind::Building { .. } => BuildingCategory::Building,
            BuildingKind::Habitat { .. } => BuildingCategory::Habitat,
            BuildingKind::Hatchery { .. } => BuildingCategory::Hatchery,
        }
    }

    /// Whether this building is a habitat.
    pub const fn is_habitat(&self) -> bool {
        matches!(self.kind, BuildingKind::Habitat { .. })
    }

    /// Whether this building is a hatchery.
    pub const fn is_hatchery(&self) -> bool {
        matches!(self.kind, BuildingKind::Hatchery { .. })
    }

    /// Upgrade level, regardless of category.
    pub const fn level(&self) -> u32 {
        match self.kind {
            BuildingKind::Building { level }
            | BuildingKind::Habitat { level, .. }
            | BuildingKind::Hatchery { level, .. } => level,
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A running building timer (construction, upgrade, hatching).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Timer {
    /// The building this timer belongs to.
    #[serde(rename = "buildingID")]
    pub building_id: BuildingId,
    /// When the timer started.
    #[serde(with = "chrono::serde::ts_seconds")]
    #[ts(type = "number")]
    pub began_at: DateTime<Utc>,
    /// Duration in seconds.
    #[ts(type = "number")]
    pub length: u64,
}

impl Timer {
    /// The instant the timer completes (`began_at + length`).
    ///
    /// Lengths too large to represent saturate at the maximum timestamp.
    pub fn ends_at(&self) -> DateTime<Utc> {
        i64::try_from(self.length)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|length| self.began_at.checked_add_signed(length))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the timer is still running at `now`. It stops being active
    /// exactly at `began_at + length`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.ends_at()
    }

    /// Whole seconds left at `now`, zero once finished.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let left = self.ends_at().signed_duration_since(now).num_seconds();
        u64::try_from(left).unwrap_or(0)
    }
}

/// Time bookkeeping for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TimeInfo {
    /// When the player last disconnected.
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional, type = "number")]
    pub last_online: Option<DateTime<Utc>>,
    /// Running timers, at most one per building.
    #[serde(default)]
    pub timers: Vec<Timer>,
}

impl TimeInfo {
    /// The timer for `building_id`, if any.
    pub fn timer(&self, building_id: &BuildingId) -> Option<&Timer> {
        self.timers.iter().find(|t| &t.building_id == building_id)
    }
}
