//! Closed enumerations shared by the server and the game client.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Data keys
// ---------------------------------------------------------------------------

/// A recognized per-player data key.
///
/// The set is closed: wire input naming any other key is rejected by
/// [`DataKey::from_str`] before it reaches the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum DataKey {
    /// Soft currency.
    Gold,
    /// Premium currency.
    Diamonds,
    /// Dragon food.
    Food,
    /// Player level.
    Level,
    /// Experience toward the next level.
    Xp,
    /// Ordered list of item identifiers.
    Inventory,
    /// Owned dragons.
    Dragons,
    /// Placed buildings.
    Buildings,
    /// Last-online stamp and running building timers.
    TimeInfo,
}

impl DataKey {
    /// Every recognized key, in setup order.
    pub const ALL: [Self; 9] = [
        Self::Gold,
        Self::Diamonds,
        Self::Food,
        Self::Level,
        Self::Xp,
        Self::Inventory,
        Self::Dragons,
        Self::Buildings,
        Self::TimeInfo,
    ];

    /// The wire/storage name of this key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Diamonds => "diamonds",
            Self::Food => "food",
            Self::Level => "level",
            Self::Xp => "xp",
            Self::Inventory => "inventory",
            Self::Dragons => "dragons",
            Self::Buildings => "buildings",
            Self::TimeInfo => "timeInfo",
        }
    }

    /// Whether values stored under this key are numbers.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Gold | Self::Diamonds | Self::Food | Self::Level | Self::Xp
        )
    }
}

impl core::fmt::Display for DataKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a key name is not part of the recognized set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDataKey(pub String);

impl core::fmt::Display for UnknownDataKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unrecognized data key \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownDataKey {}

impl FromStr for DataKey {
    type Err = UnknownDataKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownDataKey(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// The category a stored building classifies into.
///
/// Every building is exactly one of these; see
/// [`Building::category`](crate::Building::category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BuildingCategory {
    /// A plain (possibly upgradable) building.
    Building,
    /// Houses live dragons that produce gold.
    Habitat,
    /// Incubates eggs.
    Hatchery,
}

impl BuildingCategory {
    /// The asset folder name the client renders this category from.
    pub const fn asset_folder(self) -> &'static str {
        match self {
            Self::Building | Self::Hatchery => "Buildings",
            Self::Habitat => "Habitats",
        }
    }
}

impl core::fmt::Display for BuildingCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::Habitat => "habitat",
            Self::Hatchery => "hatchery",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Dragons
// ---------------------------------------------------------------------------

/// Dragon rarity tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Rarity {
    /// Common dragons.
    #[default]
    Basic,
    /// Uncommon dragons.
    Rare,
    /// Epic dragons.
    Epic,
    /// Legendary dragons.
    Legendary,
    /// The rarest tier.
    Mythic,
}
