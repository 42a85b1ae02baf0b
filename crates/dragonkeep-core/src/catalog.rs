//! Static game data: dragon species and building types.

use std::collections::BTreeMap;

use dragonkeep_types::{BuildingCategory, DragonInfo};

use crate::config::{ConfigError, GameConfig};
use crate::format::to_seconds;

/// A building type as the server uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingEntry {
    /// Category of every instance.
    pub category: BuildingCategory,
    /// Construction time in seconds; zero means instant.
    pub build_seconds: u64,
}

/// Lookup tables for static game data, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    dragons: BTreeMap<String, DragonInfo>,
    buildings: BTreeMap<String, BuildingEntry>,
}

impl Catalog {
    /// Build the catalog from configuration, parsing build times.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalog`] for a build time that does not
    /// parse or a name listed twice.
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();

        for info in &config.dragons {
            if catalog.dragons.insert(info.name.clone(), info.clone()).is_some() {
                return Err(ConfigError::Catalog {
                    name: info.name.clone(),
                    reason: "dragon listed twice".to_owned(),
                });
            }
        }

        for spec in &config.buildings {
            let build_seconds =
                to_seconds(&spec.build_time).map_err(|e| ConfigError::Catalog {
                    name: spec.name.clone(),
                    reason: e.to_string(),
                })?;
            let entry = BuildingEntry {
                category: spec.category,
                build_seconds,
            };
            if catalog.buildings.insert(spec.name.clone(), entry).is_some() {
                return Err(ConfigError::Catalog {
                    name: spec.name.clone(),
                    reason: "building listed twice".to_owned(),
                });
            }
        }

        Ok(catalog)
    }

    /// Add or replace a dragon species.
    #[must_use]
    pub fn with_dragon(mut self, info: DragonInfo) -> Self {
        self.dragons.insert(info.name.clone(), info);
        self
    }

    /// Add or replace a building type.
    #[must_use]
    pub fn with_building(mut self, name: &str, entry: BuildingEntry) -> Self {
        self.buildings.insert(name.to_owned(), entry);
        self
    }

    /// Species metadata by name.
    pub fn dragon(&self, name: &str) -> Option<&DragonInfo> {
        self.dragons.get(name)
    }

    /// Building type by name.
    pub fn building(&self, name: &str) -> Option<&BuildingEntry> {
        self.buildings.get(name)
    }

    /// Number of dragon species.
    pub fn dragon_count(&self) -> usize {
        self.dragons.len()
    }

    /// Number of building types.
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}
