//! Configuration loading and typed config structures for the game server.
//!
//! The canonical configuration lives in `dragonkeep.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file and applies
//! environment overrides.

use std::path::Path;

use dragonkeep_types::{
    Building, BuildingCategory, BuildingId, BuildingKind, DataKey, DataValue, DragonInfo,
    StorableVector3, TimeInfo,
};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A catalog entry could not be interpreted.
    #[error("invalid catalog entry {name}: {reason}")]
    Catalog {
        /// Name of the offending entry.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game server configuration.
///
/// Mirrors the structure of `dragonkeep.yaml`. Every field has a default,
/// so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistent store selection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Values given to a player on first join.
    #[serde(default)]
    pub defaults: PlayerDefaults,

    /// Static dragon species catalog.
    #[serde(default)]
    pub dragons: Vec<DragonInfo>,

    /// Static building catalog.
    #[serde(default)]
    pub buildings: Vec<BuildingSpec>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DRAGONFLY_URL` overrides `store.dragonfly_url` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml maps an empty document to unit, not to an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.store.apply_env_overrides();
        Ok(config)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which store implementation backs player data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store; data is lost on restart.
    #[default]
    Memory,
    /// `Dragonfly` (Redis-compatible) store.
    Dragonfly,
}

/// Persistent store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Prefix of every key this server writes.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl StoreConfig {
    /// Override the store URL with `DRAGONFLY_URL` when set.
    ///
    /// This allows Docker Compose (or any deployment) to set connection
    /// strings via env vars without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.dragonfly_url = val;
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dragonfly_url: default_dragonfly_url(),
            namespace: default_namespace(),
        }
    }
}

/// Values a player starts with when the store holds nothing for a key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerDefaults {
    /// Starting gold.
    #[serde(default = "default_gold")]
    pub gold: f64,
    /// Starting diamonds.
    #[serde(default = "default_diamonds")]
    pub diamonds: f64,
    /// Starting food.
    #[serde(default = "default_food")]
    pub food: f64,
    /// Starting level.
    #[serde(default = "default_level")]
    pub level: f64,
    /// Starting experience.
    #[serde(default)]
    pub xp: f64,
    /// Starting inventory items.
    #[serde(default)]
    pub inventory: Vec<String>,
    /// Buildings every new island starts with.
    #[serde(default = "default_starter_buildings")]
    pub buildings: Vec<Building>,
}

impl PlayerDefaults {
    /// The starting value for `key`.
    pub fn value_for(&self, key: DataKey) -> DataValue {
        match key {
            DataKey::Gold => DataValue::Number(self.gold),
            DataKey::Diamonds => DataValue::Number(self.diamonds),
            DataKey::Food => DataValue::Number(self.food),
            DataKey::Level => DataValue::Number(self.level),
            DataKey::Xp => DataValue::Number(self.xp),
            DataKey::Inventory => DataValue::Items(self.inventory.clone()),
            DataKey::Dragons => DataValue::Dragons(Vec::new()),
            DataKey::Buildings => DataValue::Buildings(self.buildings.clone()),
            DataKey::TimeInfo => DataValue::TimeInfo(TimeInfo::default()),
        }
    }
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            gold: default_gold(),
            diamonds: default_diamonds(),
            food: default_food(),
            level: default_level(),
            xp: 0.0,
            inventory: Vec::new(),
            buildings: default_starter_buildings(),
        }
    }
}

/// A building catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildingSpec {
    /// Asset name, as sent by the client when placing.
    pub name: String,
    /// Category every instance of this building has.
    pub category: BuildingCategory,
    /// Construction time, e.g. `"1h 30m"`. Empty means instant.
    #[serde(default)]
    pub build_time: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_namespace() -> String {
    "DATA".to_owned()
}

const fn default_gold() -> f64 {
    250.0
}

const fn default_diamonds() -> f64 {
    5.0
}

const fn default_food() -> f64 {
    20.0
}

const fn default_level() -> f64 {
    1.0
}

fn default_starter_buildings() -> Vec<Building> {
    vec![Building {
        id: BuildingId::from("HATCHERY"),
        name: "Hatchery".to_owned(),
        position: StorableVector3::default(),
        kind: BuildingKind::new(BuildingCategory::Hatchery),
    }]
}

fn default_log_level() -> String {
    "info".to_owned()
}
