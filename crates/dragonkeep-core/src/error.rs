//! Error types for the game services.
//!
//! Store failures propagate unchanged inside [`DataError::Store`] and are
//! not retried. By the time one surfaces the in-memory record, the client
//! and the scene already reflect the change; the error only says the store
//! is behind until the key is next written.

use dragonkeep_store::StoreError;
use dragonkeep_types::{
    BuildingCategory, BuildingId, DataKey, DragonId, EggId, UnknownDataKey, ValueMismatch,
};

/// Errors from the data service.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The key has not been initialized for this player.
    #[error("data key {0} is not initialized")]
    MissingKey(DataKey),

    /// The key does not hold a number.
    #[error("data key {0} does not hold a number")]
    NotNumeric(DataKey),

    /// The value does not have the shape the key holds.
    #[error("value does not fit data key {0}")]
    TypeMismatch(DataKey),

    /// A client named a key that does not exist.
    #[error(transparent)]
    UnknownKey(#[from] UnknownDataKey),

    /// A client sent a value that could not be decoded for the key.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// The key being written.
        key: DataKey,
        /// Decoder message.
        reason: String,
    },

    /// A numeric key would hold a negative or non-finite amount.
    #[error("{key} cannot hold {value}")]
    OutOfRange {
        /// The numeric key.
        key: DataKey,
        /// The rejected amount.
        value: f64,
    },

    /// The persistent store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValueMismatch> for DataError {
    fn from(mismatch: ValueMismatch) -> Self {
        Self::TypeMismatch(mismatch.0)
    }
}

/// Errors from the timer service.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// Reading or writing `timeInfo` failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The player has no building with this id.
    #[error("no building {0} to time")]
    UnknownBuilding(BuildingId),

    /// A timer for the building is still running.
    #[error("building {building_id} already has a timer with {remaining}s left")]
    AlreadyActive {
        /// The building.
        building_id: BuildingId,
        /// Seconds left on the running timer.
        remaining: u64,
    },
}

/// Errors from building, dragon and egg placement.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    /// Reading or writing player data failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Starting a construction timer failed.
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// The client's category disagrees with the building catalog.
    #[error("{name} is a {expected}, not a {requested}")]
    CategoryMismatch {
        /// Building name.
        name: String,
        /// Category from the catalog.
        expected: BuildingCategory,
        /// Category the client sent.
        requested: BuildingCategory,
    },

    /// The player has no building with this id.
    #[error("no building {0}")]
    MissingBuilding(BuildingId),

    /// The building exists but is not a habitat.
    #[error("building {0} is not a habitat")]
    NotAHabitat(BuildingId),

    /// The building exists but is not a hatchery.
    #[error("building {0} is not a hatchery")]
    NotAHatchery(BuildingId),

    /// The player owns no dragon with this id.
    #[error("no dragon {0}")]
    MissingDragon(DragonId),

    /// The hatchery already holds an egg with this id.
    #[error("egg {0} is already in a hatchery")]
    DuplicateEgg(EggId),
}

/// Errors surfaced while serving one player's session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A data operation failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A timer operation failed.
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// A placement failed.
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

impl SessionError {
    /// Whether the persistent store failed underneath this error.
    pub const fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Data(DataError::Store(_))
                | Self::Timer(TimerError::Data(DataError::Store(_)))
                | Self::Placement(
                    PlacementError::Data(DataError::Store(_))
                        | PlacementError::Timer(TimerError::Data(DataError::Store(_)))
                )
        )
    }
}
