//! Error types for the store layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the underlying
//! [`fred`] and [`serde_json`] errors. Store errors are fatal to the
//! operation that triggered them and are never retried here.

use dragonkeep_types::{DataKey, PlayerId};

/// Errors that can occur in the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value no longer fits the key it is stored under.
    #[error("Corrupt value for player {player} key {key}: {reason}")]
    Corrupt {
        /// Owner of the value.
        player: PlayerId,
        /// Key the value is stored under.
        key: DataKey,
        /// Why it could not be decoded.
        reason: String,
    },

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
