//! Client/server wire protocol.
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! | Direction | `type` | Meaning |
//! |-----------|--------|---------|
//! | client -> server | `request` | one-way [`ClientRequest`] |
//! | client -> server | `call` | request/response [`ClientCall`] with an `id` |
//! | server -> client | `event` | one-way [`ServerEvent`] |
//! | server -> client | `reply` | [`CallResponse`] for the call with the same `id` |
//! | server -> client | `error` | a call failed or a frame was malformed |
//!
//! Data keys arrive as plain strings and are validated by the session
//! before any service sees them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::data::DataValue;
use crate::enums::{BuildingCategory, DataKey};
use crate::ids::{BuildingId, DragonId, EggId};
use crate::structs::{Building, DragonInfo, Egg, StorableVector3, Timer};

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// One-way notification pushed to the owning client.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// The authoritative value of `key` changed.
    DataUpdate {
        /// The key that changed.
        key: DataKey,
        /// Its new value.
        value: DataValue,
    },
    /// Every key of the player's record is initialized.
    DataLoaded,
    /// All persisted buildings were replayed.
    BuildingsLoaded {
        /// The replayed buildings.
        buildings: Vec<Building>,
    },
    /// Render a building without waiting for confirmation.
    PlaceBuilding {
        /// Asset name.
        name: String,
        /// Category the building classifies into.
        category: BuildingCategory,
        /// Where to place it.
        position: StorableVector3,
        /// Id of the placed building.
        id: BuildingId,
    },
    /// Render a dragon inside a habitat.
    #[serde(rename_all = "camelCase")]
    PlaceDragon {
        /// Static species metadata.
        dragon_info: DragonInfo,
        /// The habitat housing the dragon.
        #[serde(rename = "habitatID")]
        habitat_id: BuildingId,
        /// The placed dragon, when it is an owned one.
        #[serde(rename = "dragonID")]
        dragon_id: Option<DragonId>,
    },
    /// Show an egg in a hatchery.
    #[serde(rename_all = "camelCase")]
    AddEggToHatchery {
        /// The hatchery holding the egg.
        #[serde(rename = "hatcheryID")]
        hatchery_id: BuildingId,
        /// The egg.
        egg: Egg,
        /// `true` when replayed on load (no "new egg" celebration).
        is_loaded: bool,
    },
    /// Remove an egg from its hatchery.
    #[serde(rename_all = "camelCase")]
    RemoveEggFromHatchery {
        /// The removed egg.
        #[serde(rename = "eggID")]
        egg_id: EggId,
    },
    /// A building timer completed.
    TimerFinished {
        /// The timer that completed.
        timer: Timer,
    },
}

impl ServerEvent {
    /// The event name as sent on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DataUpdate { .. } => "dataUpdate",
            Self::DataLoaded => "dataLoaded",
            Self::BuildingsLoaded { .. } => "buildingsLoaded",
            Self::PlaceBuilding { .. } => "placeBuilding",
            Self::PlaceDragon { .. } => "placeDragon",
            Self::AddEggToHatchery { .. } => "addEggToHatchery",
            Self::RemoveEggFromHatchery { .. } => "removeEggFromHatchery",
            Self::TimerFinished { .. } => "timerFinished",
        }
    }
}

/// Remaining time on a building timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerRemaining {
    /// Whole seconds left.
    #[ts(type = "number")]
    pub seconds: u64,
    /// Human-readable form, e.g. `5m 10s`.
    pub display: String,
}

/// Successful result of a [`ClientCall`].
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "call", content = "value", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum CallResponse {
    /// Result of `getData`.
    GetData(DataValue),
    /// Result of `findBuilding`; `null` when no building has that id.
    FindBuilding(Option<Building>),
    /// Result of `isTimerActive`.
    IsTimerActive(bool),
    /// Result of `timerRemaining`; `null` when no timer is running.
    TimerRemaining(Option<TimerRemaining>),
}

/// A frame sent from the server.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// A one-way notification.
    Event(ServerEvent),
    /// The answer to a call.
    Reply {
        /// Id of the call being answered.
        #[ts(type = "number")]
        id: u64,
        /// The call's result.
        result: CallResponse,
    },
    /// A call failed or a frame could not be understood.
    Error {
        /// Id of the failed call, if the frame carried one.
        #[ts(type = "number | null")]
        id: Option<u64>,
        /// What went wrong.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// One-way request from the client.
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[serde(tag = "request", content = "payload", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ClientRequest {
    /// Load (or create) the player's record.
    InitializeData,
    /// Overwrite a key.
    SetData {
        /// Key name.
        key: String,
        /// New value; decoded against the key.
        value: serde_json::Value,
    },
    /// Add to a numeric key.
    IncrementData {
        /// Key name.
        key: String,
        /// Amount to add.
        #[serde(default = "default_amount")]
        amount: f64,
    },
    /// Persist a building the client just placed.
    PlaceBuilding {
        /// Asset name.
        name: String,
        /// Category of the building.
        category: BuildingCategory,
        /// Where it was placed.
        position: StorableVector3,
    },
    /// Move an owned dragon into a habitat.
    #[serde(rename_all = "camelCase")]
    PlaceDragon {
        /// The dragon to move.
        #[serde(rename = "dragonID")]
        dragon_id: DragonId,
        /// The destination habitat.
        #[serde(rename = "habitatID")]
        habitat_id: BuildingId,
    },
    /// Re-run timer reconciliation.
    UpdateTimers,
    /// Put an egg into a hatchery.
    #[serde(rename_all = "camelCase")]
    AddEggToHatchery {
        /// The hatchery.
        #[serde(rename = "hatcheryID")]
        hatchery_id: BuildingId,
        /// The egg.
        egg: Egg,
    },
    /// Take an egg out of a hatchery.
    #[serde(rename_all = "camelCase")]
    RemoveEggFromHatchery {
        /// The hatchery.
        #[serde(rename = "hatcheryID")]
        hatchery_id: BuildingId,
        /// The egg.
        #[serde(rename = "eggID")]
        egg_id: EggId,
    },
}

const fn default_amount() -> f64 {
    1.0
}

/// Request/response call from the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
#[serde(tag = "name", content = "args", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ClientCall {
    /// Read a key.
    GetData {
        /// Key name.
        key: String,
    },
    /// Look up a building by id.
    FindBuilding {
        /// Building id.
        id: BuildingId,
    },
    /// Whether a timer is running for a building.
    #[serde(rename_all = "camelCase")]
    IsTimerActive {
        /// Building id.
        #[serde(rename = "buildingID")]
        building_id: BuildingId,
    },
    /// Time left on a building's timer.
    #[serde(rename_all = "camelCase")]
    TimerRemaining {
        /// Building id.
        #[serde(rename = "buildingID")]
        building_id: BuildingId,
    },
}

/// A frame sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// A one-way request.
    Request(ClientRequest),
    /// A call expecting a reply.
    Call {
        /// Caller-chosen id echoed in the reply.
        #[ts(type = "number")]
        id: u64,
        /// The call itself.
        call: ClientCall,
    },
}
