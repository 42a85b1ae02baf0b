//! Shared type definitions for the Dragonkeep game server.
//!
//! This crate is the single source of truth for everything persisted in a
//! player's record and everything sent between the server and the game
//! client. Types flow to the client as `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Player, building, dragon and egg identifiers
//! - [`enums`] -- Data keys, building categories, rarity
//! - [`structs`] -- Buildings, dragons, eggs, timers, time info, vectors
//! - [`data`] -- The [`DataValue`] union and the in-memory [`PlayerRecord`]
//! - [`protocol`] -- Wire frames exchanged with the client

pub mod data;
pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use data::{DataValue, PlayerRecord, ValueMismatch};
pub use enums::{BuildingCategory, DataKey, Rarity, UnknownDataKey};
pub use ids::{BuildingId, DragonId, EggId, PlayerId};
pub use protocol::{
    CallResponse, ClientCall, ClientMessage, ClientRequest, ServerEvent, ServerMessage,
    TimerRemaining,
};
pub use structs::{
    Building, BuildingKind, Dragon, DragonInfo, Egg, StorableVector3, TimeInfo, Timer,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the game client.

    #[test]
    fn export_bindings() {
        // ts-rs writes each exported type to `bindings/` relative to the
        // crate root when `export_all` runs.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::BuildingId::export_all();
        let _ = crate::ids::DragonId::export_all();
        let _ = crate::ids::EggId::export_all();

        // Enums
        let _ = crate::enums::DataKey::export_all();
        let _ = crate::enums::BuildingCategory::export_all();
        let _ = crate::enums::Rarity::export_all();

        // Structs
        let _ = crate::structs::StorableVector3::export_all();
        let _ = crate::structs::Dragon::export_all();
        let _ = crate::structs::DragonInfo::export_all();
        let _ = crate::structs::Egg::export_all();
        let _ = crate::structs::Building::export_all();
        let _ = crate::structs::BuildingKind::export_all();
        let _ = crate::structs::Timer::export_all();
        let _ = crate::structs::TimeInfo::export_all();
        let _ = crate::data::DataValue::export_all();

        // Protocol
        let _ = crate::protocol::ServerEvent::export_all();
        let _ = crate::protocol::ServerMessage::export_all();
        let _ = crate::protocol::CallResponse::export_all();
        let _ = crate::protocol::TimerRemaining::export_all();
        let _ = crate::protocol::ClientRequest::export_all();
        let _ = crate::protocol::ClientCall::export_all();
        let _ = crate::protocol::ClientMessage::export_all();
    }
}
