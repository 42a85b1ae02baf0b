//! Per-player data values and the in-memory player record.
//!
//! A [`DataValue`] is the tagged union of everything that can be stored
//! under a [`DataKey`]. Wire and storage input is decoded against the key
//! it is addressed to ([`DataValue::decode`]), so a value can never be
//! stored under a key of the wrong shape.

use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::enums::DataKey;
use crate::ids::BuildingId;
use crate::structs::{Building, Dragon, TimeInfo};

/// A value stored under one of the recognized data keys.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum DataValue {
    /// `gold`, `diamonds`, `food`, `level`, `xp`.
    Number(f64),
    /// `inventory`: ordered item identifiers.
    Items(Vec<String>),
    /// `dragons`.
    Dragons(Vec<Dragon>),
    /// `buildings`.
    Buildings(Vec<Building>),
    /// `timeInfo`.
    TimeInfo(TimeInfo),
}

impl DataValue {
    /// Decode raw JSON addressed to `key` into the shape that key holds.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] produced when `json` does not have
    /// the shape required by `key`.
    pub fn decode(key: DataKey, json: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match key {
            DataKey::Gold | DataKey::Diamonds | DataKey::Food | DataKey::Level | DataKey::Xp => {
                Self::Number(serde_json::from_value(json)?)
            }
            DataKey::Inventory => Self::Items(serde_json::from_value(json)?),
            DataKey::Dragons => Self::Dragons(serde_json::from_value(json)?),
            DataKey::Buildings => Self::Buildings(serde_json::from_value(json)?),
            DataKey::TimeInfo => Self::TimeInfo(serde_json::from_value(json)?),
        })
    }

    /// Whether this value has the shape `key` holds.
    pub const fn fits(&self, key: DataKey) -> bool {
        matches!(
            (key, self),
            (
                DataKey::Gold | DataKey::Diamonds | DataKey::Food | DataKey::Level | DataKey::Xp,
                Self::Number(_)
            ) | (DataKey::Inventory, Self::Items(_))
                | (DataKey::Dragons, Self::Dragons(_))
                | (DataKey::Buildings, Self::Buildings(_))
                | (DataKey::TimeInfo, Self::TimeInfo(_))
        )
    }

    /// The numeric value, if this is a number.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Take the building list out of this value.
    pub fn into_buildings(self) -> Option<Vec<Building>> {
        match self {
            Self::Buildings(buildings) => Some(buildings),
            _ => None,
        }
    }

    /// Take the dragon list out of this value.
    pub fn into_dragons(self) -> Option<Vec<Dragon>> {
        match self {
            Self::Dragons(dragons) => Some(dragons),
            _ => None,
        }
    }

    /// Take the time info out of this value.
    pub fn into_time_info(self) -> Option<TimeInfo> {
        match self {
            Self::TimeInfo(info) => Some(info),
            _ => None,
        }
    }
}

impl From<f64> for DataValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<Building>> for DataValue {
    fn from(buildings: Vec<Building>) -> Self {
        Self::Buildings(buildings)
    }
}

impl From<Vec<Dragon>> for DataValue {
    fn from(dragons: Vec<Dragon>) -> Self {
        Self::Dragons(dragons)
    }
}

impl From<TimeInfo> for DataValue {
    fn from(info: TimeInfo) -> Self {
        Self::TimeInfo(info)
    }
}

/// Returned when a value is stored under a key of a different shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueMismatch(pub DataKey);

impl core::fmt::Display for ValueMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "value does not fit data key \"{}\"", self.0)
    }
}

impl std::error::Error for ValueMismatch {}

/// The authoritative in-memory state of one player.
///
/// Keys are absent until the data service initializes them during setup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRecord {
    values: BTreeMap<DataKey, DataValue>,
}

impl PlayerRecord {
    /// An empty record with no initialized keys.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// The value under `key`, if initialized.
    pub fn get(&self, key: DataKey) -> Option<&DataValue> {
        self.values.get(&key)
    }

    /// Store `value` under `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ValueMismatch`] if `value` does not have the shape `key`
    /// holds; the record is left unchanged.
    pub fn insert(
        &mut self,
        key: DataKey,
        value: DataValue,
    ) -> Result<Option<DataValue>, ValueMismatch> {
        if !value.fits(key) {
            return Err(ValueMismatch(key));
        }
        Ok(self.values.insert(key, value))
    }

    /// Whether `key` has been initialized.
    pub fn contains(&self, key: DataKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Whether every recognized key has been initialized.
    pub fn is_complete(&self) -> bool {
        DataKey::ALL.iter().all(|key| self.values.contains_key(key))
    }

    /// Placed buildings (empty if not yet initialized).
    pub fn buildings(&self) -> &[Building] {
        match self.values.get(&DataKey::Buildings) {
            Some(DataValue::Buildings(buildings)) => buildings,
            _ => &[],
        }
    }

    /// Look up a placed building by id.
    pub fn find_building(&self, id: &BuildingId) -> Option<&Building> {
        self.buildings().iter().find(|b| &b.id == id)
    }

    /// Owned dragons (empty if not yet initialized).
    pub fn dragons(&self) -> &[Dragon] {
        match self.values.get(&DataKey::Dragons) {
            Some(DataValue::Dragons(dragons)) => dragons,
            _ => &[],
        }
    }

    /// Time bookkeeping, if initialized.
    pub fn time_info(&self) -> Option<&TimeInfo> {
        match self.values.get(&DataKey::TimeInfo) {
            Some(DataValue::TimeInfo(info)) => Some(info),
            _ => None,
        }
    }
}
