//! `Dragonfly` (Redis-compatible) player store.
//!
//! Each player's keys live in one hash so they can be loaded and erased
//! together. Writes are published on a change channel; every connected
//! server instance forwards those messages into its local change feed.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{namespace}:{player}` | Hash | One field per data key, JSON values |
//! | `{namespace}:changes` | Pub/Sub | JSON-encoded change envelopes |

use std::collections::{BTreeMap, HashMap};

use dragonkeep_types::{DataKey, DataValue, PlayerId};
use fred::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::StoreError;
use crate::store::{CHANGE_FEED_CAPACITY, PlayerStore, StoreChange, WriterId, decode_stored};

/// Change message published on `{namespace}:changes`.
#[derive(Debug, Serialize, Deserialize)]
struct ChangeEnvelope {
    player: PlayerId,
    key: DataKey,
    value: serde_json::Value,
    origin: WriterId,
}

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`] for commands and a second client held
/// in subscriber mode for the change channel.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
    namespace: String,
    changes: broadcast::Sender<StoreChange>,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL and start listening for
    /// changes under `namespace`.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if either connection fails.
    pub async fn connect(url: &str, namespace: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config.clone()).build()?;
        client.init().await?;

        let subscriber = Builder::from_config(config).build()?;
        subscriber.init().await?;

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        let store = Self {
            client,
            namespace: namespace.to_owned(),
            changes,
        };

        let channel = store.change_channel();
        subscriber.subscribe(channel.as_str()).await?;
        tokio::spawn(forward_changes(subscriber, store.changes.clone()));

        tracing::info!(namespace, "Connected to Dragonfly");
        Ok(store)
    }

    /// Hash key holding every value of `player`.
    fn player_key(&self, player: PlayerId) -> String {
        format!("{}:{player}", self.namespace)
    }

    /// Pub/sub channel carrying change envelopes.
    fn change_channel(&self) -> String {
        format!("{}:changes", self.namespace)
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), StoreError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }
}

/// Forward change messages from the subscriber connection into the local
/// broadcast feed until the connection closes.
async fn forward_changes(subscriber: Client, changes: broadcast::Sender<StoreChange>) {
    let mut messages = subscriber.message_rx();
    loop {
        match messages.recv().await {
            Ok(message) => {
                let Some(payload) = message.value.as_string() else {
                    tracing::warn!("Ignoring non-string change message");
                    continue;
                };
                match decode_envelope(&payload) {
                    Ok(change) => {
                        // send only fails when nobody is subscribed.
                        let _ = changes.send(change);
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring malformed change message"),
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Change feed lagged, messages dropped");
            }
            Err(RecvError::Closed) => {
                tracing::info!("Dragonfly change subscription closed");
                return;
            }
        }
    }
}

fn decode_envelope(payload: &str) -> Result<StoreChange, StoreError> {
    let envelope: ChangeEnvelope = serde_json::from_str(payload)?;
    let value = decode_stored(envelope.player, envelope.key, envelope.value)?;
    Ok(StoreChange {
        player: envelope.player,
        key: envelope.key,
        value,
        origin: envelope.origin,
    })
}

impl PlayerStore for DragonflyStore {
    async fn load(&self, player: PlayerId, key: DataKey) -> Result<Option<DataValue>, StoreError> {
        let raw: Option<String> = self
            .client
            .hget(self.player_key(player), key.as_str())
            .await?;
        raw.map(|s| {
            let json: serde_json::Value = serde_json::from_str(&s)?;
            decode_stored(player, key, json)
        })
        .transpose()
    }

    async fn load_all(&self, player: PlayerId) -> Result<BTreeMap<DataKey, DataValue>, StoreError> {
        let raw: HashMap<String, String> = self.client.hgetall(self.player_key(player)).await?;
        let mut values = BTreeMap::new();
        for (field, s) in raw {
            let Ok(key) = field.parse::<DataKey>() else {
                tracing::warn!(%player, field, "Skipping unrecognized stored field");
                continue;
            };
            let json: serde_json::Value = serde_json::from_str(&s)?;
            values.insert(key, decode_stored(player, key, json)?);
        }
        Ok(values)
    }

    async fn save(
        &self,
        player: PlayerId,
        key: DataKey,
        value: &DataValue,
        origin: WriterId,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_value(value)?;
        let encoded = serde_json::to_string(&json)?;
        let _: i64 = self
            .client
            .hset(self.player_key(player), (key.as_str(), encoded.as_str()))
            .await?;

        let envelope = serde_json::to_string(&ChangeEnvelope {
            player,
            key,
            value: json,
            origin,
        })?;
        let _: i64 = self
            .client
            .publish(self.change_channel(), envelope.as_str())
            .await?;
        Ok(())
    }

    async fn erase(&self, player: PlayerId) -> Result<(), StoreError> {
        let _: i64 = self.client.del(self.player_key(player)).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_into_typed_change() {
        let origin = WriterId::new();
        let payload = serde_json::json!({
            "player": 42,
            "key": "gold",
            "value": 900,
            "origin": origin,
        })
        .to_string();

        let change = decode_envelope(&payload);
        assert!(change.is_ok());
        if let Ok(change) = change {
            assert_eq!(change.player, PlayerId(42));
            assert_eq!(change.key, DataKey::Gold);
            assert_eq!(change.value, DataValue::Number(900.0));
            assert_eq!(change.origin, origin);
        }
    }

    #[test]
    fn envelope_with_wrong_shape_is_corrupt() {
        let payload = serde_json::json!({
            "player": 42,
            "key": "timeInfo",
            "value": 900,
            "origin": WriterId::new(),
        })
        .to_string();
        assert!(matches!(
            decode_envelope(&payload),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
