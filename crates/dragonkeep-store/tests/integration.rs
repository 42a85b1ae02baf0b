//! Integration tests for the `dragonkeep-store` Dragonfly adapter.
//!
//! These tests require a live Dragonfly (or Redis) instance.
//! Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p dragonkeep-store -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use dragonkeep_store::{DragonflyStore, PlayerStore, WriterId};
use dragonkeep_types::{DataKey, DataValue, PlayerId, TimeInfo};

/// Dragonfly connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

/// Namespace isolating test data from anything else on the instance.
const NAMESPACE: &str = "DKTEST";

async fn connect() -> DragonflyStore {
    DragonflyStore::connect(DRAGONFLY_URL, NAMESPACE)
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?")
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn save_load_and_erase_player_namespace() {
    let store = connect().await;
    let player = PlayerId(9_001);
    let origin = WriterId::new();

    store
        .save(player, DataKey::Gold, &DataValue::Number(250.0), origin)
        .await
        .unwrap();
    store
        .save(player, DataKey::TimeInfo, &DataValue::TimeInfo(TimeInfo::default()), origin)
        .await
        .unwrap();

    let gold = store.load(player, DataKey::Gold).await.unwrap();
    assert_eq!(gold, Some(DataValue::Number(250.0)));

    let all = store.load_all(player).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        all.get(&DataKey::TimeInfo),
        Some(&DataValue::TimeInfo(TimeInfo::default()))
    );

    store.erase(player).await.unwrap();
    assert!(store.load_all(player).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn writes_reach_other_instances_through_change_feed() {
    let writer = connect().await;
    let reader = connect().await;
    let mut feed = reader.subscribe();
    let origin = WriterId::new();
    let player = PlayerId(9_002);

    writer
        .save(player, DataKey::Diamonds, &DataValue::Number(12.0), origin)
        .await
        .unwrap();

    let change = tokio::time::timeout(Duration::from_secs(5), feed.recv())
        .await
        .expect("no change received")
        .unwrap();
    assert_eq!(change.player, player);
    assert_eq!(change.key, DataKey::Diamonds);
    assert_eq!(change.value, DataValue::Number(12.0));
    assert_eq!(change.origin, origin);

    writer.erase(player).await.unwrap();
}
