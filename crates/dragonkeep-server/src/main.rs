//! Dragonkeep game server entry point.
//!
//! Loads the YAML configuration, connects the configured player store,
//! assembles the game services and serves the client gateway.
//!
//! # Configuration
//!
//! The config file is read from `DRAGONKEEP_CONFIG`, falling back to
//! `dragonkeep.yaml` in the working directory. A missing default file
//! means built-in defaults. `RUST_LOG` overrides the configured log level
//! and `DRAGONFLY_URL` overrides the configured store URL.

use std::path::PathBuf;
use std::sync::Arc;

use dragonkeep_core::config::LoggingConfig;
use dragonkeep_core::{Catalog, Game, GameConfig, LiveScene, StoreBackend, SystemClock};
use dragonkeep_server::{AppState, ServerError, start_server};
use dragonkeep_store::{AnyStore, DragonflyStore, MemoryStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default config path, relative to the working directory.
const DEFAULT_CONFIG: &str = "dragonkeep.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the store cannot be
/// reached, or the server fails to bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    init_tracing(&config.logging);

    info!(
        host = config.server.host,
        port = config.server.port,
        backend = ?config.store.backend,
        "dragonkeep-server starting"
    );

    let catalog = Catalog::from_config(&config)?;
    info!(
        dragons = catalog.dragon_count(),
        buildings = catalog.building_count(),
        "catalog loaded"
    );

    let store = connect_store(&config).await?;
    let game = Arc::new(Game::new(
        store,
        &config,
        catalog,
        Arc::new(SystemClock),
        Arc::new(LiveScene::new()),
    ));
    let _listener = game.spawn_change_listener();

    let state = Arc::new(AppState::new(game));
    start_server(&config.server, state).await?;

    Ok(())
}

fn load_config() -> Result<GameConfig, ServerError> {
    if let Ok(path) = std::env::var("DRAGONKEEP_CONFIG") {
        return Ok(GameConfig::from_file(&PathBuf::from(path))?);
    }
    let path = PathBuf::from(DEFAULT_CONFIG);
    if path.exists() {
        Ok(GameConfig::from_file(&path)?)
    } else {
        Ok(GameConfig::parse("")?)
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect_store(config: &GameConfig) -> Result<AnyStore, ServerError> {
    Ok(match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory player store; data will not survive a restart");
            AnyStore::Memory(MemoryStore::new())
        }
        StoreBackend::Dragonfly => {
            let store =
                DragonflyStore::connect(&config.store.dragonfly_url, &config.store.namespace)
                    .await?;
            info!(namespace = config.store.namespace, "Connected to Dragonfly");
            AnyStore::Dragonfly(store)
        }
    })
}
