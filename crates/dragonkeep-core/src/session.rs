//! Wiring of the services and per-player dispatch of client frames.
//!
//! [`Game`] constructs every service once, sharing one store, clock,
//! scene and outbox registry. Each connected client gets a
//! [`PlayerSession`], which turns its requests and calls into service
//! operations. Frames of one session are handled one at a time, so all
//! mutations of a player's record run in the order the client sent them.

use std::sync::Arc;

use dragonkeep_store::PlayerStore;
use dragonkeep_types::{
    CallResponse, ClientCall, ClientMessage, ClientRequest, DataKey, DataValue, PlayerId,
    ServerMessage, TimerRemaining,
};
use tokio::task::JoinHandle;

use crate::building_loader::BuildingLoader;
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::data_service::DataService;
use crate::error::{DataError, SessionError};
use crate::format::to_remaining_time;
use crate::outbox::{Outbox, Outboxes};
use crate::placement::PlacementService;
use crate::scene::Scene;
use crate::timer_service::TimerService;

/// Every service, constructed once and shared by all sessions.
pub struct Game<S> {
    data: Arc<DataService<S>>,
    timers: Arc<TimerService<S>>,
    loader: BuildingLoader<S>,
    placement: PlacementService<S>,
    outboxes: Arc<Outboxes>,
    scene: Arc<dyn Scene>,
}

impl<S: PlayerStore> Game<S> {
    /// Build the services around `store`.
    pub fn new(
        store: S,
        config: &GameConfig,
        catalog: Catalog,
        clock: Arc<dyn Clock>,
        scene: Arc<dyn Scene>,
    ) -> Self {
        let outboxes = Arc::new(Outboxes::new());
        let catalog = Arc::new(catalog);
        let data = Arc::new(DataService::new(
            store,
            Arc::clone(&outboxes),
            Arc::clone(&clock),
            config.defaults.clone(),
        ));
        let timers = Arc::new(TimerService::new(
            Arc::clone(&data),
            Arc::clone(&scene),
            Arc::clone(&outboxes),
            Arc::clone(&clock),
        ));
        let loader = BuildingLoader::new(
            Arc::clone(&data),
            Arc::clone(&scene),
            Arc::clone(&outboxes),
            clock,
            Arc::clone(&catalog),
        );
        let placement = PlacementService::new(
            Arc::clone(&data),
            Arc::clone(&timers),
            Arc::clone(&scene),
            Arc::clone(&outboxes),
            catalog,
        );
        Self {
            data,
            timers,
            loader,
            placement,
            outboxes,
            scene,
        }
    }

    /// The data service.
    pub const fn data(&self) -> &Arc<DataService<S>> {
        &self.data
    }

    /// The timer service.
    pub const fn timers(&self) -> &Arc<TimerService<S>> {
        &self.timers
    }

    /// The outbox registry.
    pub const fn outboxes(&self) -> &Arc<Outboxes> {
        &self.outboxes
    }

    /// Start forwarding store changes made by other processes to
    /// connected clients.
    pub fn spawn_change_listener(&self) -> JoinHandle<()> {
        self.data.spawn_change_listener()
    }

    /// Open a session for `player`, returning it with the player's outbox.
    pub fn connect(self: &Arc<Self>, player: PlayerId) -> (PlayerSession<S>, Outbox) {
        let outbox = self.outboxes.register(player);
        tracing::info!(%player, "Player connected");
        let session = PlayerSession {
            game: Arc::clone(self),
            player,
        };
        (session, outbox)
    }

    /// Like [`Game::connect`], but returns `None` while another live
    /// session already serves `player`.
    pub fn try_connect(self: &Arc<Self>, player: PlayerId) -> Option<(PlayerSession<S>, Outbox)> {
        let Some(outbox) = self.outboxes.try_register(player) else {
            tracing::warn!(%player, "Player already connected, refusing second session");
            return None;
        };
        tracing::info!(%player, "Player connected");
        let session = PlayerSession {
            game: Arc::clone(self),
            player,
        };
        Some((session, outbox))
    }
}

/// One connected player.
pub struct PlayerSession<S> {
    game: Arc<Game<S>>,
    player: PlayerId,
}

impl<S: PlayerStore> PlayerSession<S> {
    /// The player this session serves.
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Load the player's data, replay their island and reconcile timers.
    ///
    /// Returns `false` if the data was already loaded.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn initialize(&self) -> Result<bool, SessionError> {
        let game = &self.game;
        if !game.data.setup(self.player).await? {
            return Ok(false);
        }
        game.loader.replay(self.player).await?;
        game.timers.reconcile(self.player).await?;
        Ok(true)
    }

    /// Handle one frame. Calls produce a reply (or an error reply);
    /// failed requests are logged and produce nothing.
    pub async fn handle_message(&self, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::Request(request) => {
                let name = request_name(&request);
                if let Err(e) = self.handle_request(request).await {
                    self.log_failure(name, &e);
                }
                None
            }
            ClientMessage::Call { id, call } => {
                let name = call_name(&call);
                Some(match self.handle_call(call) {
                    Ok(result) => ServerMessage::Reply { id, result },
                    Err(e) => {
                        self.log_failure(name, &e);
                        ServerMessage::Error {
                            id: Some(id),
                            message: e.to_string(),
                        }
                    }
                })
            }
        }
    }

    /// Apply a one-way request.
    ///
    /// # Errors
    ///
    /// Returns the failing service's error. Unknown keys and undecodable
    /// values are rejected before reaching the data service.
    pub async fn handle_request(&self, request: ClientRequest) -> Result<(), SessionError> {
        let game = &self.game;
        let player = self.player;
        match request {
            ClientRequest::InitializeData => {
                self.initialize().await?;
            }
            ClientRequest::SetData { key, value } => {
                let key: DataKey = key.parse().map_err(DataError::from)?;
                let value = DataValue::decode(key, value).map_err(|e| DataError::InvalidValue {
                    key,
                    reason: e.to_string(),
                })?;
                game.data.set(player, key, value).await?;
            }
            ClientRequest::IncrementData { key, amount } => {
                let key: DataKey = key.parse().map_err(DataError::from)?;
                game.data.increment(player, key, amount).await?;
            }
            ClientRequest::PlaceBuilding {
                name,
                category,
                position,
            } => {
                game.placement
                    .place_building(player, &name, category, position)
                    .await?;
            }
            ClientRequest::PlaceDragon {
                dragon_id,
                habitat_id,
            } => {
                game.placement
                    .place_dragon(player, &dragon_id, &habitat_id)
                    .await?;
            }
            ClientRequest::UpdateTimers => {
                game.timers.reconcile(player).await?;
            }
            ClientRequest::AddEggToHatchery { hatchery_id, egg } => {
                game.placement.add_egg(player, &hatchery_id, egg).await?;
            }
            ClientRequest::RemoveEggFromHatchery {
                hatchery_id,
                egg_id,
            } => {
                game.placement
                    .remove_egg(player, &hatchery_id, &egg_id)
                    .await?;
            }
        }
        Ok(())
    }

    /// Answer a request/response call.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Data`] for unknown or uninitialized keys.
    pub fn handle_call(&self, call: ClientCall) -> Result<CallResponse, SessionError> {
        let game = &self.game;
        let player = self.player;
        Ok(match call {
            ClientCall::GetData { key } => {
                let key: DataKey = key.parse().map_err(DataError::from)?;
                CallResponse::GetData(game.data.get(player, key)?)
            }
            ClientCall::FindBuilding { id } => {
                CallResponse::FindBuilding(game.data.find_building(player, &id)?)
            }
            ClientCall::IsTimerActive { building_id } => {
                CallResponse::IsTimerActive(game.timers.is_timer_active(player, &building_id)?)
            }
            ClientCall::TimerRemaining { building_id } => {
                let remaining = game.timers.remaining(player, &building_id)?;
                CallResponse::TimerRemaining(remaining.map(|seconds| TimerRemaining {
                    seconds,
                    display: to_remaining_time(seconds),
                }))
            }
        })
    }

    /// End the session: stamp `lastOnline`, release the record, clear the
    /// scene and close the outbox.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Data`] if the stamp cannot be persisted;
    /// everything is released regardless.
    pub async fn leave(&self) -> Result<(), SessionError> {
        let game = &self.game;
        let result = game.data.on_player_leave(self.player).await;
        game.scene.clear(self.player);
        game.outboxes.unregister(self.player);
        result.map_err(SessionError::from)
    }

    fn log_failure(&self, operation: &str, error: &SessionError) {
        if error.is_store_failure() {
            tracing::error!(player = %self.player, operation, error = %error, "Store failure");
        } else {
            tracing::warn!(player = %self.player, operation, error = %error, "Client operation rejected");
        }
    }
}

const fn request_name(request: &ClientRequest) -> &'static str {
    match request {
        ClientRequest::InitializeData => "initializeData",
        ClientRequest::SetData { .. } => "setData",
        ClientRequest::IncrementData { .. } => "incrementData",
        ClientRequest::PlaceBuilding { .. } => "placeBuilding",
        ClientRequest::PlaceDragon { .. } => "placeDragon",
        ClientRequest::UpdateTimers => "updateTimers",
        ClientRequest::AddEggToHatchery { .. } => "addEggToHatchery",
        ClientRequest::RemoveEggFromHatchery { .. } => "removeEggFromHatchery",
    }
}

const fn call_name(call: &ClientCall) -> &'static str {
    match call {
        ClientCall::GetData { .. } => "getData",
        ClientCall::FindBuilding { .. } => "findBuilding",
        ClientCall::IsTimerActive { .. } => "isTimerActive",
        ClientCall::TimerRemaining { .. } => "timerRemaining",
    }
}
