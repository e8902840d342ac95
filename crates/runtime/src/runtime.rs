//! Game server orchestrator.
//!
//! The server owns the player directory, one worker task per game and the
//! shared content oracles. Player messages are routed to the game the player
//! is currently in.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use galaxy_core::env::compute_seed;
use galaxy_core::{GameConfig, GameId, GameUpdate, LiveGame, Message, PlayerId};

use crate::api::{GameHandle, PlayerDirectory, Result, RuntimeError};
use crate::events::{Event, EventBus, LifecycleEvent, Topic};
use crate::oracle::OracleManager;
use crate::repository::GameRepository;
use crate::workers::{Command, GameWorker};

/// Runtime configuration shared across the server and its workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Save a game after every accepted message (needs a repository).
    pub autosave: bool,
    /// Base for game seeds; taken from the clock when unset.
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            autosave: false,
            seed: None,
        }
    }
}

struct RunningGame {
    handle: GameHandle,
    worker: JoinHandle<()>,
}

/// Hosts every game of one server process.
///
/// Design: the server owns workers and routes players. [`GameHandle`]
/// provides a cloneable façade to one game for clients.
pub struct GameServer {
    config: RuntimeConfig,
    oracles: OracleManager,
    repository: Option<Arc<dyn GameRepository>>,
    directory: PlayerDirectory,
    games: BTreeMap<GameId, RunningGame>,
    event_bus: EventBus,
    next_game: u64,
}

impl GameServer {
    /// Create a new server builder
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }

    /// Handle to a running game.
    pub fn game(&self, id: GameId) -> Option<GameHandle> {
        self.games.get(&id).map(|game| game.handle.clone())
    }

    pub fn game_ids(&self) -> impl Iterator<Item = GameId> + '_ {
        self.games.keys().copied()
    }

    /// Subscribe to events of every game on one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn register_player(&mut self, name: impl Into<String>) -> PlayerId {
        let name = name.into();
        let player = self.directory.register(name.clone());
        debug!(target: "runtime::server", player = %player, name = %name, "Player registered");
        player
    }

    /// Opens a lobby owned by `owner` and routes the owner to it.
    pub fn create_game(&mut self, owner: PlayerId, name: impl Into<String>) -> Result<GameId> {
        self.ensure_free(owner)?;
        self.next_game += 1;
        let id = GameId(self.next_game);
        let game = LiveGame::new(id, name, owner, self.config.game_config.clone());
        self.spawn(game);
        self.directory.enter_game(owner, id)?;

        info!(target: "runtime::server", game = %id, owner = %owner, "Game created");
        self.event_bus
            .publish(Event::Lifecycle(LifecycleEvent::Created { game: id, owner }));
        Ok(id)
    }

    pub async fn join_game(&mut self, player: PlayerId, game: GameId) -> Result<()> {
        self.ensure_free(player)?;
        let handle = self.handle(game)?;
        handle.join(player).await?;
        self.directory.enter_game(player, game)
    }

    /// Starts the lobby the player is in.
    pub async fn start_game(&self, player: PlayerId) -> Result<()> {
        let handle = self.route(player)?;
        let seed = self.seed_for(handle.id());
        handle.start(player, seed).await
    }

    /// Routes a message to the sender's current game.
    pub async fn send(&self, player: PlayerId, message: Message) -> Result<Vec<GameUpdate>> {
        self.route(player)?.process(player, message).await
    }

    /// Stops routing the player to its game. The seat itself stays taken.
    pub fn leave_game(&mut self, player: PlayerId) -> Result<Option<GameId>> {
        self.directory.leave_game(player)
    }

    pub async fn save_game(&self, game: GameId) -> Result<()> {
        self.handle(game)?.save().await
    }

    /// Brings a saved game back and routes its players to it.
    pub fn load_game(&mut self, id: GameId) -> Result<()> {
        if self.games.contains_key(&id) {
            debug!(target: "runtime::server", game = %id, "Game already running");
            return Ok(());
        }
        let repository = self.repository.as_ref().ok_or(RuntimeError::NoRepository)?;
        let game = repository.load(id)?.ok_or(RuntimeError::UnknownGame(id))?;

        let players: Vec<PlayerId> = game.players().collect();
        self.next_game = self.next_game.max(id.0);
        self.spawn(game);
        for player in players {
            self.directory.restore(player, format!("player {player}"));
            if let Err(err) = self.directory.enter_game(player, id) {
                warn!(target: "runtime::server", game = %id, player = %player, error = %err, "Player not routed to loaded game");
            }
        }

        info!(target: "runtime::server", game = %id, "Game loaded");
        self.event_bus
            .publish(Event::Lifecycle(LifecycleEvent::Loaded { game: id }));
        Ok(())
    }

    /// Shutdown every game worker gracefully
    ///
    /// Handles given out by [`GameServer::game`] may outlive the server;
    /// their requests fail once the worker has stopped.
    pub async fn shutdown(self) -> Result<()> {
        for (id, game) in self.games {
            game.handle.shutdown().await;
            game.worker.await.map_err(RuntimeError::WorkerJoin)?;
            debug!(target: "runtime::server", game = %id, "Game worker joined");
        }
        Ok(())
    }

    fn spawn(&mut self, game: LiveGame) {
        let id = game.id();
        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = GameHandle::new(id, command_tx, self.event_bus.clone());
        let worker = GameWorker::new(
            game,
            self.oracles.clone(),
            command_rx,
            self.event_bus.clone(),
            self.repository.clone(),
            self.config.autosave,
        );
        let worker = tokio::spawn(async move {
            worker.run().await;
        });
        self.games.insert(id, RunningGame { handle, worker });
    }

    fn handle(&self, id: GameId) -> Result<GameHandle> {
        self.game(id).ok_or(RuntimeError::UnknownGame(id))
    }

    fn route(&self, player: PlayerId) -> Result<GameHandle> {
        let game = self.directory.current_game(player)?;
        self.handle(game)
    }

    fn ensure_free(&self, player: PlayerId) -> Result<()> {
        match self.directory.current_game(player) {
            Ok(game) => Err(RuntimeError::AlreadyInGame { player, game }),
            Err(RuntimeError::NotInGame(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn seed_for(&self, game: GameId) -> u64 {
        let base = self.config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default()
        });
        compute_seed(base, game.0, 0, 0)
    }
}

/// Builder for [`GameServer`] with flexible configuration.
pub struct GameServerBuilder {
    config: RuntimeConfig,
    oracles: Option<OracleManager>,
    repository: Option<Arc<dyn GameRepository>>,
}

impl GameServerBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            oracles: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required oracle manager
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Repository for save, load and autosave (optional)
    pub fn repository(mut self, repository: Arc<dyn GameRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn autosave(mut self, enable: bool) -> Self {
        self.config.autosave = enable;
        self
    }

    /// Build the server
    pub fn build(self) -> Result<GameServer> {
        let oracles = self.oracles.ok_or(RuntimeError::MissingOracles)?;
        if self.config.autosave && self.repository.is_none() {
            warn!(target: "runtime::server", "Autosave enabled without a repository");
        }

        Ok(GameServer {
            event_bus: EventBus::with_capacity(self.config.event_buffer_size),
            config: self.config,
            oracles,
            repository: self.repository,
            directory: PlayerDirectory::new(),
            games: BTreeMap::new(),
            next_game: 0,
        })
    }
}
