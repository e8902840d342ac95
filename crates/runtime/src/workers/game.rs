//! Game worker that owns one authoritative [`LiveGame`].
//!
//! Receives commands from a [`crate::GameHandle`], runs them through the
//! rules engine one at a time and publishes what changed on the
//! [`EventBus`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use galaxy_core::{
    Colour, EngineError, GameError, GameId, GameUpdate, LiveGame, Message, PlayerId, Review,
    UpdateSink,
};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, LifecycleEvent, UpdateEvent};
use crate::oracle::OracleManager;
use crate::repository::GameRepository;

/// Commands that can be sent to a game worker
pub enum Command {
    Join {
        player: PlayerId,
        reply: oneshot::Sender<Result<()>>,
    },
    Start {
        player: PlayerId,
        seed: u64,
        reply: oneshot::Sender<Result<()>>,
    },
    Process {
        player: PlayerId,
        message: Message,
        reply: oneshot::Sender<Result<Vec<GameUpdate>>>,
    },
    /// Clone of the whole game (read-only).
    Snapshot { reply: oneshot::Sender<LiveGame> },
    Review {
        reply: oneshot::Sender<Result<Review>>,
    },
    /// Replays the log and compares the result with the live state.
    VerifyReplay {
        reply: oneshot::Sender<Result<bool>>,
    },
    Digest {
        reply: oneshot::Sender<Result<String>>,
    },
    Save { reply: oneshot::Sender<Result<()>> },
    /// Stop accepting commands; queued ones are still answered.
    Shutdown,
}

/// Collects engine updates and publishes them as one bus event.
#[derive(Default)]
struct BusSink {
    pending: Vec<GameUpdate>,
}

impl UpdateSink for BusSink {
    fn publish(&mut self, updates: &[GameUpdate]) {
        self.pending.extend_from_slice(updates);
    }
}

impl BusSink {
    fn flush(self, bus: &EventBus, game: GameId, active: Vec<Colour>) {
        if self.pending.is_empty() {
            return;
        }
        bus.publish(Event::Updates(UpdateEvent {
            game,
            updates: self.pending,
            active,
        }));
    }
}

/// Background task that processes the messages of one game.
pub struct GameWorker {
    game: LiveGame,
    oracles: OracleManager,
    command_rx: mpsc::Receiver<Command>,
    bus: EventBus,
    repository: Option<Arc<dyn GameRepository>>,
    autosave: bool,
    /// Set after a model error; the game refuses further input.
    halted: bool,
}

impl GameWorker {
    pub fn new(
        game: LiveGame,
        oracles: OracleManager,
        command_rx: mpsc::Receiver<Command>,
        bus: EventBus,
        repository: Option<Arc<dyn GameRepository>>,
        autosave: bool,
    ) -> Self {
        Self {
            game,
            oracles,
            command_rx,
            bus,
            repository,
            autosave,
            halted: false,
        }
    }

    /// Main worker loop. Ends on shutdown or when every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            debug!(target: "runtime::worker", game = %self.game.id(), "Command channel closed");
                            break;
                        }
                    }
                }
                else => break,
            }
        }
        debug!(target: "runtime::worker", game = %self.game.id(), "Game worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Join { player, reply } => {
                let result = self.join(player);
                Self::reply(reply, result);
            }
            Command::Start {
                player,
                seed,
                reply,
            } => {
                let result = self.start(player, seed);
                Self::reply(reply, result);
            }
            Command::Process {
                player,
                message,
                reply,
            } => {
                let result = self.process(player, &message);
                Self::reply(reply, result);
            }
            Command::Snapshot { reply } => {
                Self::reply(reply, self.game.clone());
            }
            Command::Review { reply } => {
                let result: Result<Review> = self
                    .game
                    .review(self.oracles.as_game_env())
                    .map_err(|err| EngineError::from(err).into());
                Self::reply(reply, result);
            }
            Command::VerifyReplay { reply } => {
                let result: Result<bool> = self
                    .game
                    .replay(self.oracles.as_game_env())
                    .map(|replayed| &replayed == self.game.state())
                    .map_err(|err| EngineError::from(err).into());
                Self::reply(reply, result);
            }
            Command::Digest { reply } => {
                let result = self.digest();
                Self::reply(reply, result);
            }
            Command::Save { reply } => {
                let result = self.save();
                Self::reply(reply, result);
            }
            Command::Shutdown => {
                info!(target: "runtime::worker", game = %self.game.id(), "Shutdown command received");
                self.command_rx.close();
            }
        }
    }

    fn reply<T>(reply: oneshot::Sender<T>, value: T) {
        if reply.send(value).is_err() {
            debug!(target: "runtime::worker", "Reply channel closed before the result was sent");
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.halted {
            return Err(RuntimeError::GamePoisoned(self.game.id()));
        }
        Ok(())
    }

    fn join(&mut self, player: PlayerId) -> Result<()> {
        self.ensure_running()?;
        self.game
            .add_player(player)
            .map_err(|err| self.reject(player, err.into()))?;

        info!(target: "runtime::worker", game = %self.game.id(), player = %player, "Player joined");
        self.bus.publish(Event::Lifecycle(LifecycleEvent::Joined {
            game: self.game.id(),
            player,
        }));
        self.autosave();
        Ok(())
    }

    fn start(&mut self, player: PlayerId, seed: u64) -> Result<()> {
        self.ensure_running()?;
        let result = self.game.start(player, seed, self.oracles.as_game_env());
        if let Err(err) = result {
            return Err(self.reject(player, err));
        }

        let game = self.game.id();
        info!(target: "runtime::worker", game = %game, seed, "Game started");
        self.bus
            .publish(Event::Lifecycle(LifecycleEvent::Started { game }));
        self.bus
            .publish(Event::Lifecycle(LifecycleEvent::PhaseChanged {
                game,
                lifecycle: self.game.lifecycle(),
            }));
        self.autosave();
        Ok(())
    }

    fn process(&mut self, player: PlayerId, message: &Message) -> Result<Vec<GameUpdate>> {
        self.ensure_running()?;
        let before = self.game.lifecycle();
        let mut sink = BusSink::default();
        let result = self
            .game
            .process(player, message, self.oracles.as_game_env(), &mut sink);
        let updates = match result {
            Ok(updates) => updates,
            Err(err) => return Err(self.reject(player, err)),
        };

        let game = self.game.id();
        sink.flush(&self.bus, game, self.game.active_colours());
        debug!(
            target: "runtime::worker",
            game = %game,
            player = %player,
            message = ?message,
            updates = updates.len(),
            "Message processed"
        );

        let after = self.game.lifecycle();
        if after != before {
            info!(target: "runtime::worker", game = %game, lifecycle = %after, "Lifecycle changed");
            self.bus
                .publish(Event::Lifecycle(LifecycleEvent::PhaseChanged {
                    game,
                    lifecycle: after,
                }));
        }
        self.autosave();
        Ok(updates)
    }

    /// Logs a failed request. Model errors halt the game for good.
    fn reject(&mut self, player: PlayerId, err: EngineError) -> RuntimeError {
        let game = self.game.id();
        if err.is_fatal() {
            error!(
                target: "runtime::worker",
                game = %game,
                player = %player,
                code = err.error_code(),
                error = %err,
                "Game halted after a model error"
            );
            self.halted = true;
            self.bus.publish(Event::Lifecycle(LifecycleEvent::Halted {
                game,
                error: err.to_string(),
            }));
        } else {
            warn!(
                target: "runtime::worker",
                game = %game,
                player = %player,
                code = err.error_code(),
                error = %err,
                "Input rejected"
            );
        }
        err.into()
    }

    fn digest(&self) -> Result<String> {
        let digest = self.game.state().digest().map_err(|err| {
            RuntimeError::Repository(crate::repository::RepositoryError::Serialization(
                err.to_string(),
            ))
        })?;
        Ok(hex::encode(digest))
    }

    fn save(&self) -> Result<()> {
        let repository = self.repository.as_ref().ok_or(RuntimeError::NoRepository)?;
        repository.save(&self.game)?;
        self.bus.publish(Event::Lifecycle(LifecycleEvent::Saved {
            game: self.game.id(),
        }));
        Ok(())
    }

    fn autosave(&self) {
        if !self.autosave || self.repository.is_none() {
            return;
        }
        if let Err(err) = self.save() {
            error!(target: "runtime::worker", game = %self.game.id(), error = %err, "Autosave failed");
        }
    }
}
