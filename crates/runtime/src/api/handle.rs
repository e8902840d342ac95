//! Cloneable façade for issuing commands to one game worker.
//!
//! [`GameHandle`] hides channel plumbing and offers async helpers for
//! sending player messages or inspecting the game.
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use galaxy_core::{GameId, GameUpdate, LiveGame, Message, PlayerId, Review};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with a running game
#[derive(Clone)]
pub struct GameHandle {
    id: GameId,
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl GameHandle {
    pub(crate) fn new(id: GameId, command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            id,
            command_tx,
            event_bus,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Take a seat in the lobby.
    pub async fn join(&self, player: PlayerId) -> Result<()> {
        self.request(|reply| Command::Join { player, reply }).await?
    }

    /// Close the lobby. Only the owner may start the game.
    pub async fn start(&self, player: PlayerId, seed: u64) -> Result<()> {
        self.request(|reply| Command::Start {
            player,
            seed,
            reply,
        })
        .await?
    }

    /// Send a player message; returns what changed.
    pub async fn process(&self, player: PlayerId, message: Message) -> Result<Vec<GameUpdate>> {
        self.request(|reply| Command::Process {
            player,
            message,
            reply,
        })
        .await?
    }

    /// Query the whole game (read-only snapshot)
    pub async fn snapshot(&self) -> Result<LiveGame> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// A review cursor positioned at the current state.
    pub async fn review(&self) -> Result<Review> {
        self.request(|reply| Command::Review { reply }).await?
    }

    /// Whether replaying the record log reproduces the live state.
    pub async fn verify_replay(&self) -> Result<bool> {
        self.request(|reply| Command::VerifyReplay { reply }).await?
    }

    /// Hex-encoded SHA-256 of the live state.
    pub async fn digest(&self) -> Result<String> {
        self.request(|reply| Command::Digest { reply }).await?
    }

    pub async fn save(&self) -> Result<()> {
        self.request(|reply| Command::Save { reply }).await?
    }

    /// Asks the worker to stop. Later requests on any clone fail with
    /// [`RuntimeError::CommandChannelClosed`].
    pub(crate) async fn shutdown(&self) {
        if self.command_tx.send(Command::Shutdown).await.is_err() {
            debug!(target: "runtime::server", game = %self.id, "Game worker already stopped");
        }
    }

    /// Subscribe to events from a specific topic
    ///
    /// Events of every game share the bus; filter on the game id.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }
}
