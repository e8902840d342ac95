//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories and the rules
//! engine so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use galaxy_core::{EngineError, GameError, GameId, PlayerId};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("game worker command channel closed")]
    CommandChannelClosed,

    #[error("game worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("game worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("server requires content oracles to be configured before building")]
    MissingOracles,

    #[error("failed to load content: {0}")]
    Content(String),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("player {0} is not in a game")]
    NotInGame(PlayerId),

    #[error("player {player} is already in {game}")]
    AlreadyInGame { player: PlayerId, game: GameId },

    #[error("unknown game {0}")]
    UnknownGame(GameId),

    #[error("{0} was halted after an internal error")]
    GamePoisoned(GameId),

    #[error("no repository configured for saving games")]
    NoRepository,
}

impl RuntimeError {
    /// True when the error only rejects the request and the game goes on.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Engine(err) => !err.is_fatal(),
            Self::UnknownPlayer(_)
            | Self::NotInGame(_)
            | Self::AlreadyInGame { .. }
            | Self::UnknownGame(_) => true,
            _ => false,
        }
    }

    /// Stable code for clients; engine errors keep their own codes.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Engine(err) => err.error_code(),
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::Repository(_) => "RUNTIME_REPOSITORY",
            Self::MissingOracles => "RUNTIME_MISSING_ORACLES",
            Self::Content(_) => "RUNTIME_CONTENT",
            Self::UnknownPlayer(_) => "RUNTIME_UNKNOWN_PLAYER",
            Self::NotInGame(_) => "RUNTIME_NOT_IN_GAME",
            Self::AlreadyInGame { .. } => "RUNTIME_ALREADY_IN_GAME",
            Self::UnknownGame(_) => "RUNTIME_UNKNOWN_GAME",
            Self::GamePoisoned(_) => "RUNTIME_GAME_POISONED",
            Self::NoRepository => "RUNTIME_NO_REPOSITORY",
        }
    }
}
