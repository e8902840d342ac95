//! Event payloads published by game workers.
use serde::{Deserialize, Serialize};

use galaxy_core::{Colour, GameId, GamePhase, GameUpdate, PlayerId};

/// Parts of one game that changed after a processed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub game: GameId,
    pub updates: Vec<GameUpdate>,
    /// Teams that have to act next.
    pub active: Vec<Colour>,
}

/// Lobby and lifecycle milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Created { game: GameId, owner: PlayerId },
    Joined { game: GameId, player: PlayerId },
    Started { game: GameId },
    PhaseChanged { game: GameId, lifecycle: GamePhase },
    Saved { game: GameId },
    Loaded { game: GameId },
    /// The worker stopped accepting input after a model error.
    Halted { game: GameId, error: String },
}

impl LifecycleEvent {
    pub fn game(&self) -> GameId {
        match self {
            LifecycleEvent::Created { game, .. }
            | LifecycleEvent::Joined { game, .. }
            | LifecycleEvent::Started { game }
            | LifecycleEvent::PhaseChanged { game, .. }
            | LifecycleEvent::Saved { game }
            | LifecycleEvent::Loaded { game }
            | LifecycleEvent::Halted { game, .. } => *game,
        }
    }
}
