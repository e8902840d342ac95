//! Repository contract for saving and loading games.

use galaxy_core::{GameId, LiveGame};

use super::error::Result;

/// Repository for game persistence.
///
/// A saved game carries everything needed to continue it: state, active
/// phase with any half-finished command chain, record log and the initial
/// snapshot used for replay.
pub trait GameRepository: Send + Sync {
    fn save(&self, game: &LiveGame) -> Result<()>;

    fn load(&self, id: GameId) -> Result<Option<LiveGame>>;

    fn exists(&self, id: GameId) -> bool;

    fn delete(&self, id: GameId) -> Result<()>;

    /// Ids of every saved game in ascending order.
    fn list_ids(&self) -> Result<Vec<GameId>> {
        Ok(vec![])
    }
}
