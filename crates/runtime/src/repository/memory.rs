//! In-memory GameRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use galaxy_core::{GameId, LiveGame};
use serde::Deserialize;

use super::{GameRepository, RepositoryError, Result};

/// In-memory implementation of GameRepository.
///
/// Games are kept as JSON values so a load goes through the same
/// serialization path as the file repository.
#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<GameId, serde_json::Value>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameRepository for InMemoryGameRepository {
    fn save(&self, game: &LiveGame) -> Result<()> {
        let value = serde_json::to_value(game)?;
        let mut games = self
            .games
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        games.insert(game.id(), value);
        Ok(())
    }

    fn load(&self, id: GameId) -> Result<Option<LiveGame>> {
        let games = self
            .games
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        games
            .get(&id)
            .map(|value| LiveGame::deserialize(value).map_err(RepositoryError::from))
            .transpose()
    }

    fn exists(&self, id: GameId) -> bool {
        self.games
            .read()
            .map(|games| games.contains_key(&id))
            .unwrap_or(false)
    }

    fn delete(&self, id: GameId) -> Result<()> {
        let mut games = self
            .games
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        games.remove(&id);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<GameId>> {
        let games = self
            .games
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<GameId> = games.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
