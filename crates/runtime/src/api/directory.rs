//! Registry of connected players and the game each one is playing.
use std::collections::BTreeMap;

use galaxy_core::{GameId, PlayerId};

use super::errors::{Result, RuntimeError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerEntry {
    pub name: String,
    /// Game that receives this player's messages.
    pub current_game: Option<GameId>,
}

/// Hands out player ids and routes each player to one game at a time.
#[derive(Debug, Default)]
pub struct PlayerDirectory {
    players: BTreeMap<PlayerId, PlayerEntry>,
    next_id: u32,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>) -> PlayerId {
        self.next_id += 1;
        let id = PlayerId(self.next_id);
        self.players.insert(
            id,
            PlayerEntry {
                name: name.into(),
                current_game: None,
            },
        );
        id
    }

    pub fn get(&self, player: PlayerId) -> Option<&PlayerEntry> {
        self.players.get(&player)
    }

    pub fn current_game(&self, player: PlayerId) -> Result<GameId> {
        self.entry(player)?
            .current_game
            .ok_or(RuntimeError::NotInGame(player))
    }

    /// Fails if the player is already routed to another game.
    pub fn enter_game(&mut self, player: PlayerId, game: GameId) -> Result<()> {
        let entry = self
            .players
            .get_mut(&player)
            .ok_or(RuntimeError::UnknownPlayer(player))?;
        match entry.current_game {
            Some(current) if current != game => Err(RuntimeError::AlreadyInGame {
                player,
                game: current,
            }),
            _ => {
                entry.current_game = Some(game);
                Ok(())
            }
        }
    }

    pub fn leave_game(&mut self, player: PlayerId) -> Result<Option<GameId>> {
        let entry = self
            .players
            .get_mut(&player)
            .ok_or(RuntimeError::UnknownPlayer(player))?;
        Ok(entry.current_game.take())
    }

    /// Makes sure the ids of restored players are never handed out again.
    pub fn restore(&mut self, player: PlayerId, name: impl Into<String>) {
        self.next_id = self.next_id.max(player.0);
        self.players.entry(player).or_insert_with(|| PlayerEntry {
            name: name.into(),
            current_game: None,
        });
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn entry(&self, player: PlayerId) -> Result<&PlayerEntry> {
        self.players
            .get(&player)
            .ok_or(RuntimeError::UnknownPlayer(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_each_player_to_one_game() {
        let mut directory = PlayerDirectory::new();
        let alice = directory.register("alice");
        let bob = directory.register("bob");
        assert_ne!(alice, bob);

        assert!(matches!(
            directory.current_game(alice),
            Err(RuntimeError::NotInGame(_))
        ));
        directory.enter_game(alice, GameId(1)).unwrap();
        directory.enter_game(alice, GameId(1)).unwrap();
        assert_eq!(directory.current_game(alice).unwrap(), GameId(1));
        assert!(matches!(
            directory.enter_game(alice, GameId(2)),
            Err(RuntimeError::AlreadyInGame { game: GameId(1), .. })
        ));

        assert_eq!(directory.leave_game(alice).unwrap(), Some(GameId(1)));
        directory.enter_game(alice, GameId(2)).unwrap();
        assert!(matches!(
            directory.current_game(PlayerId(99)),
            Err(RuntimeError::UnknownPlayer(PlayerId(99)))
        ));
    }

    #[test]
    fn restored_ids_are_not_reused() {
        let mut directory = PlayerDirectory::new();
        directory.restore(PlayerId(7), "carol");
        assert_eq!(directory.register("dave"), PlayerId(8));
        assert_eq!(directory.len(), 2);
    }
}
