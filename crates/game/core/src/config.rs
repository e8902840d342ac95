/// Engine-level constants and tunable parameters.
///
/// Balance numbers (rates, costs, ship statistics) live behind
/// [`crate::env::RulesOracle`]; this struct only holds what the turn engine
/// itself needs to run a game to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Number of rounds played before the game finishes.
    pub max_rounds: u32,
    /// Maximum number of players that can join a game.
    pub max_teams: usize,
    /// Largest ring distance from the galactic centre that may be explored.
    pub map_radius: u32,
    /// Technologies drawn onto the board when the game starts, indexed by team count - 1.
    pub start_techs: [u32; Self::MAX_TEAMS],
    /// Technologies drawn at the end of each round, indexed by team count - 1.
    pub round_techs: [u32; Self::MAX_TEAMS],
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_TEAMS: usize = 6;
    /// Population squares a single hex can carry.
    pub const MAX_SQUARES: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_ROUNDS: u32 = 9;
    pub const DEFAULT_MAP_RADIUS: u32 = 4;
    pub const DEFAULT_START_TECHS: [u32; Self::MAX_TEAMS] = [12, 12, 14, 16, 18, 20];
    pub const DEFAULT_ROUND_TECHS: [u32; Self::MAX_TEAMS] = [4, 4, 6, 7, 8, 9];

    pub fn new() -> Self {
        Self {
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            max_teams: Self::MAX_TEAMS,
            map_radius: Self::DEFAULT_MAP_RADIUS,
            start_techs: Self::DEFAULT_START_TECHS,
            round_techs: Self::DEFAULT_ROUND_TECHS,
        }
    }

    pub fn with_max_rounds(max_rounds: u32) -> Self {
        Self {
            max_rounds,
            ..Self::new()
        }
    }

    /// Technologies to draw at game start for `teams` players.
    pub fn start_tech_count(&self, teams: usize) -> u32 {
        Self::by_team_count(&self.start_techs, teams)
    }

    /// Technologies to draw after each round for `teams` players.
    pub fn round_tech_count(&self, teams: usize) -> u32 {
        Self::by_team_count(&self.round_techs, teams)
    }

    fn by_team_count(table: &[u32; Self::MAX_TEAMS], teams: usize) -> u32 {
        let index = teams.clamp(1, Self::MAX_TEAMS) - 1;
        table[index]
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tech_counts_follow_team_count() {
        let config = GameConfig::default();
        assert_eq!(config.start_tech_count(1), 12);
        assert_eq!(config.start_tech_count(6), 20);
        assert_eq!(config.round_tech_count(3), 6);
        // Out-of-range counts clamp to the table.
        assert_eq!(config.round_tech_count(0), 4);
        assert_eq!(config.round_tech_count(9), 9);
    }
}
