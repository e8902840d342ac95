//! Game configuration loader.

use std::path::Path;

use galaxy_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        anyhow::ensure!(config.max_rounds > 0, "max_rounds must be positive");
        anyhow::ensure!(
            (1..=GameConfig::MAX_TEAMS).contains(&config.max_teams),
            "max_teams must be between 1 and {}",
            GameConfig::MAX_TEAMS
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_field() {
        let config = ConfigLoader::parse(
            r#"
            max_rounds = 6
            max_teams = 4
            map_radius = 3
            start_techs = [10, 10, 12, 14, 16, 18]
            round_techs = [3, 3, 5, 6, 7, 8]
            "#,
        )
        .unwrap();
        assert_eq!(config.max_rounds, 6);
        assert_eq!(config.max_teams, 4);
        assert_eq!(config.start_tech_count(3), 12);
        assert_eq!(config.round_tech_count(6), 8);
    }

    #[test]
    fn rejects_zero_teams() {
        let err = ConfigLoader::parse(
            r#"
            max_rounds = 9
            max_teams = 0
            map_radius = 4
            start_techs = [12, 12, 14, 16, 18, 20]
            round_techs = [4, 4, 6, 7, 8, 9]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_teams"));
    }
}
