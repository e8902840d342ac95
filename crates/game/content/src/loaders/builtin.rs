//! Content shipped inside the binary.
//!
//! Lets servers and tests run without a data directory on disk.

use galaxy_core::GameConfig;

use crate::loaders::{ConfigLoader, LoadResult, RulesLoader, TilesLoader};
use crate::tables::{RulesTable, TileTable};

pub const CONFIG: &str = include_str!("../../data/config.toml");
pub const RULES: &str = include_str!("../../data/rules.ron");
pub const TILES: &str = include_str!("../../data/tiles.ron");

pub fn config() -> LoadResult<GameConfig> {
    ConfigLoader::parse(CONFIG)
}

pub fn rules() -> LoadResult<RulesTable> {
    RulesLoader::parse(RULES)
}

pub fn tiles() -> LoadResult<TileTable> {
    TilesLoader::parse(TILES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_engine_defaults() {
        assert_eq!(config().unwrap(), GameConfig::default());
    }
}
