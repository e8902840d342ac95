//! Content factory for building oracles from data files.

use std::path::{Path, PathBuf};

use galaxy_core::GameConfig;

use crate::loaders::{ConfigLoader, LoadResult, RulesLoader, TilesLoader};
use crate::tables::{RulesTable, TileTable};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── rules.ron
/// └── tiles.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load race rules and balance tables from `rules.ron`.
    pub fn load_rules(&self) -> LoadResult<RulesTable> {
        let path = self.data_dir.join("rules.ron");
        RulesLoader::load(&path)
    }

    /// Load the tile catalogue from `tiles.ron`.
    pub fn load_tiles(&self) -> LoadResult<TileTable> {
        let path = self.data_dir.join("tiles.ron");
        TilesLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
