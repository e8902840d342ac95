//! Content loaders for reading game data from files.
//!
//! Rules and tiles are RON, the engine configuration is TOML. Each loader
//! parses a private file format and converts it into the tables of
//! [`crate::tables`], rejecting content the engine could not run with.

pub mod builtin;
pub mod config;
pub mod factory;
pub mod rules;
pub mod tiles;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use rules::RulesLoader;
pub use tiles::TilesLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
