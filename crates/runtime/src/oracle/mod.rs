//! Shared read-only content behind the core oracle traits.
//!
//! The tables come from `galaxy-content` and are bundled into an
//! [`OracleManager`] so workers can build [`galaxy_core::GameEnv`] values on
//! demand. Content never changes while games run; dynamic state lives in
//! each worker's [`galaxy_core::LiveGame`].
use std::path::Path;
use std::sync::Arc;

use galaxy_content::{ContentFactory, RulesTable, TileTable, builtin};
use galaxy_core::{Env, GameConfig, GameEnv, PcgRng};

use crate::api::{Result, RuntimeError};

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) rules: Arc<RulesTable>,
    pub(crate) tiles: Arc<TileTable>,
    pub(crate) rng: PcgRng,
}

impl OracleManager {
    pub fn new(rules: Arc<RulesTable>, tiles: Arc<TileTable>) -> Self {
        Self {
            rules,
            tiles,
            rng: PcgRng, // PcgRng is stateless
        }
    }

    /// Content compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let rules = builtin::rules().map_err(content_error)?;
        let tiles = builtin::tiles().map_err(content_error)?;
        Ok(Self::new(Arc::new(rules), Arc::new(tiles)))
    }

    /// Content read from a data directory, together with its engine config.
    pub fn from_data_dir(data_dir: &Path) -> Result<(Self, GameConfig)> {
        let factory = ContentFactory::new(data_dir);
        let rules = factory.load_rules().map_err(content_error)?;
        let tiles = factory.load_tiles().map_err(content_error)?;
        let config = factory.load_config().map_err(content_error)?;
        Ok((Self::new(Arc::new(rules), Arc::new(tiles)), config))
    }

    /// Converts oracle manager into GameEnv for galaxy-core
    pub fn as_game_env(&self) -> GameEnv<'_> {
        Env::with_all(self.rules.as_ref(), self.tiles.as_ref(), &self.rng).as_game_env()
    }

    pub fn rules(&self) -> &RulesTable {
        &self.rules
    }

    pub fn tiles(&self) -> &TileTable {
        &self.tiles
    }
}

/// Keeps the loader's context chain in the message.
fn content_error(err: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::Content(format!("{err:#}"))
}
