//! Oracle access errors.
//!
//! Errors related to oracle availability and content lookups.

use crate::error::{ErrorSeverity, GameError};
use super::Buildable;
use crate::state::{Colour, HexId, RaceType, ShipType, TechType};

/// Errors that occur when accessing oracle data.
///
/// Oracle errors mean required content is unavailable. The engine cannot
/// proceed without rules and tiles, so every variant is at least internal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("RulesOracle not available")]
    RulesNotAvailable,

    #[error("TileOracle not available")]
    TilesNotAvailable,

    #[error("RngOracle not available")]
    RngNotAvailable,

    #[error("no rules for race {0}")]
    RaceNotFound(RaceType),

    #[error("no blueprint for {ship} (race {race:?})")]
    BlueprintNotFound {
        race: Option<RaceType>,
        ship: ShipType,
    },

    #[error("no build cost for {0}")]
    BuildCostNotFound(Buildable),

    #[error("no cost for technology {0}")]
    TechNotFound(TechType),

    #[error("tile {0} not found")]
    TileNotFound(HexId),

    #[error("no home tile for colour {0}")]
    HomeTileNotFound(Colour),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            // Missing oracles are fatal - engine cannot proceed
            RulesNotAvailable | TilesNotAvailable | RngNotAvailable => ErrorSeverity::Fatal,

            // Missing content is a configuration bug
            RaceNotFound(_)
            | BlueprintNotFound { .. }
            | BuildCostNotFound(_)
            | TechNotFound(_)
            | TileNotFound(_)
            | HomeTileNotFound(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            RulesNotAvailable => "ORACLE_RULES_NOT_AVAILABLE",
            TilesNotAvailable => "ORACLE_TILES_NOT_AVAILABLE",
            RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
            RaceNotFound(_) => "ORACLE_RACE_NOT_FOUND",
            BlueprintNotFound { .. } => "ORACLE_BLUEPRINT_NOT_FOUND",
            BuildCostNotFound(_) => "ORACLE_BUILD_COST_NOT_FOUND",
            TechNotFound(_) => "ORACLE_TECH_NOT_FOUND",
            TileNotFound(_) => "ORACLE_TILE_NOT_FOUND",
            HomeTileNotFound(_) => "ORACLE_HOME_TILE_NOT_FOUND",
        }
    }
}
