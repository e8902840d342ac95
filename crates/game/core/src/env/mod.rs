//! Traits describing read-only game content.
//!
//! Oracles expose race rules, ship statistics, hex tiles and randomness. The
//! [`Env`] aggregate bundles them so records and commands can reach
//! everything they need without hard coupling to concrete implementations.
mod error;
mod rng;
mod rules;
mod tiles;

pub use error::OracleError;
pub use rng::{PcgRng, RngOracle, compute_seed, shuffle};
pub use rules::{Buildable, RaceRules, RulesOracle, ShipBlueprint, TechCost};
pub use tiles::{TileDef, TileOracle};

use crate::state::{HexId, RaceType, ShipType};

/// Aggregates read-only oracles required by records and commands.
#[derive(Debug)]
pub struct Env<'a, U, T, R>
where
    U: RulesOracle + ?Sized,
    T: TileOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    rules: Option<&'a U>,
    tiles: Option<&'a T>,
    rng: Option<&'a R>,
}

// Manual impls: derives would require the (unsized) oracle types to be Clone.
impl<U, T, R> Clone for Env<'_, U, T, R>
where
    U: RulesOracle + ?Sized,
    T: TileOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<U, T, R> Copy for Env<'_, U, T, R>
where
    U: RulesOracle + ?Sized,
    T: TileOracle + ?Sized,
    R: RngOracle + ?Sized,
{
}

pub type GameEnv<'a> = Env<'a, dyn RulesOracle + 'a, dyn TileOracle + 'a, dyn RngOracle + 'a>;

impl<'a, U, T, R> Env<'a, U, T, R>
where
    U: RulesOracle + ?Sized,
    T: TileOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    pub fn new(rules: Option<&'a U>, tiles: Option<&'a T>, rng: Option<&'a R>) -> Self {
        Self { rules, tiles, rng }
    }

    pub fn with_all(rules: &'a U, tiles: &'a T, rng: &'a R) -> Self {
        Self::new(Some(rules), Some(tiles), Some(rng))
    }

    pub fn empty() -> Self {
        Self {
            rules: None,
            tiles: None,
            rng: None,
        }
    }

    /// Returns the RulesOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::RulesNotAvailable` if no rules oracle was provided.
    pub fn rules(&self) -> Result<&'a U, OracleError> {
        self.rules.ok_or(OracleError::RulesNotAvailable)
    }

    /// Returns the TileOracle, or an error if not available.
    pub fn tiles(&self) -> Result<&'a T, OracleError> {
        self.tiles.ok_or(OracleError::TilesNotAvailable)
    }

    /// Returns the RngOracle, or an error if not available.
    pub fn rng(&self) -> Result<&'a R, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }

    pub fn race_rules(&self, race: RaceType) -> Result<RaceRules, OracleError> {
        self.rules()?
            .race(race)
            .ok_or(OracleError::RaceNotFound(race))
    }

    pub fn blueprint(
        &self,
        race: Option<RaceType>,
        ship: ShipType,
    ) -> Result<ShipBlueprint, OracleError> {
        self.rules()?
            .blueprint(race, ship)
            .ok_or(OracleError::BlueprintNotFound { race, ship })
    }

    pub fn tile(&self, id: HexId) -> Result<TileDef, OracleError> {
        self.tiles()?.tile(id).ok_or(OracleError::TileNotFound(id))
    }
}

impl<'a, U, T, R> Env<'a, U, T, R>
where
    U: RulesOracle + 'a,
    T: TileOracle + 'a,
    R: RngOracle + 'a,
{
    /// Erases the concrete oracle types.
    pub fn as_game_env(&self) -> GameEnv<'a> {
        Env {
            rules: self.rules.map(|rules| rules as &'a dyn RulesOracle),
            tiles: self.tiles.map(|tiles| tiles as &'a dyn TileOracle),
            rng: self.rng.map(|rng| rng as &'a dyn RngOracle),
        }
    }
}
