//! In-memory content tables served through the core oracles.
//!
//! Tables are plain data. [`crate::loaders`] fills them from RON files, and
//! the runtime shares them read-only between games.
use std::collections::BTreeMap;

use galaxy_core::{
    Buildable, Colour, DiscoveryType, HexId, HexRing, RaceRules, RaceType, RulesOracle,
    ShipBlueprint, ShipType, TechCost, TechType, TileDef, TileOracle,
};

/// Race rules and balance numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RulesTable {
    pub races: BTreeMap<RaceType, RaceRules>,
    /// Statistics shared by every race, including the neutral ships.
    pub ships: BTreeMap<ShipType, ShipBlueprint>,
    /// Race-specific replacements for entries of `ships`.
    pub race_ships: BTreeMap<(RaceType, ShipType), ShipBlueprint>,
    pub build_costs: BTreeMap<Buildable, u32>,
    pub race_build_costs: BTreeMap<(RaceType, Buildable), u32>,
    /// Research cost by technology tier.
    pub tech_tiers: Vec<TechCost>,
    /// Discount by number of technologies already owned in a class.
    pub research_discounts: Vec<u32>,
    /// Income by cubes placed off a population track.
    pub production: Vec<i32>,
    /// Upkeep by influence discs placed off the track.
    pub influence_upkeep: Vec<i32>,
    pub population_track: u32,
    pub discovery_tiles: Vec<DiscoveryType>,
    pub tech_tiles: Vec<TechType>,
}

/// Saturating lookup: counts past the end of a track use its last entry.
fn track<T: Copy + Default>(values: &[T], index: usize) -> T {
    values
        .get(index)
        .or_else(|| values.last())
        .copied()
        .unwrap_or_default()
}

impl RulesOracle for RulesTable {
    fn race(&self, race: RaceType) -> Option<RaceRules> {
        self.races.get(&race).cloned()
    }

    fn blueprint(&self, race: Option<RaceType>, ship: ShipType) -> Option<ShipBlueprint> {
        race.and_then(|race| self.race_ships.get(&(race, ship)))
            .or_else(|| self.ships.get(&ship))
            .copied()
    }

    fn build_cost(&self, race: RaceType, item: Buildable) -> Option<u32> {
        self.race_build_costs
            .get(&(race, item))
            .or_else(|| self.build_costs.get(&item))
            .copied()
    }

    fn tech_cost(&self, tech: TechType) -> Option<TechCost> {
        self.tech_tiers.get(usize::from(tech.tier())).copied()
    }

    fn research_discount(&self, owned: usize) -> u32 {
        track(&self.research_discounts, owned)
    }

    fn production(&self, placed: u32) -> i32 {
        track(&self.production, placed as usize)
    }

    fn influence_upkeep(&self, discs: u32) -> i32 {
        track(&self.influence_upkeep, discs as usize)
    }

    fn population_track(&self) -> u32 {
        self.population_track
    }

    fn discovery_tiles(&self) -> Vec<DiscoveryType> {
        self.discovery_tiles.clone()
    }

    fn tech_tiles(&self) -> Vec<TechType> {
        self.tech_tiles.clone()
    }
}

/// Every physical hex tile of the game box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileTable {
    tiles: BTreeMap<HexId, TileDef>,
    centre: HexId,
    homes: BTreeMap<Colour, HexId>,
}

impl TileTable {
    pub fn new(
        tiles: impl IntoIterator<Item = TileDef>,
        centre: HexId,
        homes: BTreeMap<Colour, HexId>,
    ) -> Self {
        Self {
            tiles: tiles.into_iter().map(|tile| (tile.id, tile)).collect(),
            centre,
            homes,
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDef> {
        self.tiles.values()
    }
}

impl TileOracle for TileTable {
    fn tile(&self, id: HexId) -> Option<TileDef> {
        self.tiles.get(&id).cloned()
    }

    /// Tiles of the ring in id order.
    fn ring_tiles(&self, ring: HexRing) -> Vec<HexId> {
        self.tiles
            .values()
            .filter(|tile| tile.ring == Some(ring))
            .map(|tile| tile.id)
            .collect()
    }

    fn centre_tile(&self) -> HexId {
        self.centre
    }

    fn home_tile(&self, colour: Colour) -> Option<HexId> {
        self.homes.get(&colour).copied()
    }
}
