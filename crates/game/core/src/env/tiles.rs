use crate::state::{Colour, EdgeSet, HexId, HexRing, SquareType};

/// Oracle exposing the physical hex tiles of the game box.
pub trait TileOracle: Send + Sync {
    fn tile(&self, id: HexId) -> Option<TileDef>;

    /// Explorable tiles of a ring, in catalogue order (shuffled at game start).
    fn ring_tiles(&self, ring: HexRing) -> Vec<HexId>;

    /// The galactic centre tile.
    fn centre_tile(&self) -> HexId;

    /// Home sector for a team colour.
    fn home_tile(&self, colour: Colour) -> Option<HexId>;
}

/// Static description of a tile in its own (unrotated) orientation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileDef {
    pub id: HexId,
    /// Draw pile the tile belongs to; `None` for the centre and home sectors.
    pub ring: Option<HexRing>,
    pub wormholes: EdgeSet,
    /// Population squares as (type, advanced).
    pub squares: Vec<(SquareType, bool)>,
    /// Whether a discovery tile is placed when the hex is explored.
    pub discovery: bool,
    /// Neutral ancient ships guarding the hex.
    pub ancients: u32,
    /// Whether the galactic centre defence system sits here.
    pub gcds: bool,
    pub victory_points: u32,
}

impl TileDef {
    pub fn is_guarded(&self) -> bool {
        self.ancients > 0 || self.gcds
    }
}
