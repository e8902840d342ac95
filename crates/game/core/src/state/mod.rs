//! Authoritative game state representation.
//!
//! [`GameState`] owns the mutable world of one game. Outside of construction
//! it is mutated exclusively by records (see [`crate::record`]), which is what
//! makes undo and historical replay exact.
pub mod types;

use std::collections::BTreeMap;

pub use types::{
    Colour, Contest, CubeCounts, DiscoveryType, Edge, EdgeSet, Fleet, Hex, HexId, HexRing, Map,
    MapPos, PlayerId, RaceType, Resource, ShipType, Square, SquareType, Storage, TeamSlot,
    TeamState, TechClass, TechType,
};

use crate::battle::Battle;
use crate::error::ModelError;

/// Canonical snapshot of the deterministic game state.
///
/// Every collection is ordered so that two states built by the same records
/// serialize to the same bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    /// Base seed for every random outcome of the game. Set once in the lobby.
    pub seed: u64,
    /// Current round, 0 until the main game starts.
    pub round: u32,
    /// Seats in turn order.
    pub team_order: Vec<TeamSlot>,
    pub teams: BTreeMap<Colour, TeamState>,
    pub map: Map,
    /// Hex draw piles per ring; tiles are drawn from the back.
    pub hex_piles: BTreeMap<HexRing, Vec<HexId>>,
    pub hex_discards: BTreeMap<HexRing, Vec<HexId>>,
    pub discovery_bag: Vec<DiscoveryType>,
    pub tech_bag: Vec<TechType>,
    /// Technologies available for research and how many copies remain.
    pub tech_board: BTreeMap<TechType, u32>,
    /// Teams in the order they passed this round.
    pub pass_order: Vec<Colour>,
    pub battle: Option<Battle>,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn team(&self, colour: Colour) -> Result<&TeamState, ModelError> {
        self.teams
            .get(&colour)
            .ok_or(ModelError::TeamNotFound(colour))
    }

    pub fn team_mut(&mut self, colour: Colour) -> Result<&mut TeamState, ModelError> {
        self.teams
            .get_mut(&colour)
            .ok_or(ModelError::TeamNotFound(colour))
    }

    pub fn hex(&self, pos: MapPos) -> Result<&Hex, ModelError> {
        self.map.get(pos).ok_or(ModelError::HexNotFound(pos))
    }

    pub fn hex_mut(&mut self, pos: MapPos) -> Result<&mut Hex, ModelError> {
        self.map.get_mut(pos).ok_or(ModelError::HexNotFound(pos))
    }

    pub fn battle(&self) -> Result<&Battle, ModelError> {
        self.battle.as_ref().ok_or(ModelError::NoBattle)
    }

    pub fn battle_mut(&mut self) -> Result<&mut Battle, ModelError> {
        self.battle.as_mut().ok_or(ModelError::NoBattle)
    }

    /// Colour of the team in seat `index`, if chosen.
    pub fn slot_colour(&self, index: usize) -> Option<Colour> {
        self.team_order.get(index).and_then(|slot| slot.colour)
    }

    /// Chosen colours in turn order.
    pub fn colours(&self) -> impl Iterator<Item = Colour> + '_ {
        self.team_order.iter().filter_map(|slot| slot.colour)
    }

    pub fn slot_of(&self, player: PlayerId) -> Option<usize> {
        self.team_order.iter().position(|slot| slot.player == player)
    }

    pub fn all_passed(&self) -> bool {
        !self.teams.is_empty() && self.teams.values().all(|team| team.passed)
    }

    /// Contested positions in map order.
    pub fn contested_hexes(&self) -> Vec<MapPos> {
        self.map
            .hexes()
            .filter(|hex| hex.contest().is_some())
            .map(|hex| hex.pos)
            .collect()
    }

    /// SHA-256 digest of the canonical bincode encoding.
    ///
    /// Two states with equal digests are byte-for-byte identical.
    #[cfg(feature = "serde")]
    pub fn digest(&self) -> Result<[u8; 32], bincode::Error> {
        use sha2::{Digest, Sha256};

        let bytes = bincode::serialize(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hasher.finalize().into())
    }
}
