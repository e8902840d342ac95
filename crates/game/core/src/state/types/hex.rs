use std::collections::BTreeMap;
use std::fmt;

use arrayvec::ArrayVec;

use super::{Colour, DiscoveryType, EdgeSet, MapPos, Resource};
use crate::config::GameConfig;
use crate::env::TileDef;

/// Identifier of a physical hex tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HexId(pub u32);

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ShipType {
    Interceptor,
    Cruiser,
    Dreadnought,
    Starbase,
    /// Neutral ship guarding explored hexes.
    Ancient,
    /// Galactic centre defence system.
    Gcds,
}

impl ShipType {
    pub const fn is_neutral(self) -> bool {
        matches!(self, ShipType::Ancient | ShipType::Gcds)
    }
}

/// Resource requirement of a population square.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SquareType {
    Money,
    Science,
    Materials,
    /// Accepts a cube of any resource.
    Any,
}

impl SquareType {
    /// Resource of a typed square; `None` for wildcard squares.
    pub const fn resource(self) -> Option<Resource> {
        match self {
            SquareType::Money => Some(Resource::Money),
            SquareType::Science => Some(Resource::Science),
            SquareType::Materials => Some(Resource::Materials),
            SquareType::Any => None,
        }
    }

    pub fn accepts(self, resource: Resource) -> bool {
        match self {
            SquareType::Money => resource == Resource::Money,
            SquareType::Science => resource == Resource::Science,
            SquareType::Materials => resource == Resource::Materials,
            SquareType::Any => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Square {
    pub kind: SquareType,
    pub advanced: bool,
    /// Resource track the cube on this square came from.
    pub occupant: Option<Resource>,
}

impl Square {
    pub const fn new(kind: SquareType, advanced: bool) -> Self {
        Self {
            kind,
            advanced,
            occupant: None,
        }
    }
}

/// Ships of one owner in a hex. `owner == None` marks neutral ships.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fleet {
    pub owner: Option<Colour>,
    pub ships: BTreeMap<ShipType, u32>,
}

impl Fleet {
    pub fn new(owner: Option<Colour>) -> Self {
        Self {
            owner,
            ships: BTreeMap::new(),
        }
    }

    pub fn count(&self, ship: ShipType) -> u32 {
        self.ships.get(&ship).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.ships.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Which fleets fight over a hex and whether ships or only population are at stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contest {
    pub defender: Option<Colour>,
    pub invader: Colour,
    pub ships: bool,
}

/// A placed hex tile.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hex {
    pub id: HexId,
    pub pos: MapPos,
    pub rotation: u8,
    /// Wormhole halves in world orientation (tile edges already rotated).
    pub wormholes: EdgeSet,
    pub squares: ArrayVec<Square, { GameConfig::MAX_SQUARES }>,
    pub owner: Option<Colour>,
    /// Fleets in arrival order.
    pub fleets: Vec<Fleet>,
    /// Face-down discovery tile waiting to be claimed.
    pub discovery: Option<DiscoveryType>,
    pub victory_points: u32,
    pub orbital: bool,
    pub monolith: bool,
}

impl Hex {
    /// Builds an unowned hex from a tile definition. Neutral ships listed by
    /// the tile are placed as the first fleet.
    pub fn from_tile(tile: &TileDef, pos: MapPos, rotation: u8) -> Self {
        let mut hex = Self {
            id: tile.id,
            pos,
            rotation,
            wormholes: tile.wormholes.rotated(rotation),
            squares: tile
                .squares
                .iter()
                .take(GameConfig::MAX_SQUARES)
                .map(|(kind, advanced)| Square::new(*kind, *advanced))
                .collect(),
            owner: None,
            fleets: Vec::new(),
            discovery: None,
            victory_points: tile.victory_points,
            orbital: false,
            monolith: false,
        };
        if tile.ancients > 0 {
            hex.add_ships(None, ShipType::Ancient, tile.ancients);
        }
        if tile.gcds {
            hex.add_ships(None, ShipType::Gcds, 1);
        }
        hex
    }

    pub fn fleet(&self, owner: Option<Colour>) -> Option<&Fleet> {
        self.fleets.iter().find(|fleet| fleet.owner == owner)
    }

    pub fn fleet_index(&self, owner: Option<Colour>) -> Option<usize> {
        self.fleets.iter().position(|fleet| fleet.owner == owner)
    }

    pub fn ship_count(&self, owner: Option<Colour>, ship: ShipType) -> u32 {
        self.fleet(owner).map_or(0, |fleet| fleet.count(ship))
    }

    pub fn has_ships(&self, owner: Option<Colour>) -> bool {
        self.fleet(owner).is_some_and(|fleet| !fleet.is_empty())
    }

    /// Adds ships, appending a new fleet when the owner has none here.
    pub fn add_ships(&mut self, owner: Option<Colour>, ship: ShipType, count: u32) {
        let index = match self.fleet_index(owner) {
            Some(index) => index,
            None => {
                self.fleets.push(Fleet::new(owner));
                self.fleets.len() - 1
            }
        };
        *self.fleets[index].ships.entry(ship).or_insert(0) += count;
    }

    /// Removes ships. Returns the fleet's former index when it became empty
    /// and was dropped, or `None` if it stays. Fails if there are not enough ships.
    pub fn remove_ships(
        &mut self,
        owner: Option<Colour>,
        ship: ShipType,
        count: u32,
    ) -> Result<Option<usize>, &'static str> {
        let index = self.fleet_index(owner).ok_or("no fleet for owner")?;
        let fleet = &mut self.fleets[index];
        let current = fleet.count(ship);
        if current < count {
            return Err("not enough ships");
        }
        if current == count {
            fleet.ships.remove(&ship);
        } else {
            fleet.ships.insert(ship, current - count);
        }
        if fleet.is_empty() {
            self.fleets.remove(index);
            Ok(Some(index))
        } else {
            Ok(None)
        }
    }

    /// Reinserts an empty fleet at `index`, undoing a fleet removal.
    pub fn restore_fleet(&mut self, owner: Option<Colour>, index: usize) {
        let index = index.min(self.fleets.len());
        self.fleets.insert(index, Fleet::new(owner));
    }

    /// Number of ships not owned by `colour` (neutral ships included).
    pub fn enemy_ship_count(&self, colour: Colour) -> u32 {
        self.fleets
            .iter()
            .filter(|fleet| fleet.owner != Some(colour))
            .map(Fleet::total)
            .sum()
    }

    /// Ships of `colour` can leave unless pinned by at least as many enemies.
    pub fn can_move_out(&self, colour: Colour) -> bool {
        let own = self.fleet(Some(colour)).map_or(0, Fleet::total);
        own > self.enemy_ship_count(colour)
    }

    pub fn can_move_through(&self, colour: Colour) -> bool {
        self.enemy_ship_count(colour) == 0
    }

    pub fn occupied_squares(&self) -> impl Iterator<Item = (usize, &Square)> {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, square)| square.occupant.is_some())
    }

    pub fn has_population(&self) -> bool {
        self.occupied_squares().next().is_some()
    }

    /// Who fights here, if anyone.
    ///
    /// With two or more fleets the first arrival defends against the latest
    /// arrival. A lone team fleet in another team's populated hex attacks the
    /// population only.
    pub fn contest(&self) -> Option<Contest> {
        let fleets: Vec<&Fleet> = self.fleets.iter().filter(|f| !f.is_empty()).collect();
        match fleets.as_slice() {
            [] => None,
            [only] => {
                let invader = only.owner?;
                let owner = self.owner?;
                (owner != invader && self.has_population()).then_some(Contest {
                    defender: Some(owner),
                    invader,
                    ships: false,
                })
            }
            [first, .., last] => Some(Contest {
                defender: first.owner,
                invader: last.owner?,
                ships: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_hex() -> Hex {
        let tile = TileDef {
            id: HexId(101),
            ring: None,
            wormholes: EdgeSet::all(),
            squares: vec![(SquareType::Money, false), (SquareType::Science, true)],
            discovery: false,
            ancients: 0,
            gcds: false,
            victory_points: 2,
        };
        Hex::from_tile(&tile, MapPos::new(0, -1), 0)
    }

    #[test]
    fn removing_last_ship_drops_fleet_and_reports_index() {
        let mut hex = empty_hex();
        hex.add_ships(Some(Colour::Red), ShipType::Interceptor, 1);
        hex.add_ships(Some(Colour::Blue), ShipType::Cruiser, 2);

        let removed = hex
            .remove_ships(Some(Colour::Red), ShipType::Interceptor, 1)
            .unwrap();
        assert_eq!(removed, Some(0));
        assert_eq!(hex.fleets.len(), 1);

        hex.restore_fleet(Some(Colour::Red), 0);
        hex.add_ships(Some(Colour::Red), ShipType::Interceptor, 1);
        assert_eq!(hex.fleets[0].owner, Some(Colour::Red));
    }

    #[test]
    fn contest_pairs_first_and_last_arrivals() {
        let mut hex = empty_hex();
        hex.add_ships(None, ShipType::Ancient, 1);
        hex.add_ships(Some(Colour::Red), ShipType::Interceptor, 1);
        let contest = hex.contest().unwrap();
        assert_eq!(contest.defender, None);
        assert_eq!(contest.invader, Colour::Red);
        assert!(contest.ships);
    }

    #[test]
    fn lone_fleet_attacks_enemy_population() {
        let mut hex = empty_hex();
        hex.owner = Some(Colour::Blue);
        hex.squares[0].occupant = Some(Resource::Money);
        hex.add_ships(Some(Colour::Red), ShipType::Cruiser, 1);
        let contest = hex.contest().unwrap();
        assert_eq!(contest.defender, Some(Colour::Blue));
        assert!(!contest.ships);

        hex.squares[0].occupant = None;
        assert_eq!(hex.contest(), None);
    }

    #[test]
    fn pinning_needs_more_ships_than_enemies() {
        let mut hex = empty_hex();
        hex.add_ships(None, ShipType::Ancient, 1);
        hex.add_ships(Some(Colour::Red), ShipType::Interceptor, 1);
        assert!(!hex.can_move_out(Colour::Red));
        hex.add_ships(Some(Colour::Red), ShipType::Cruiser, 1);
        assert!(hex.can_move_out(Colour::Red));
        assert!(!hex.can_move_through(Colour::Red));
    }
}
