use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;

use super::{Colour, Hex};

/// Axial hex coordinate. `x` grows to the south-east, `y` to the south; the
/// implicit third axis is `-(x + y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapPos {
    pub x: i32,
    pub y: i32,
}

impl MapPos {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn z(self) -> i32 {
        -(self.x + self.y)
    }

    pub fn neighbour(self, edge: Edge) -> Self {
        let (dx, dy) = edge.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn neighbours(self) -> impl Iterator<Item = (Edge, MapPos)> {
        Edge::ALL.into_iter().map(move |edge| (edge, self.neighbour(edge)))
    }

    pub fn distance(self, other: MapPos) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        let dz = (self.z() - other.z()).unsigned_abs();
        dx.max(dy).max(dz)
    }

    /// Ring distance from the galactic centre.
    pub fn ring_distance(self) -> u32 {
        self.distance(Self::ORIGIN)
    }

    /// Returns the edge of `self` that touches `other`, if adjacent.
    pub fn edge_towards(self, other: MapPos) -> Option<Edge> {
        Edge::ALL
            .into_iter()
            .find(|edge| self.neighbour(*edge) == other)
    }

    /// Home sector positions for the given number of teams: corners of the
    /// middle ring, spread as evenly as possible.
    pub fn start_positions(teams: usize) -> Vec<MapPos> {
        let corners: &[usize] = match teams {
            0 => &[],
            1 => &[0],
            2 => &[0, 3],
            3 => &[0, 2, 4],
            4 => &[0, 1, 3, 4],
            5 => &[0, 1, 2, 3, 4],
            _ => &[0, 1, 2, 3, 4, 5],
        };
        corners
            .iter()
            .map(|&index| {
                let (dx, dy) = Edge::ALL[index].offset();
                MapPos::new(dx * 2, dy * 2)
            })
            .collect()
    }
}

impl fmt::Display for MapPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the six hex edges, clockwise from north.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Edge {
    N,
    NE,
    SE,
    S,
    SW,
    NW,
}

impl Edge {
    pub const ALL: [Edge; 6] = [Edge::N, Edge::NE, Edge::SE, Edge::S, Edge::SW, Edge::NW];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    const fn offset(self) -> (i32, i32) {
        match self {
            Edge::N => (0, -1),
            Edge::NE => (1, -1),
            Edge::SE => (1, 0),
            Edge::S => (0, 1),
            Edge::SW => (-1, 1),
            Edge::NW => (-1, 0),
        }
    }

    /// Rotates clockwise by `steps` (negative rotates anticlockwise).
    pub fn rotate(self, steps: i32) -> Self {
        let index = (self.index() as i32 + steps).rem_euclid(6);
        Self::from_index(index as usize)
    }

    pub fn opposite(self) -> Self {
        self.rotate(3)
    }

    pub const fn flag(self) -> EdgeSet {
        match self {
            Edge::N => EdgeSet::N,
            Edge::NE => EdgeSet::NE,
            Edge::SE => EdgeSet::SE,
            Edge::S => EdgeSet::S,
            Edge::SW => EdgeSet::SW,
            Edge::NW => EdgeSet::NW,
        }
    }
}

bitflags! {
    /// Set of hex edges, used for wormhole halves.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
    pub struct EdgeSet: u8 {
        const N  = 1 << 0;
        const NE = 1 << 1;
        const SE = 1 << 2;
        const S  = 1 << 3;
        const SW = 1 << 4;
        const NW = 1 << 5;
    }
}

impl EdgeSet {
    pub fn from_edges(edges: &[Edge]) -> Self {
        edges
            .iter()
            .fold(EdgeSet::empty(), |set, edge| set | edge.flag())
    }

    pub fn has(self, edge: Edge) -> bool {
        self.contains(edge.flag())
    }

    /// World-frame edges of a tile whose own edges are `self`, placed with
    /// `rotation` clockwise steps.
    pub fn rotated(self, rotation: u8) -> Self {
        Edge::ALL
            .into_iter()
            .filter(|edge| self.has(*edge))
            .fold(EdgeSet::empty(), |set, edge| {
                set | edge.rotate(i32::from(rotation)).flag()
            })
    }

    pub fn edges(self) -> impl Iterator<Item = Edge> {
        Edge::ALL.into_iter().filter(move |edge| self.has(*edge))
    }
}

/// Concentric distance band used to scope hex draw piles.
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
pub enum HexRing {
    Inner,
    Middle,
    Outer,
}

impl HexRing {
    /// Ring of an explorable position; the centre has none.
    pub fn of(pos: MapPos) -> Option<Self> {
        match pos.ring_distance() {
            0 => None,
            1 => Some(Self::Inner),
            2 => Some(Self::Middle),
            _ => Some(Self::Outer),
        }
    }
}

/// Placed hexes keyed by position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<Hex>", from = "Vec<Hex>")
)]
pub struct Map {
    hexes: BTreeMap<MapPos, Hex>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: MapPos) -> Option<&Hex> {
        self.hexes.get(&pos)
    }

    pub fn get_mut(&mut self, pos: MapPos) -> Option<&mut Hex> {
        self.hexes.get_mut(&pos)
    }

    pub fn contains(&self, pos: MapPos) -> bool {
        self.hexes.contains_key(&pos)
    }

    /// Inserts a hex at its own position, returning false if one is already there.
    pub fn insert(&mut self, hex: Hex) -> bool {
        if self.hexes.contains_key(&hex.pos) {
            return false;
        }
        self.hexes.insert(hex.pos, hex);
        true
    }

    pub fn remove(&mut self, pos: MapPos) -> Option<Hex> {
        self.hexes.remove(&pos)
    }

    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values()
    }

    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    /// Adjacent placed hexes a ship can travel to from `pos`.
    ///
    /// Travel needs a full wormhole (both halves); with `wormhole_gen` one half
    /// on either side is enough.
    pub fn connected_neighbours(&self, pos: MapPos, wormhole_gen: bool) -> Vec<MapPos> {
        let Some(hex) = self.get(pos) else {
            return Vec::new();
        };
        pos.neighbours()
            .filter_map(|(edge, next)| {
                let other = self.get(next)?;
                let here = hex.wormholes.has(edge);
                let there = other.wormholes.has(edge.opposite());
                let linked = if wormhole_gen {
                    here || there
                } else {
                    here && there
                };
                linked.then_some(next)
            })
            .collect()
    }

    /// Positions of hexes currently owned by `colour`.
    pub fn owned_by(&self, colour: Colour) -> impl Iterator<Item = &Hex> {
        self.hexes
            .values()
            .filter(move |hex| hex.owner == Some(colour))
    }
}

impl From<Vec<Hex>> for Map {
    fn from(hexes: Vec<Hex>) -> Self {
        Self {
            hexes: hexes.into_iter().map(|hex| (hex.pos, hex)).collect(),
        }
    }
}

impl From<Map> for Vec<Hex> {
    fn from(map: Map) -> Self {
        map.hexes.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_edges_face_each_other() {
        for edge in Edge::ALL {
            let pos = MapPos::new(1, -2);
            let next = pos.neighbour(edge);
            assert_eq!(next.neighbour(edge.opposite()), pos);
            assert_eq!(pos.distance(next), 1);
        }
    }

    #[test]
    fn rotation_moves_wormholes_clockwise() {
        let set = EdgeSet::from_edges(&[Edge::N, Edge::SE]);
        assert_eq!(set.rotated(1), EdgeSet::from_edges(&[Edge::NE, Edge::S]));
        assert_eq!(set.rotated(6), set);
        assert_eq!(Edge::N.rotate(-1), Edge::NW);
    }

    #[test]
    fn rings_follow_distance() {
        assert_eq!(HexRing::of(MapPos::ORIGIN), None);
        assert_eq!(HexRing::of(MapPos::new(0, -1)), Some(HexRing::Inner));
        assert_eq!(HexRing::of(MapPos::new(2, -1)), Some(HexRing::Middle));
        assert_eq!(HexRing::of(MapPos::new(-3, 0)), Some(HexRing::Outer));
    }

    #[test]
    fn start_positions_sit_on_middle_ring() {
        for teams in 1..=6 {
            let positions = MapPos::start_positions(teams);
            assert_eq!(positions.len(), teams);
            assert!(positions.iter().all(|pos| pos.ring_distance() == 2));
        }
    }
}
