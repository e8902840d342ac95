pub mod common;
pub mod hex;
pub mod map;
pub mod team;
pub mod tech;

pub use common::{Colour, CubeCounts, PlayerId, RaceType, Resource, Storage};
pub use hex::{Contest, Fleet, Hex, HexId, ShipType, Square, SquareType};
pub use map::{Edge, EdgeSet, HexRing, Map, MapPos};
pub use team::{TeamSlot, TeamState};
pub use tech::{DiscoveryType, TechClass, TechType};
