use crate::state::{DiscoveryType, RaceType, ShipType, Storage, TechType};

/// Oracle providing race rules and balance tables.
///
/// The engine owns no balance numbers: rates, costs, ship statistics, income
/// tables and starting resources are all looked up here.
pub trait RulesOracle: Send + Sync {
    fn race(&self, race: RaceType) -> Option<RaceRules>;

    /// Combat statistics of a ship. `race == None` asks for neutral ships.
    fn blueprint(&self, race: Option<RaceType>, ship: ShipType) -> Option<ShipBlueprint>;

    /// Materials needed to build `item`.
    fn build_cost(&self, race: RaceType, item: Buildable) -> Option<u32>;

    fn tech_cost(&self, tech: TechType) -> Option<TechCost>;

    /// Science discount when the team already owns `owned` technologies of a class.
    fn research_discount(&self, owned: usize) -> u32;

    /// Income per round for a resource with `placed` cubes off its track.
    fn production(&self, placed: u32) -> i32;

    /// Money owed per round for `discs` influence discs off the track.
    fn influence_upkeep(&self, discs: u32) -> i32;

    /// Cubes per population track when full.
    fn population_track(&self) -> u32;

    /// Contents of the discovery bag before shuffling.
    fn discovery_tiles(&self) -> Vec<DiscoveryType>;

    /// Contents of the technology bag before shuffling.
    fn tech_tiles(&self) -> Vec<TechType>;

    /// Research cost after class discount, never below the technology's minimum.
    fn research_cost(&self, tech: TechType, owned_in_class: usize) -> Option<u32> {
        let cost = self.tech_cost(tech)?;
        let discounted = cost.cost.saturating_sub(self.research_discount(owned_in_class));
        Some(discounted.max(cost.min_cost))
    }
}

/// Per-race rates and starting resources.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceRules {
    /// Hexes explored per explore action.
    pub explore_rate: u32,
    /// Tiles that may be drawn to choose from per explored position.
    pub explore_choices: u32,
    pub build_rate: u32,
    pub move_rate: u32,
    /// Units of a resource paid for one unit of another.
    pub trade_rate: u32,
    pub influence_discs: u32,
    pub colony_ships: u32,
    /// Cubes on each population track at game start.
    pub population_cubes: u32,
    pub storage: Storage,
    /// Ships placed on the home sector at game start.
    pub fleet: Vec<(ShipType, u32)>,
    /// Ships available to build, including the starting fleet.
    pub supply: Vec<(ShipType, u32)>,
    pub techs: Vec<TechType>,
}

/// Combat statistics of one ship type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipBlueprint {
    pub initiative: i32,
    /// Extra hit points; a ship survives `hull` hits of one damage.
    pub hull: i32,
    pub computer: i32,
    pub shield: i32,
    /// Cannon dice rolled per ship each main round.
    pub cannons: u32,
    pub cannon_damage: u32,
    /// Missile dice rolled per ship in the missile round.
    pub missiles: u32,
    pub missile_damage: u32,
    pub movement: u32,
}

impl ShipBlueprint {
    pub const fn lives(&self) -> i32 {
        self.hull + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TechCost {
    pub cost: u32,
    pub min_cost: u32,
}

/// Things the build action can place on an owned hex.
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
pub enum Buildable {
    Interceptor,
    Cruiser,
    Dreadnought,
    Starbase,
    Orbital,
    Monolith,
}

impl Buildable {
    pub const fn ship(self) -> Option<ShipType> {
        match self {
            Buildable::Interceptor => Some(ShipType::Interceptor),
            Buildable::Cruiser => Some(ShipType::Cruiser),
            Buildable::Dreadnought => Some(ShipType::Dreadnought),
            Buildable::Starbase => Some(ShipType::Starbase),
            Buildable::Orbital | Buildable::Monolith => None,
        }
    }

    /// Technology that unlocks the item, if any.
    pub const fn required_tech(self) -> Option<TechType> {
        match self {
            Buildable::Starbase => Some(TechType::StarBase),
            Buildable::Orbital => Some(TechType::Orbital),
            Buildable::Monolith => Some(TechType::Monolith),
            _ => None,
        }
    }
}
