use std::collections::{BTreeMap, BTreeSet};

use super::{Colour, CubeCounts, DiscoveryType, PlayerId, RaceType, ShipType, Storage, TechClass, TechType};
use crate::env::RaceRules;

/// A seat in the turn order. The colour is set once the player picks a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamSlot {
    pub player: PlayerId,
    pub colour: Option<Colour>,
}

impl TeamSlot {
    pub const fn new(player: PlayerId) -> Self {
        Self {
            player,
            colour: None,
        }
    }
}

/// Per-team mutable state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamState {
    pub colour: Colour,
    pub race: RaceType,
    pub storage: Storage,
    /// Discs owned in total.
    pub influence_total: u32,
    /// Discs still on the influence track.
    pub influence_discs: u32,
    /// Discs spent on actions this round.
    pub action_discs: u32,
    pub colony_ships: u32,
    pub colony_ships_used: u32,
    /// Cubes left on each population track.
    pub population: CubeCounts,
    /// Cubes destroyed in battle, returned to the tracks at upkeep.
    pub graveyard: CubeCounts,
    /// Ships not yet on the map.
    pub supply: BTreeMap<ShipType, u32>,
    pub techs: BTreeSet<TechType>,
    pub passed: bool,
    /// Discovery tiles kept face down for victory points.
    pub kept_discoveries: Vec<DiscoveryType>,
}

impl TeamState {
    pub fn new(colour: Colour, race: RaceType, rules: &RaceRules) -> Self {
        Self {
            colour,
            race,
            storage: rules.storage,
            influence_total: rules.influence_discs,
            influence_discs: rules.influence_discs,
            action_discs: 0,
            colony_ships: rules.colony_ships,
            colony_ships_used: 0,
            population: CubeCounts::uniform(rules.population_cubes),
            graveyard: CubeCounts::default(),
            supply: rules.supply.iter().copied().collect(),
            techs: rules.techs.iter().copied().collect(),
            passed: false,
            kept_discoveries: Vec::new(),
        }
    }

    pub fn has_tech(&self, tech: TechType) -> bool {
        self.techs.contains(&tech)
    }

    pub fn techs_in_class(&self, class: TechClass) -> usize {
        self.techs.iter().filter(|tech| tech.class() == class).count()
    }

    /// Best shield technology bonus.
    pub fn shield_bonus(&self) -> i32 {
        self.techs
            .iter()
            .map(|tech| tech.shield_bonus())
            .max()
            .unwrap_or(0)
    }

    /// Best targeting computer bonus.
    pub fn computer_bonus(&self) -> i32 {
        self.techs
            .iter()
            .map(|tech| tech.computer_bonus())
            .max()
            .unwrap_or(0)
    }

    /// Discs off the influence track (hexes and actions).
    pub fn discs_in_use(&self) -> u32 {
        self.influence_total.saturating_sub(self.influence_discs)
    }

    pub fn supply_of(&self, ship: ShipType) -> u32 {
        self.supply.get(&ship).copied().unwrap_or(0)
    }

    pub fn colony_ships_available(&self) -> u32 {
        self.colony_ships.saturating_sub(self.colony_ships_used)
    }
}
