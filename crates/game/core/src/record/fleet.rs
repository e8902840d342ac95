use super::{RecordContext, RecordTransition, captured};
use crate::env::Buildable;
use crate::error::{ModelError, verify_model};
use crate::state::{Colour, GameState, MapPos, Resource, ShipType, Storage, TechType};
use crate::update::GameUpdate;

/// Pays materials and places a ship or structure in a hex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildRecord {
    pub colour: Colour,
    pub pos: MapPos,
    pub item: Buildable,
    pub cost: u32,
}

impl BuildRecord {
    pub fn new(colour: Colour, pos: MapPos, item: Buildable, cost: u32) -> Self {
        Self {
            colour,
            pos,
            item,
            cost,
        }
    }
}

impl RecordTransition for BuildRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let cost = Storage::new(0, 0, -(self.cost as i32));
        let team = state.team_mut(self.colour)?;
        team.storage.apply(&cost, forward);
        if let Some(ship) = self.item.ship() {
            let supply = team.supply.entry(ship).or_insert(0);
            if forward {
                *supply = supply
                    .checked_sub(1)
                    .ok_or(ModelError::Invariant("ship supply exhausted"))?;
            } else {
                *supply += 1;
            }
        }

        let hex = state.hex_mut(self.pos)?;
        match (self.item.ship(), self.item) {
            (Some(ship), _) if forward => hex.add_ships(Some(self.colour), ship, 1),
            (Some(ship), _) => {
                hex.remove_ships(Some(self.colour), ship, 1)
                    .map_err(ModelError::Invariant)?;
            }
            (None, Buildable::Orbital) => {
                verify_model(hex.orbital != forward, "orbital already present")?;
                hex.orbital = forward;
            }
            (None, _) => {
                verify_model(hex.monolith != forward, "monolith already present")?;
                hex.monolith = forward;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} built a {} at {}", self.colour, self.item, self.pos)
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Storage(self.colour),
            GameUpdate::Ships(self.colour),
            GameUpdate::Map,
            GameUpdate::Log,
        ]
    }
}

/// Moves one ship between hexes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveRecord {
    pub colour: Colour,
    pub ship: ShipType,
    pub from: MapPos,
    pub to: MapPos,
    /// Index of the source fleet if the move emptied it.
    pub emptied_fleet: Option<Option<usize>>,
}

impl MoveRecord {
    pub fn new(colour: Colour, ship: ShipType, from: MapPos, to: MapPos) -> Self {
        Self {
            colour,
            ship,
            from,
            to,
            emptied_fleet: None,
        }
    }
}

impl RecordTransition for MoveRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let owner = Some(self.colour);
        if forward {
            verify_model(state.map.contains(self.to), "move destination not on map")?;
            let emptied = state
                .hex_mut(self.from)?
                .remove_ships(owner, self.ship, 1)
                .map_err(ModelError::Invariant)?;
            self.emptied_fleet = Some(emptied);
            state.hex_mut(self.to)?.add_ships(owner, self.ship, 1);
        } else {
            let emptied = *captured(&self.emptied_fleet, "source fleet")?;
            state
                .hex_mut(self.to)?
                .remove_ships(owner, self.ship, 1)
                .map_err(ModelError::Invariant)?;
            let from = state.hex_mut(self.from)?;
            if let Some(index) = emptied {
                from.restore_fleet(owner, index);
            }
            from.add_ships(owner, self.ship, 1);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{} moved a {} from {} to {}",
            self.colour, self.ship, self.from, self.to
        )
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Map, GameUpdate::Log]
    }
}

/// Uses colony ships to move cubes from population tracks onto squares.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColoniseRecord {
    pub colour: Colour,
    pub pos: MapPos,
    /// Square index and the track its cube comes from.
    pub placements: Vec<(usize, Resource)>,
}

impl ColoniseRecord {
    pub fn new(colour: Colour, pos: MapPos, placements: Vec<(usize, Resource)>) -> Self {
        Self {
            colour,
            pos,
            placements,
        }
    }
}

impl RecordTransition for ColoniseRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let ships = self.placements.len() as u32;
        let team = state.team_mut(self.colour)?;
        if forward {
            verify_model(team.colony_ships_available() >= ships, "no colony ship left")?;
            for (_, resource) in &self.placements {
                let cubes = team.population.get_mut(*resource);
                *cubes = cubes
                    .checked_sub(1)
                    .ok_or(ModelError::Invariant("population track empty"))?;
            }
            team.colony_ships_used += ships;
        } else {
            for (_, resource) in &self.placements {
                *team.population.get_mut(*resource) += 1;
            }
            team.colony_ships_used -= ships;
        }

        let hex = state.hex_mut(self.pos)?;
        for (index, resource) in &self.placements {
            let square = hex
                .squares
                .get_mut(*index)
                .ok_or(ModelError::Invariant("square index out of range"))?;
            if forward {
                verify_model(square.occupant.is_none(), "square already occupied")?;
                square.occupant = Some(*resource);
            } else {
                verify_model(square.occupant == Some(*resource), "square holds another cube")?;
                square.occupant = None;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{} placed {} cube(s) at {}",
            self.colour,
            self.placements.len(),
            self.pos
        )
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Map,
            GameUpdate::Population(self.colour),
            GameUpdate::Log,
        ]
    }
}

/// Buys a technology from the board.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResearchRecord {
    pub colour: Colour,
    pub tech: TechType,
    pub cost: u32,
}

impl ResearchRecord {
    pub fn new(colour: Colour, tech: TechType, cost: u32) -> Self {
        Self { colour, tech, cost }
    }
}

impl RecordTransition for ResearchRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            let count = state
                .tech_board
                .get_mut(&self.tech)
                .ok_or(ModelError::Invariant("technology not on board"))?;
            *count -= 1;
            if *count == 0 {
                state.tech_board.remove(&self.tech);
            }
        } else {
            *state.tech_board.entry(self.tech).or_insert(0) += 1;
        }

        let team = state.team_mut(self.colour)?;
        team.storage
            .apply(&Storage::new(0, -(self.cost as i32), 0), forward);
        if forward {
            verify_model(team.techs.insert(self.tech), "technology already owned")?;
        } else {
            verify_model(team.techs.remove(&self.tech), "technology not owned")?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{} researched {} for {} science",
            self.colour, self.tech, self.cost
        )
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Storage(self.colour),
            GameUpdate::Technologies(self.colour),
            GameUpdate::TechBoard,
            GameUpdate::Log,
        ]
    }
}

/// Exchanges one resource for another at the race's trade rate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeRecord {
    pub colour: Colour,
    pub from: Resource,
    pub to: Resource,
    pub spent: u32,
    pub received: u32,
}

impl TradeRecord {
    pub fn new(colour: Colour, from: Resource, to: Resource, spent: u32, received: u32) -> Self {
        Self {
            colour,
            from,
            to,
            spent,
            received,
        }
    }

    fn delta(&self) -> Result<Storage, ModelError> {
        let amount = |value: u32| {
            i32::try_from(value).map_err(|_| ModelError::Invariant("trade amount out of range"))
        };
        let mut delta = Storage::default();
        *delta.get_mut(self.from) = -amount(self.spent)?;
        *delta.get_mut(self.to) = amount(self.received)?;
        Ok(delta)
    }
}

impl RecordTransition for TradeRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        verify_model(self.from != self.to, "trade needs two resources")?;
        let delta = self.delta()?;
        state.team_mut(self.colour)?.storage.apply(&delta, forward);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{} traded {} {} for {} {}",
            self.colour, self.spent, self.from, self.received, self.to
        )
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Storage(self.colour), GameUpdate::Log]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::round_trip;
    use crate::state::{Hex, HexId, RaceType};
    use crate::test_support::Fixture;

    fn started() -> (Fixture, GameState, MapPos) {
        let fixture = Fixture::new();
        let state = fixture.started_state(&[
            (Colour::Red, RaceType::Human),
            (Colour::Blue, RaceType::Planta),
        ]);
        let home = state.map.owned_by(Colour::Red).next().unwrap().pos;
        (fixture, state, home)
    }

    #[test]
    fn building_ships_and_structures_round_trips() {
        let (fixture, mut state, home) = started();
        state.team_mut(Colour::Red).unwrap().storage.materials = 20;

        round_trip(
            &fixture,
            &mut state,
            BuildRecord::new(Colour::Red, home, Buildable::Cruiser, 5),
        );
        round_trip(
            &fixture,
            &mut state,
            BuildRecord::new(Colour::Red, home, Buildable::Orbital, 5),
        );
    }

    #[test]
    fn moving_last_ship_restores_fleet_position() {
        let (fixture, mut state, home) = started();
        let hex = state.hex_mut(home).unwrap();
        hex.add_ships(Some(Colour::Blue), ShipType::Cruiser, 1);
        let original = hex.fleets.clone();

        round_trip(
            &fixture,
            &mut state,
            MoveRecord::new(Colour::Red, ShipType::Interceptor, home, MapPos::ORIGIN),
        );
        assert_eq!(state.hex(home).unwrap().fleets, original);
    }

    #[test]
    fn colonise_fills_empty_squares() {
        let (fixture, mut state, _) = started();
        let tile = fixture.env().tile(HexId(201)).unwrap();
        let pos = MapPos::new(2, -2);
        let mut hex = Hex::from_tile(&tile, pos, 0);
        hex.owner = Some(Colour::Red);
        state.map.insert(hex);

        round_trip(
            &fixture,
            &mut state,
            ColoniseRecord::new(Colour::Red, pos, vec![(0, Resource::Money)]),
        );
    }

    #[test]
    fn research_and_trade_round_trip() {
        let (fixture, mut state, _) = started();
        let tech = *state.tech_board.keys().next().unwrap();
        state.team_mut(Colour::Red).unwrap().techs.remove(&tech);

        round_trip(
            &fixture,
            &mut state,
            ResearchRecord::new(Colour::Red, tech, 4),
        );
        round_trip(
            &fixture,
            &mut state,
            TradeRecord::new(Colour::Red, Resource::Money, Resource::Science, 4, 2),
        );
    }
}
