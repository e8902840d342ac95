use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use super::{RecordContext, RecordTransition, captured};
use crate::env::{OracleError, TileOracle, shuffle};
use crate::error::{ModelError, verify_model};
use crate::state::{
    Colour, DiscoveryType, GameState, Hex, HexId, HexRing, MapPos, RaceType, TeamState, TechType,
};
use crate::update::GameUpdate;

/// A seat picks its race and colour.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignTeamRecord {
    pub slot: usize,
    pub colour: Colour,
    pub race: RaceType,
}

impl AssignTeamRecord {
    pub fn new(slot: usize, colour: Colour, race: RaceType) -> Self {
        Self { slot, colour, race }
    }
}

impl RecordTransition for AssignTeamRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let slot = state
            .team_order
            .get_mut(self.slot)
            .ok_or(ModelError::SlotNotFound(self.slot))?;
        if forward {
            verify_model(slot.colour.is_none(), "slot already has a team")?;
            verify_model(!state.teams.contains_key(&self.colour), "colour already assigned")?;
            let rules = ctx.env.race_rules(self.race)?;
            slot.colour = Some(self.colour);
            state
                .teams
                .insert(self.colour, TeamState::new(self.colour, self.race, &rules));
        } else {
            verify_model(slot.colour == Some(self.colour), "slot holds another team")?;
            slot.colour = None;
            state
                .teams
                .remove(&self.colour)
                .ok_or(ModelError::TeamNotFound(self.colour))?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} chose the {} race", self.colour, self.race)
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Teams, GameUpdate::Log]
    }
}

/// Random setup decided when the main game starts.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameSetup {
    pub hex_piles: BTreeMap<HexRing, Vec<HexId>>,
    pub discovery_bag: Vec<DiscoveryType>,
    /// Technology bag after the opening draw.
    pub tech_bag: Vec<TechType>,
    pub tech_draw: Vec<TechType>,
    pub homes: Vec<(Colour, MapPos, HexId)>,
    pub centre: HexId,
}

/// Shuffles piles and bags, draws the opening technologies and places the
/// galactic centre and every home sector.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartGameRecord {
    pub tech_count: u32,
    pub setup: Option<GameSetup>,
}

impl StartGameRecord {
    pub fn new(tech_count: u32) -> Self {
        Self {
            tech_count,
            setup: None,
        }
    }

    fn roll_setup(&self, state: &GameState, ctx: &RecordContext<'_>) -> Result<GameSetup, ModelError> {
        let rules = ctx.env.rules()?;
        let tiles = ctx.env.tiles()?;
        let rng = ctx.env.rng()?;
        let seed = state.seed;
        let id = ctx.id.0;

        let mut hex_piles = BTreeMap::new();
        for (index, ring) in HexRing::iter().enumerate() {
            let mut pile = tiles.ring_tiles(ring);
            shuffle(rng, seed, id, index as u32 + 1, &mut pile);
            hex_piles.insert(ring, pile);
        }

        let mut discovery_bag = rules.discovery_tiles();
        shuffle(rng, seed, id, 10, &mut discovery_bag);

        let mut tech_bag = rules.tech_tiles();
        shuffle(rng, seed, id, 11, &mut tech_bag);
        let keep = tech_bag.len().saturating_sub(self.tech_count as usize);
        let tech_draw = tech_bag.split_off(keep);

        let colours: Vec<Colour> = state.colours().collect();
        let positions = MapPos::start_positions(colours.len());
        let homes = colours
            .into_iter()
            .zip(positions)
            .map(|(colour, pos)| {
                let tile = home_tile(tiles, colour)?;
                Ok((colour, pos, tile))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(GameSetup {
            hex_piles,
            discovery_bag,
            tech_bag,
            tech_draw,
            homes,
            centre: tiles.centre_tile(),
        })
    }
}

fn home_tile(tiles: &dyn TileOracle, colour: Colour) -> Result<HexId, ModelError> {
    tiles
        .home_tile(colour)
        .ok_or_else(|| OracleError::HomeTileNotFound(colour).into())
}

impl RecordTransition for StartGameRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            verify_model(state.round == 0 && state.map.is_empty(), "game already started")?;
            if self.setup.is_none() {
                self.setup = Some(self.roll_setup(state, ctx)?);
            }
            let setup = captured(&self.setup, "game setup")?;

            state.hex_piles = setup.hex_piles.clone();
            state.hex_discards = HexRing::iter().map(|ring| (ring, Vec::new())).collect();
            state.discovery_bag = setup.discovery_bag.clone();
            state.tech_bag = setup.tech_bag.clone();
            for tech in &setup.tech_draw {
                *state.tech_board.entry(*tech).or_insert(0) += 1;
            }

            let centre = ctx.env.tile(setup.centre)?;
            state.map.insert(Hex::from_tile(&centre, MapPos::ORIGIN, 0));

            for (colour, pos, tile) in &setup.homes {
                let tile = ctx.env.tile(*tile)?;
                let fleet = ctx.env.race_rules(state.team(*colour)?.race)?.fleet;
                let mut hex = Hex::from_tile(&tile, *pos, 0);
                let team = state.team_mut(*colour)?;

                hex.owner = Some(*colour);
                team.influence_discs = team
                    .influence_discs
                    .checked_sub(1)
                    .ok_or(ModelError::Invariant("no influence disc for home sector"))?;
                for square in hex.squares.iter_mut().filter(|square| !square.advanced) {
                    let Some(resource) = square.kind.resource() else {
                        continue;
                    };
                    let cubes = team.population.get_mut(resource);
                    if *cubes > 0 {
                        *cubes -= 1;
                        square.occupant = Some(resource);
                    }
                }
                for (ship, count) in fleet {
                    let supply = team.supply.entry(ship).or_insert(0);
                    *supply = supply
                        .checked_sub(count)
                        .ok_or(ModelError::Invariant("starting fleet exceeds supply"))?;
                    hex.add_ships(Some(*colour), ship, count);
                }
                state.map.insert(hex);
            }
            state.round = 1;
        } else {
            let setup = captured(&self.setup, "game setup")?;
            verify_model(state.round == 1, "game setup reversed after round one")?;

            for (colour, pos, _) in &setup.homes {
                let hex = state
                    .map
                    .remove(*pos)
                    .ok_or(ModelError::HexNotFound(*pos))?;
                let team = state.team_mut(*colour)?;
                team.influence_discs += 1;
                for (_, square) in hex.occupied_squares() {
                    if let Some(resource) = square.occupant {
                        *team.population.get_mut(resource) += 1;
                    }
                }
                if let Some(fleet) = hex.fleet(Some(*colour)) {
                    for (ship, count) in &fleet.ships {
                        *team.supply.entry(*ship).or_insert(0) += count;
                    }
                }
            }
            state
                .map
                .remove(MapPos::ORIGIN)
                .ok_or(ModelError::HexNotFound(MapPos::ORIGIN))?;

            state.hex_piles.clear();
            state.hex_discards.clear();
            state.discovery_bag.clear();
            state.tech_bag.clear();
            state.tech_board.clear();
            state.round = 0;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "The game has started".to_string()
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Map,
            GameUpdate::Round,
            GameUpdate::TechBoard,
            GameUpdate::Teams,
            GameUpdate::Log,
        ]
    }
}

/// Informational log line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteRecord {
    pub text: String,
}

impl NoteRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl RecordTransition for NoteRecord {
    fn apply(
        &mut self,
        _forward: bool,
        _state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        Ok(())
    }

    fn describe(&self) -> String {
        self.text.clone()
    }

    fn is_message(&self) -> bool {
        true
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Log]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::round_trip;
    use crate::state::{PlayerId, TeamSlot};
    use crate::test_support::Fixture;

    #[test]
    fn assign_team_round_trips() {
        let fixture = Fixture::new();
        let mut state = GameState::new(3);
        state.team_order = vec![TeamSlot::new(PlayerId(1)), TeamSlot::new(PlayerId(2))];

        round_trip(
            &fixture,
            &mut state,
            AssignTeamRecord::new(1, Colour::Blue, RaceType::Human),
        );
    }

    #[test]
    fn start_game_places_centre_and_homes() {
        let fixture = Fixture::new();
        let mut state = fixture.lobby_state(&[
            (Colour::Red, RaceType::Human),
            (Colour::Blue, RaceType::Planta),
        ]);

        let record = round_trip(&fixture, &mut state, StartGameRecord::new(6));
        let setup = record.setup.unwrap();
        assert_eq!(setup.tech_draw.len(), 6);
        assert_eq!(setup.homes.len(), 2);

        let mut record = StartGameRecord {
            tech_count: 6,
            setup: Some(setup),
        };
        let ctx = RecordContext {
            id: crate::record::RecordId(1),
            env: fixture.env(),
        };
        record.apply(true, &mut state, &ctx).unwrap();
        assert_eq!(state.round, 1);
        assert_eq!(state.map.len(), 3);
        let home = state.map.owned_by(Colour::Red).next().unwrap();
        assert!(home.has_population());
        assert!(home.has_ships(Some(Colour::Red)));
        assert_eq!(state.tech_board.values().sum::<u32>(), 6);
    }
}
