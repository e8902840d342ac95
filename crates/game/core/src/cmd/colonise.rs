use std::collections::BTreeSet;

use super::{CmdInput, CmdStep, ProcessResult};
use crate::error::{EngineError, InputError, verify_input};
use crate::record::ColoniseRecord;
use crate::session::CommitSession;
use crate::state::{Colour, CubeCounts, Hex, MapPos, Resource, Square, TeamState, TechType};

/// Whether `team` may put a `resource` cube on `square` right now.
fn can_fill(team: &TeamState, square: &Square, resource: Resource) -> bool {
    square.occupant.is_none()
        && square.kind.accepts(resource)
        && (!square.advanced || team.has_tech(TechType::advanced_for(resource)))
}

fn has_fillable_square(team: &TeamState, hex: &Hex) -> bool {
    hex.squares.iter().any(|square| {
        Resource::ALL
            .into_iter()
            .any(|resource| team.population.get(resource) > 0 && can_fill(team, square, resource))
    })
}

/// Pick an owned hex to place population in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColoniseCmd {
    pub colour: Colour,
}

impl ColoniseCmd {
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }
}

impl CmdStep for ColoniseCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::Colonise { pos } => {
                let state = session.state();
                let team = state.team(self.colour)?;
                verify_input(
                    team.colony_ships_available() > 0,
                    InputError::NotEnough("colony ships"),
                )?;
                let hex = state
                    .map
                    .get(*pos)
                    .ok_or(InputError::InvalidChoice("no hex at that position"))?;
                verify_input(
                    hex.owner == Some(self.colour),
                    InputError::ActionNotAllowed("can only colonise owned hexes"),
                )?;
                verify_input(
                    has_fillable_square(team, hex),
                    InputError::ActionNotAllowed("no square can be filled"),
                )?;
                Ok(ProcessResult::then(ColoniseSquaresCmd {
                    colour: self.colour,
                    pos: *pos,
                }))
            }
            CmdInput::Reject => Ok(ProcessResult::done()),
            _ => Err(InputError::UnexpectedInput {
                expected: "colonise",
            }
            .into()),
        }
    }
}

/// Choose which cubes go on which squares of the picked hex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColoniseSquaresCmd {
    pub colour: Colour,
    pub pos: MapPos,
}

impl ColoniseSquaresCmd {
    fn validate(
        &self,
        session: &CommitSession<'_>,
        placements: &[(usize, Resource)],
    ) -> Result<(), EngineError> {
        let state = session.state();
        let team = state.team(self.colour)?;
        let hex = state.hex(self.pos)?;
        verify_input(!placements.is_empty(), InputError::InvalidChoice("no cubes placed"))?;
        verify_input(
            placements.len() as u32 <= team.colony_ships_available(),
            InputError::NotEnough("colony ships"),
        )?;

        let mut squares = BTreeSet::new();
        let mut cubes = CubeCounts::default();
        for (index, resource) in placements {
            verify_input(
                squares.insert(*index),
                InputError::InvalidChoice("square chosen twice"),
            )?;
            let square = hex
                .squares
                .get(*index)
                .ok_or(InputError::InvalidChoice("square does not exist"))?;
            verify_input(
                can_fill(team, square, *resource),
                InputError::InvalidChoice("square cannot take that cube"),
            )?;
            *cubes.get_mut(*resource) += 1;
        }
        for resource in Resource::ALL {
            verify_input(
                cubes.get(resource) <= team.population.get(resource),
                InputError::NotEnough("population cubes"),
            )?;
        }
        Ok(())
    }
}

impl CmdStep for ColoniseSquaresCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::ColoniseSquares { placements } => {
                self.validate(session, placements)?;
                session.do_record(ColoniseRecord::new(
                    self.colour,
                    self.pos,
                    placements.clone(),
                ))?;
                Ok(ProcessResult::done())
            }
            CmdInput::Reject => Ok(ProcessResult::then(ColoniseCmd::new(self.colour))),
            _ => Err(InputError::UnexpectedInput {
                expected: "colonise_squares",
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Cmd;
    use crate::record::RecordLog;
    use crate::state::{GameState, HexId, RaceType};
    use crate::test_support::Fixture;

    const COLONY: MapPos = MapPos::new(2, -2);

    fn with_colony(fixture: &Fixture) -> GameState {
        let mut state = fixture.started_state(&[(Colour::Red, RaceType::Human)]);
        let tile = fixture.env().tile(HexId(201)).unwrap();
        let mut hex = Hex::from_tile(&tile, COLONY, 0);
        hex.owner = Some(Colour::Red);
        state.map.insert(hex);
        state
    }

    #[test]
    fn advanced_squares_need_technology() {
        let fixture = Fixture::new();
        let mut state = with_colony(&fixture);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let cmd = ColoniseCmd::new(Colour::Red);

        // The home sector only has its advanced science square left.
        let home = CmdInput::Colonise {
            pos: MapPos::new(0, -2),
        };
        assert_eq!(
            cmd.process(&home, &mut session).unwrap_err().as_input(),
            Some(&InputError::ActionNotAllowed("no square can be filled"))
        );

        let result = cmd
            .process(&CmdInput::Colonise { pos: COLONY }, &mut session)
            .unwrap();
        let Some(Cmd::ColoniseSquares(squares)) = result.next else {
            panic!("expected square choice");
        };
        let advanced = CmdInput::ColoniseSquares {
            placements: vec![(1, Resource::Materials)],
        };
        assert!(squares.process(&advanced, &mut session).is_err());
        let twice = CmdInput::ColoniseSquares {
            placements: vec![(0, Resource::Money), (0, Resource::Money)],
        };
        assert!(squares.process(&twice, &mut session).is_err());
        assert!(session.log().is_empty());
    }

    #[test]
    fn placing_cubes_uses_colony_ships() {
        let fixture = Fixture::new();
        let mut state = with_colony(&fixture);
        state
            .team_mut(Colour::Red)
            .unwrap()
            .techs
            .insert(TechType::AdvMining);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let before = session.state().team(Colour::Red).unwrap().clone();

        let squares = ColoniseSquaresCmd {
            colour: Colour::Red,
            pos: COLONY,
        };
        let placements = vec![(0, Resource::Money), (1, Resource::Materials)];
        let result = squares
            .process(&CmdInput::ColoniseSquares { placements }, &mut session)
            .unwrap();
        assert_eq!(result, ProcessResult::done());

        let team = session.state().team(Colour::Red).unwrap();
        assert_eq!(team.colony_ships_available(), before.colony_ships_available() - 2);
        assert_eq!(
            team.population.money + team.population.materials,
            before.population.money + before.population.materials - 2
        );
        assert_eq!(session.state().hex(COLONY).unwrap().occupied_squares().count(), 2);
    }
}
