use super::{CmdInput, CmdStep, ProcessResult, next_phase, phase_limit};
use crate::env::{Buildable, OracleError};
use crate::error::{EngineError, InputError, verify_input};
use crate::record::BuildRecord;
use crate::session::CommitSession;
use crate::state::{Colour, MapPos};

/// Build one ship or structure in an owned hex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildCmd {
    pub colour: Colour,
    pub phase: u32,
}

impl BuildCmd {
    pub fn new(colour: Colour, phase: u32) -> Self {
        Self { colour, phase }
    }

    /// Materials the build costs after every check passes.
    fn validate(
        &self,
        session: &CommitSession<'_>,
        pos: MapPos,
        item: Buildable,
    ) -> Result<u32, EngineError> {
        let state = session.state();
        let team = state.team(self.colour)?;
        let hex = state
            .map
            .get(pos)
            .ok_or(InputError::InvalidChoice("no hex at that position"))?;
        verify_input(
            hex.owner == Some(self.colour),
            InputError::ActionNotAllowed("can only build in owned hexes"),
        )?;
        if let Some(tech) = item.required_tech() {
            verify_input(
                team.has_tech(tech),
                InputError::ActionNotAllowed("technology required"),
            )?;
        }
        match item {
            Buildable::Orbital => {
                verify_input(!hex.orbital, InputError::ActionNotAllowed("orbital already built"))?
            }
            Buildable::Monolith => verify_input(
                !hex.monolith,
                InputError::ActionNotAllowed("monolith already built"),
            )?,
            _ => {}
        }
        if let Some(ship) = item.ship() {
            verify_input(team.supply_of(ship) > 0, InputError::NotEnough("ships in supply"))?;
        }

        let cost = session
            .env()
            .rules()?
            .build_cost(team.race, item)
            .ok_or(OracleError::BuildCostNotFound(item))?;
        verify_input(
            team.storage.materials >= cost as i32,
            InputError::NotEnough("materials"),
        )?;
        Ok(cost)
    }
}

impl CmdStep for BuildCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::Build { pos, item } => {
                let cost = self.validate(session, *pos, *item)?;
                let limit = phase_limit(session, self.colour, |rules| rules.build_rate)?;
                session.do_record(BuildRecord::new(self.colour, *pos, *item, cost))?;
                let colour = self.colour;
                Ok(ProcessResult::maybe(next_phase(self.phase, limit, |phase| {
                    BuildCmd::new(colour, phase).into()
                })))
            }
            CmdInput::Reject if self.phase > 0 => Ok(ProcessResult::done()),
            CmdInput::Reject => {
                Err(InputError::ActionNotAllowed("undo to cancel the first build").into())
            }
            _ => Err(InputError::UnexpectedInput { expected: "build" }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordLog;
    use crate::state::{RaceType, ShipType};
    use crate::test_support::Fixture;

    const HOME: MapPos = MapPos::new(0, -2);

    #[test]
    fn builds_until_materials_run_out() {
        let fixture = Fixture::new();
        let mut state = fixture.started_state(&[(Colour::Red, RaceType::Human)]);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);

        let first = BuildCmd::new(Colour::Red, 0);
        let build = CmdInput::Build {
            pos: HOME,
            item: Buildable::Interceptor,
        };
        let result = first.process(&build, &mut session).unwrap();
        assert_eq!(result.next, Some(BuildCmd::new(Colour::Red, 1).into()));

        let hex = session.state().hex(HOME).unwrap();
        assert_eq!(hex.ship_count(Some(Colour::Red), ShipType::Interceptor), 2);
        assert_eq!(session.state().team(Colour::Red).unwrap().storage.materials, 0);

        let err = BuildCmd::new(Colour::Red, 1)
            .process(&build, &mut session)
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotEnough("materials")));
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn last_build_of_the_action_ends_the_chain() {
        let fixture = Fixture::new();
        let mut state = fixture.started_state(&[(Colour::Red, RaceType::Human)]);
        state.team_mut(Colour::Red).unwrap().storage.materials = 20;
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let build = CmdInput::Build {
            pos: HOME,
            item: Buildable::Interceptor,
        };

        // Build rate two: step one is the last one offered.
        let result = BuildCmd::new(Colour::Red, 1)
            .process(&build, &mut session)
            .unwrap();
        assert_eq!(result, ProcessResult::done());
        assert_eq!(session.log().len(), 1);
        drop(session);

        // A reaction builds exactly once.
        state.team_mut(Colour::Red).unwrap().passed = true;
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let result = BuildCmd::new(Colour::Red, 0)
            .process(&build, &mut session)
            .unwrap();
        assert_eq!(result.next, None);
        let hex = session.state().hex(HOME).unwrap();
        assert_eq!(hex.ship_count(Some(Colour::Red), ShipType::Interceptor), 3);
    }

    #[test]
    fn rejects_unowned_hexes_and_missing_technology() {
        let fixture = Fixture::new();
        let mut state = fixture.started_state(&[(Colour::Red, RaceType::Human)]);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let cmd = BuildCmd::new(Colour::Red, 0);

        let centre = CmdInput::Build {
            pos: MapPos::ORIGIN,
            item: Buildable::Interceptor,
        };
        assert!(cmd.process(&centre, &mut session).is_err());

        let starbase = CmdInput::Build {
            pos: HOME,
            item: Buildable::Starbase,
        };
        let err = cmd.process(&starbase, &mut session).unwrap_err();
        assert_eq!(
            err.as_input(),
            Some(&InputError::ActionNotAllowed("technology required"))
        );
        assert!(cmd.process(&CmdInput::Reject, &mut session).is_err());
        assert!(session.log().is_empty());
    }
}
