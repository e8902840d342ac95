use std::collections::{BTreeSet, VecDeque};

use super::{Cmd, CmdInput, CmdStep, ProcessResult, next_phase, phase_limit};
use crate::error::{EngineError, InputError, verify_input};
use crate::record::MoveRecord;
use crate::session::CommitSession;
use crate::state::{Colour, GameState, MapPos, ShipType, TechType};

/// Hexes a ship of `colour` can reach from `src` within `movement` steps.
///
/// Steps follow connected wormholes. A hex holding enemy ships ends the
/// path: it can be entered but not passed through.
pub fn reachable_hexes(
    state: &GameState,
    colour: Colour,
    src: MapPos,
    movement: u32,
) -> Vec<MapPos> {
    let wormhole_gen = state
        .team(colour)
        .is_ok_and(|team| team.has_tech(TechType::WormholeGen));
    let mut seen = BTreeSet::from([src]);
    let mut queue = VecDeque::from([(src, 0u32)]);
    while let Some((pos, steps)) = queue.pop_front() {
        if steps >= movement {
            continue;
        }
        for next in state.map.connected_neighbours(pos, wormhole_gen) {
            if !seen.insert(next) {
                continue;
            }
            let open = state
                .map
                .get(next)
                .is_some_and(|hex| hex.can_move_through(colour));
            if open {
                queue.push_back((next, steps + 1));
            }
        }
    }
    seen.remove(&src);
    seen.into_iter().collect()
}

/// Pick a ship to move.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveCmd {
    pub colour: Colour,
    pub phase: u32,
}

impl MoveCmd {
    pub fn new(colour: Colour, phase: u32) -> Self {
        Self { colour, phase }
    }
}

impl CmdStep for MoveCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::MoveSrc { pos, ship } => {
                let state = session.state();
                let hex = state
                    .map
                    .get(*pos)
                    .ok_or(InputError::InvalidChoice("no hex at that position"))?;
                verify_input(
                    hex.ship_count(Some(self.colour), *ship) > 0,
                    InputError::InvalidChoice("no such ship there"),
                )?;
                let race = state.team(self.colour)?.race;
                let movement = session.env().blueprint(Some(race), *ship)?.movement;
                verify_input(movement > 0, InputError::ActionNotAllowed("ship cannot move"))?;
                verify_input(
                    hex.can_move_out(self.colour),
                    InputError::ActionNotAllowed("ships are pinned"),
                )?;
                Ok(ProcessResult::then(MoveDstCmd {
                    colour: self.colour,
                    phase: self.phase,
                    src: *pos,
                    ship: *ship,
                }))
            }
            CmdInput::Reject if self.phase > 0 => Ok(ProcessResult::done()),
            CmdInput::Reject => {
                Err(InputError::ActionNotAllowed("undo to cancel the first move").into())
            }
            _ => Err(InputError::UnexpectedInput {
                expected: "move_src",
            }
            .into()),
        }
    }
}

/// Pick where the chosen ship goes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveDstCmd {
    pub colour: Colour,
    pub phase: u32,
    pub src: MapPos,
    pub ship: ShipType,
}

impl CmdStep for MoveDstCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::MoveDst { pos } => {
                let race = session.state().team(self.colour)?.race;
                let movement = session.env().blueprint(Some(race), self.ship)?.movement;
                let reachable = reachable_hexes(session.state(), self.colour, self.src, movement);
                verify_input(
                    reachable.contains(pos),
                    InputError::InvalidChoice("destination out of reach"),
                )?;
                let limit = phase_limit(session, self.colour, |rules| rules.move_rate)?;
                session.do_record(MoveRecord::new(self.colour, self.ship, self.src, *pos))?;
                let colour = self.colour;
                Ok(ProcessResult::maybe(next_phase(self.phase, limit, |phase| {
                    Cmd::from(MoveCmd::new(colour, phase))
                })))
            }
            CmdInput::Reject => Ok(ProcessResult::then(MoveCmd::new(self.colour, self.phase))),
            _ => Err(InputError::UnexpectedInput {
                expected: "move_dst",
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ExploreRecord, RecordLog};
    use crate::state::{HexId, RaceType};
    use crate::test_support::Fixture;

    const HOME: MapPos = MapPos::new(0, -2);
    const BRIDGE: MapPos = MapPos::new(0, -1);

    fn bridged_state(fixture: &Fixture) -> GameState {
        let mut state = fixture.started_state(&[(Colour::Red, RaceType::Human)]);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        session
            .do_record(ExploreRecord::new(Colour::Red, HexId(104), BRIDGE, 0, true))
            .unwrap();
        state
    }

    #[test]
    fn enemy_hexes_stop_movement() {
        let fixture = Fixture::new();
        let state = bridged_state(&fixture);

        let reachable = reachable_hexes(&state, Colour::Red, HOME, 3);
        assert_eq!(reachable, vec![BRIDGE, MapPos::ORIGIN]);
        assert_eq!(reachable_hexes(&state, Colour::Red, HOME, 1), vec![BRIDGE]);
        assert!(reachable_hexes(&state, Colour::Red, HOME, 0).is_empty());
    }

    #[test]
    fn last_move_of_the_action_ends_the_chain() {
        let fixture = Fixture::new();
        let mut state = bridged_state(&fixture);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let to_bridge = CmdInput::MoveDst { pos: BRIDGE };

        // Humans move three ships: step two is the last.
        let last = MoveDstCmd {
            colour: Colour::Red,
            phase: 2,
            src: HOME,
            ship: ShipType::Interceptor,
        };
        let result = last.process(&to_bridge, &mut session).unwrap();
        assert_eq!(result, ProcessResult::done());
        let bridge = session.state().hex(BRIDGE).unwrap();
        assert_eq!(bridge.ship_count(Some(Colour::Red), ShipType::Interceptor), 1);
        drop(session);

        // A reaction moves a single ship.
        state.team_mut(Colour::Red).unwrap().passed = true;
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let reaction = MoveDstCmd {
            colour: Colour::Red,
            phase: 0,
            src: BRIDGE,
            ship: ShipType::Interceptor,
        };
        let result = reaction
            .process(&CmdInput::MoveDst { pos: HOME }, &mut session)
            .unwrap();
        assert_eq!(result.next, None);
        assert_eq!(session.log().len(), 2);
    }

    #[test]
    fn move_then_pinned_by_guardians() {
        let fixture = Fixture::new();
        let mut state = bridged_state(&fixture);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);

        let src = CmdInput::MoveSrc {
            pos: HOME,
            ship: ShipType::Interceptor,
        };
        let result = MoveCmd::new(Colour::Red, 0).process(&src, &mut session).unwrap();
        let Some(Cmd::MoveDst(dst)) = result.next else {
            panic!("expected a destination choice");
        };
        let far = CmdInput::MoveDst {
            pos: MapPos::new(0, 2),
        };
        assert!(dst.process(&far, &mut session).is_err());

        let result = dst
            .process(&CmdInput::MoveDst { pos: MapPos::ORIGIN }, &mut session)
            .unwrap();
        // Humans move three ships per action.
        assert_eq!(result.next, Some(MoveCmd::new(Colour::Red, 1).into()));
        let centre = session.state().hex(MapPos::ORIGIN).unwrap();
        assert_eq!(centre.ship_count(Some(Colour::Red), ShipType::Interceptor), 1);
        assert!(!session.state().hex(HOME).unwrap().has_ships(Some(Colour::Red)));

        let err = MoveCmd::new(Colour::Red, 1)
            .process(
                &CmdInput::MoveSrc {
                    pos: MapPos::ORIGIN,
                    ship: ShipType::Interceptor,
                },
                &mut session,
            )
            .unwrap_err();
        assert_eq!(
            err.as_input(),
            Some(&InputError::ActionNotAllowed("ships are pinned"))
        );
    }
}
