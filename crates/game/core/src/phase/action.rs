use super::{
    PhaseStep, PhaseTransition, player_colour, process_current, start_cmd, undo_last,
};
use crate::cmd::{ActionKind, Cmd, CmdStack, CmdStep, StartActionCmd, affordable_techs, explore_positions};
use crate::error::{EngineError, InputError, ModelError, verify_input};
use crate::game::Message;
use crate::record::NoteRecord;
use crate::session::CommitSession;
use crate::state::{Colour, GameState, PlayerId};
use crate::update::GameUpdate;

/// Teams take turns: one main action plus any free actions, then commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionPhase {
    /// Seat whose turn it is.
    pub turn: usize,
    pub stack: CmdStack,
}

impl ActionPhase {
    pub fn new() -> Self {
        Self::default()
    }

    fn turn_colour(&self, state: &GameState) -> Result<Colour, ModelError> {
        state
            .slot_colour(self.turn)
            .ok_or(ModelError::SlotNotFound(self.turn))
    }

    /// Whether the team already took its main action (or reaction) this turn.
    fn main_action_taken(&self) -> bool {
        self.stack.iter().any(|entry| {
            matches!(&entry.cmd, Cmd::StartAction(start) if !start.action.is_free())
        })
    }

    fn start_action(
        &mut self,
        colour: Colour,
        action: ActionKind,
        session: &mut CommitSession<'_>,
    ) -> Result<(), EngineError> {
        verify_input(self.stack.current().is_none(), InputError::CommandInProgress)?;
        let team = session.state().team(colour)?;
        if !action.is_free() {
            verify_input(
                !self.main_action_taken(),
                InputError::ActionNotAllowed("main action already taken"),
            )?;
            verify_input(
                !team.passed || action.is_reaction(),
                InputError::ActionNotAllowed("passed teams may only react"),
            )?;
        }
        match action {
            ActionKind::Explore => {
                let radius = session.config().map_radius;
                verify_input(
                    !explore_positions(session.state(), colour, radius).is_empty(),
                    InputError::ActionNotAllowed("nowhere to explore"),
                )?;
            }
            ActionKind::Colonise => verify_input(
                team.colony_ships_available() > 0,
                InputError::NotEnough("colony ships"),
            )?,
            ActionKind::Research => verify_input(
                !affordable_techs(session, colour)?.is_empty(),
                InputError::NotEnough("science"),
            )?,
            ActionKind::Build
            | ActionKind::Move
            | ActionKind::Influence
            | ActionKind::Trade
            | ActionKind::Pass => {}
        }
        start_cmd(
            &mut self.stack,
            StartActionCmd::new(colour, action).into(),
            session,
        )?;
        session.notify(GameUpdate::Choices);
        Ok(())
    }

    fn commit(
        &mut self,
        colour: Colour,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        verify_input(self.stack.current().is_none(), InputError::CommandInProgress)?;
        let passed = session.state().team(colour)?.passed;
        verify_input(
            passed || self.main_action_taken(),
            InputError::ActionNotAllowed("take an action before committing"),
        )?;

        self.stack.clear();
        session.notify(GameUpdate::Choices);
        if session.state().all_passed() {
            return Ok(PhaseTransition::FinishActions);
        }
        let seats = session.state().team_order.len().max(1);
        self.turn = (self.turn + 1) % seats;
        Ok(PhaseTransition::None)
    }
}

impl PhaseStep for ActionPhase {
    fn enter(&mut self, session: &mut CommitSession<'_>) -> Result<PhaseTransition, EngineError> {
        let round = session.state().round;
        session.do_record(NoteRecord::new(format!("Round {round} begins")))?;
        session.notify(GameUpdate::Phase);
        Ok(PhaseTransition::None)
    }

    fn process(
        &mut self,
        player: PlayerId,
        message: &Message,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        let colour = player_colour(session, player)?;
        verify_input(colour == self.turn_colour(session.state())?, InputError::NotYourTurn)?;

        match message {
            Message::StartAction { action } => {
                self.start_action(colour, *action, session)?;
                Ok(PhaseTransition::None)
            }
            Message::Cmd { input } => {
                process_current(&mut self.stack, input, session)?;
                session.notify(GameUpdate::Choices);
                Ok(PhaseTransition::None)
            }
            Message::Undo => {
                undo_last(&mut self.stack, session)?;
                session.notify(GameUpdate::Choices);
                Ok(PhaseTransition::None)
            }
            Message::Commit => self.commit(colour, session),
            Message::ChooseTeam { .. } => {
                Err(InputError::ActionNotAllowed("teams are already chosen").into())
            }
        }
    }

    fn active_colours(&self, state: &GameState) -> Vec<Colour> {
        self.turn_colour(state).into_iter().collect()
    }

    fn current_cmd(&self, colour: Colour) -> Option<&Cmd> {
        self.stack.current().filter(|cmd| cmd.colour() == colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CmdInput;
    use crate::env::Buildable;
    use crate::record::RecordLog;
    use crate::state::{Hex, HexId, MapPos, RaceType, ShipType};
    use crate::test_support::Fixture;

    const RED: PlayerId = PlayerId(1);
    const BLUE: PlayerId = PlayerId(2);

    fn two_teams(fixture: &Fixture) -> GameState {
        fixture.started_state(&[(Colour::Red, RaceType::Human), (Colour::Blue, RaceType::Planta)])
    }

    fn start(action: ActionKind) -> Message {
        Message::StartAction { action }
    }

    #[test]
    fn turn_runs_action_then_commit() {
        let fixture = Fixture::new();
        let mut state = two_teams(&fixture);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = ActionPhase::new();

        let err = phase
            .process(BLUE, &start(ActionKind::Build), &mut session)
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotYourTurn));
        let err = phase.process(RED, &Message::Commit, &mut session).unwrap_err();
        assert!(err.as_input().is_some());

        phase
            .process(RED, &start(ActionKind::Build), &mut session)
            .unwrap();
        assert!(matches!(phase.current_cmd(Colour::Red), Some(Cmd::Build(_))));
        let err = phase.process(RED, &Message::Commit, &mut session).unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::CommandInProgress));

        let build = Message::Cmd {
            input: CmdInput::Build {
                pos: MapPos::new(0, -2),
                item: Buildable::Interceptor,
            },
        };
        phase.process(RED, &build, &mut session).unwrap();
        phase
            .process(RED, &Message::Cmd { input: CmdInput::Reject }, &mut session)
            .unwrap();
        let err = phase
            .process(RED, &start(ActionKind::Move), &mut session)
            .unwrap_err();
        assert_eq!(
            err.as_input(),
            Some(&InputError::ActionNotAllowed("main action already taken"))
        );

        assert_eq!(
            phase.process(RED, &Message::Commit, &mut session).unwrap(),
            PhaseTransition::None
        );
        assert_eq!(phase.turn, 1);
        assert_eq!(phase.active_colours(session.state()), vec![Colour::Blue]);
        let home = session.state().hex(MapPos::new(0, -2)).unwrap();
        assert_eq!(home.ship_count(Some(Colour::Red), ShipType::Interceptor), 2);
    }

    #[test]
    fn influence_refreshes_colony_ships_and_places_discs() {
        let fixture = Fixture::new();
        let mut state = two_teams(&fixture);
        let bridge = MapPos::new(0, -1);
        let tile = fixture.env().tile(HexId(104)).unwrap();
        state.map.insert(Hex::from_tile(&tile, bridge, 0));
        state.team_mut(Colour::Red).unwrap().colony_ships_used = 3;
        let before = state.clone();
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = ActionPhase::new();
        let cmd = |input| Message::Cmd { input };

        phase
            .process(RED, &start(ActionKind::Influence), &mut session)
            .unwrap();
        assert!(matches!(
            phase.current_cmd(Colour::Red),
            Some(Cmd::InfluenceSrc(_))
        ));
        let team = session.state().team(Colour::Red).unwrap();
        assert_eq!((team.colony_ships_used, team.action_discs), (1, 1));

        phase
            .process(RED, &cmd(CmdInput::InfluenceSrc { pos: None }), &mut session)
            .unwrap();
        phase
            .process(
                RED,
                &cmd(CmdInput::InfluenceDst { pos: Some(bridge) }),
                &mut session,
            )
            .unwrap();
        phase
            .process(RED, &cmd(CmdInput::Reject), &mut session)
            .unwrap();
        assert_eq!(phase.current_cmd(Colour::Red), None);
        assert_eq!(session.state().hex(bridge).unwrap().owner, Some(Colour::Red));

        while phase.process(RED, &Message::Undo, &mut session).is_ok() {}
        assert!(phase.stack.is_empty());
        drop(session);
        assert_eq!(state, before);
    }

    #[test]
    fn undo_walks_back_to_before_the_action() {
        let fixture = Fixture::new();
        let mut state = two_teams(&fixture);
        let before = state.clone();
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = ActionPhase::new();

        phase
            .process(RED, &start(ActionKind::Build), &mut session)
            .unwrap();
        let build = Message::Cmd {
            input: CmdInput::Build {
                pos: MapPos::new(0, -2),
                item: Buildable::Interceptor,
            },
        };
        phase.process(RED, &build, &mut session).unwrap();

        phase.process(RED, &Message::Undo, &mut session).unwrap();
        assert!(matches!(
            phase.current_cmd(Colour::Red),
            Some(Cmd::Build(cmd)) if cmd.phase == 0
        ));
        phase.process(RED, &Message::Undo, &mut session).unwrap();
        assert_eq!(phase.current_cmd(Colour::Red), None);
        assert!(phase.stack.is_empty());
        let err = phase.process(RED, &Message::Undo, &mut session).unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NothingToUndo));
        drop(session);
        assert_eq!(state, before);
    }

    #[test]
    fn passed_teams_only_react_and_round_closes() {
        let fixture = Fixture::new();
        let mut state = two_teams(&fixture);
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = ActionPhase::new();

        phase
            .process(RED, &start(ActionKind::Pass), &mut session)
            .unwrap();
        phase.process(RED, &Message::Commit, &mut session).unwrap();

        phase
            .process(BLUE, &start(ActionKind::Build), &mut session)
            .unwrap();
        phase
            .process(
                BLUE,
                &Message::Cmd {
                    input: CmdInput::Build {
                        pos: MapPos::new(0, 2),
                        item: Buildable::Interceptor,
                    },
                },
                &mut session,
            )
            .unwrap();
        phase
            .process(BLUE, &Message::Cmd { input: CmdInput::Reject }, &mut session)
            .unwrap();
        phase.process(BLUE, &Message::Commit, &mut session).unwrap();

        let err = phase
            .process(RED, &start(ActionKind::Explore), &mut session)
            .unwrap_err();
        assert_eq!(
            err.as_input(),
            Some(&InputError::ActionNotAllowed("passed teams may only react"))
        );
        // A passed team may also just commit.
        phase.process(RED, &Message::Commit, &mut session).unwrap();

        phase
            .process(BLUE, &start(ActionKind::Pass), &mut session)
            .unwrap();
        assert_eq!(
            phase.process(BLUE, &Message::Commit, &mut session).unwrap(),
            PhaseTransition::FinishActions
        );
        assert_eq!(session.state().pass_order, vec![Colour::Red, Colour::Blue]);
    }
}
