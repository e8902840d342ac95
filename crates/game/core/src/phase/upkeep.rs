use std::collections::{BTreeMap, BTreeSet};

use super::{PhaseStep, PhaseTransition, player_colour, process_current, start_cmd, undo_last};
use crate::cmd::{ActionKind, Cmd, CmdStack, StartActionCmd};
use crate::error::{EngineError, InputError, verify_input};
use crate::game::Message;
use crate::record::{EndRoundRecord, IncomeRecord, NoteRecord};
use crate::session::CommitSession;
use crate::state::{Colour, GameState, PlayerId, Resource};
use crate::update::GameUpdate;

/// Income is paid out, then every team may trade until it commits.
///
/// Teams act simultaneously, so each keeps its own command stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpkeepPhase {
    pub stacks: BTreeMap<Colour, CmdStack>,
    pub committed: BTreeSet<Colour>,
}

impl UpkeepPhase {
    pub fn new() -> Self {
        Self::default()
    }

    fn commit(
        &mut self,
        colour: Colour,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        let stack = self.stacks.entry(colour).or_default();
        verify_input(stack.current().is_none(), InputError::CommandInProgress)?;
        let team = session.state().team(colour)?;
        let rate = session.env().race_rules(team.race)?.trade_rate as i32;
        let storage = team.storage;
        let can_trade = storage.get(Resource::Science) >= rate
            || storage.get(Resource::Materials) >= rate;
        verify_input(
            storage.money >= 0 || !can_trade,
            InputError::NotEnough("money"),
        )?;

        stack.clear();
        self.committed.insert(colour);
        session.notify(GameUpdate::Choices);
        let everyone = session
            .state()
            .colours()
            .all(|colour| self.committed.contains(&colour));
        if !everyone {
            return Ok(PhaseTransition::None);
        }

        let teams = session.state().teams.len();
        let tech_count = session.config().round_tech_count(teams);
        session.do_record(EndRoundRecord::new(tech_count))?;
        session.notify(GameUpdate::Round);
        Ok(PhaseTransition::FinishRound)
    }

    /// Undo is only safe while this team's latest records are the newest
    /// state changes in the log; another team may have traded since.
    fn can_undo(stack: &CmdStack, session: &CommitSession<'_>) -> bool {
        let latest = stack
            .iter()
            .rev()
            .find(|entry| entry.processed)
            .and_then(|entry| entry.records.last().copied());
        let Some(latest) = latest else {
            return true;
        };
        let newest = session
            .log()
            .records()
            .iter()
            .rev()
            .find(|record| !record.is_message())
            .map(|record| record.id);
        newest == Some(latest)
    }
}

impl PhaseStep for UpkeepPhase {
    fn enter(&mut self, session: &mut CommitSession<'_>) -> Result<PhaseTransition, EngineError> {
        session.do_record(NoteRecord::new("Upkeep"))?;
        let colours: Vec<Colour> = session.state().colours().collect();
        for colour in colours {
            session.do_record(IncomeRecord::new(colour))?;
            self.stacks.insert(colour, CmdStack::new());
        }
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
        verify_input(
            !self.committed.contains(&colour),
            InputError::ActionNotAllowed("upkeep already committed"),
        )?;

        match message {
            Message::StartAction {
                action: ActionKind::Trade,
            } => {
                let stack = self.stacks.entry(colour).or_default();
                verify_input(stack.current().is_none(), InputError::CommandInProgress)?;
                start_cmd(
                    stack,
                    StartActionCmd::new(colour, ActionKind::Trade).into(),
                    session,
                )?;
            }
            Message::StartAction { .. } => {
                return Err(InputError::ActionNotAllowed("only trading during upkeep").into());
            }
            Message::Cmd { input } => {
                process_current(self.stacks.entry(colour).or_default(), input, session)?;
            }
            Message::Undo => {
                let stack = self.stacks.entry(colour).or_default();
                verify_input(Self::can_undo(stack, session), InputError::UndoUnavailable)?;
                undo_last(stack, session)?;
            }
            Message::Commit => return self.commit(colour, session),
            Message::ChooseTeam { .. } => {
                return Err(InputError::ActionNotAllowed("teams are already chosen").into());
            }
        }
        session.notify(GameUpdate::Choices);
        Ok(PhaseTransition::None)
    }

    fn active_colours(&self, state: &GameState) -> Vec<Colour> {
        state
            .colours()
            .filter(|colour| !self.committed.contains(colour))
            .collect()
    }

    fn current_cmd(&self, colour: Colour) -> Option<&Cmd> {
        self.stacks.get(&colour).and_then(CmdStack::current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CmdInput;
    use crate::record::RecordLog;
    use crate::state::RaceType;
    use crate::test_support::Fixture;

    const RED: PlayerId = PlayerId(1);
    const BLUE: PlayerId = PlayerId(2);

    fn upkeep_state(fixture: &Fixture) -> GameState {
        fixture.started_state(&[(Colour::Red, RaceType::Human), (Colour::Blue, RaceType::Planta)])
    }

    fn trade(from: Resource, to: Resource) -> Message {
        Message::Cmd {
            input: CmdInput::Trade { from, to, count: 1 },
        }
    }

    #[test]
    fn income_then_commits_close_the_round() {
        let fixture = Fixture::new();
        let mut state = upkeep_state(&fixture);
        let money_before = state.team(Colour::Red).unwrap().storage.money;
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = UpkeepPhase::new();

        assert_eq!(phase.enter(&mut session).unwrap(), PhaseTransition::None);
        assert!(session.state().team(Colour::Red).unwrap().storage.money > money_before);
        assert_eq!(
            phase.active_colours(session.state()),
            vec![Colour::Red, Colour::Blue]
        );

        let err = phase
            .process(RED, &Message::StartAction { action: ActionKind::Build }, &mut session)
            .unwrap_err();
        assert!(err.as_input().is_some());

        assert_eq!(
            phase.process(BLUE, &Message::Commit, &mut session).unwrap(),
            PhaseTransition::None
        );
        let err = phase
            .process(BLUE, &Message::Commit, &mut session)
            .unwrap_err();
        assert_eq!(
            err.as_input(),
            Some(&InputError::ActionNotAllowed("upkeep already committed"))
        );
        assert_eq!(
            phase.process(RED, &Message::Commit, &mut session).unwrap(),
            PhaseTransition::FinishRound
        );
        assert_eq!(session.state().round, 2);
    }

    #[test]
    fn debt_blocks_commit_while_trading_is_possible() {
        let fixture = Fixture::new();
        let mut state = upkeep_state(&fixture);
        state.team_mut(Colour::Red).unwrap().storage.money = -50;
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = UpkeepPhase::new();
        phase.enter(&mut session).unwrap();

        let err = phase.process(RED, &Message::Commit, &mut session).unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotEnough("money")));

        let science = session.state().team(Colour::Red).unwrap().storage.science;
        phase
            .process(RED, &Message::StartAction { action: ActionKind::Trade }, &mut session)
            .unwrap();
        assert!(matches!(phase.current_cmd(Colour::Red), Some(Cmd::Trade(_))));
        phase
            .process(RED, &trade(Resource::Science, Resource::Money), &mut session)
            .unwrap();
        assert_eq!(
            session.state().team(Colour::Red).unwrap().storage.science,
            science - 2
        );

        // Blue's trade now sits on top of Red's in the log.
        phase
            .process(BLUE, &Message::StartAction { action: ActionKind::Trade }, &mut session)
            .unwrap();
        phase
            .process(BLUE, &trade(Resource::Materials, Resource::Money), &mut session)
            .unwrap();
        let err = phase.process(RED, &Message::Undo, &mut session).unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::UndoUnavailable));

        phase.process(BLUE, &Message::Undo, &mut session).unwrap();
        phase.process(RED, &Message::Undo, &mut session).unwrap();
        assert_eq!(
            session.state().team(Colour::Red).unwrap().storage.science,
            science
        );
    }
}
