use super::{PhaseStep, PhaseTransition};
use crate::cmd::Cmd;
use crate::error::{EngineError, InputError, verify_input};
use crate::game::Message;
use crate::record::{AssignTeamRecord, NoteRecord, StartGameRecord};
use crate::session::CommitSession;
use crate::state::{Colour, GameState, PlayerId, RaceType};

/// Seats pick a race and colour one after another, in turn order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChooseTeamPhase {
    /// Seat whose choice is awaited.
    pub turn: usize,
}

impl ChooseTeamPhase {
    pub fn new() -> Self {
        Self::default()
    }

    fn choose(
        &mut self,
        player: PlayerId,
        race: RaceType,
        colour: Colour,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        let state = session.state();
        let slot = state.slot_of(player).ok_or(InputError::UnknownPlayer)?;
        verify_input(slot == self.turn, InputError::NotYourTurn)?;
        verify_input(
            !state.teams.contains_key(&colour),
            InputError::ColourTaken(colour),
        )?;
        verify_input(
            state.teams.values().all(|team| team.race != race),
            InputError::RaceTaken,
        )?;
        let seats = state.team_order.len();

        session.do_record(AssignTeamRecord::new(slot, colour, race))?;
        self.turn += 1;
        if self.turn < seats {
            return Ok(PhaseTransition::None);
        }

        let tech_count = session.config().start_tech_count(seats);
        session.do_record(NoteRecord::new("All teams are chosen, the game begins"))?;
        session.do_record(StartGameRecord::new(tech_count))?;
        Ok(PhaseTransition::StartMain)
    }
}

impl PhaseStep for ChooseTeamPhase {
    fn process(
        &mut self,
        player: PlayerId,
        message: &Message,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        match message {
            Message::ChooseTeam { race, colour } => self.choose(player, *race, *colour, session),
            Message::Undo => Err(InputError::UndoUnavailable.into()),
            _ => Err(InputError::UnexpectedInput {
                expected: "choose_team",
            }
            .into()),
        }
    }

    fn active_colours(&self, _state: &GameState) -> Vec<Colour> {
        Vec::new()
    }

    fn current_cmd(&self, _colour: Colour) -> Option<&Cmd> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordLog;
    use crate::state::TeamSlot;
    use crate::test_support::{Fixture, SEED};

    fn lobby() -> GameState {
        let mut state = GameState::new(SEED);
        state.team_order = vec![TeamSlot::new(PlayerId(1)), TeamSlot::new(PlayerId(2))];
        state
    }

    #[test]
    fn seats_choose_in_order_then_game_starts() {
        let fixture = Fixture::new();
        let mut state = lobby();
        let mut log = RecordLog::new();
        let mut session = CommitSession::new(&mut state, &mut log, fixture.env(), &fixture.config);
        let mut phase = ChooseTeamPhase::new();

        let red = Message::ChooseTeam {
            race: RaceType::Human,
            colour: Colour::Red,
        };
        let err = phase.process(PlayerId(2), &red, &mut session).unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotYourTurn));

        assert_eq!(
            phase.process(PlayerId(1), &red, &mut session).unwrap(),
            PhaseTransition::None
        );

        let same_colour = Message::ChooseTeam {
            race: RaceType::Planta,
            colour: Colour::Red,
        };
        let err = phase
            .process(PlayerId(2), &same_colour, &mut session)
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::ColourTaken(Colour::Red)));
        assert_eq!(
            phase
                .process(PlayerId(2), &Message::Undo, &mut session)
                .unwrap_err()
                .as_input(),
            Some(&InputError::UndoUnavailable)
        );

        let blue = Message::ChooseTeam {
            race: RaceType::Planta,
            colour: Colour::Blue,
        };
        assert_eq!(
            phase.process(PlayerId(2), &blue, &mut session).unwrap(),
            PhaseTransition::StartMain
        );
        assert_eq!(session.state().round, 1);
        assert_eq!(session.state().map.owned_by(Colour::Blue).count(), 1);
    }
}
