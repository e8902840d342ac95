//! Top-level turn lifecycle of a running game.
//!
//! A [`Phase`] decides whose input is accepted and what it may do. Each phase
//! owns the command stacks of the teams it is waiting on and reports a
//! [`PhaseTransition`] when its work is done; [`crate::LiveGame`] swaps in
//! the next phase and enters it.
mod action;
mod choose_team;
mod combat;
mod upkeep;

pub use action::ActionPhase;
pub use choose_team::ChooseTeamPhase;
pub use combat::CombatPhase;
pub use upkeep::UpkeepPhase;

use crate::cmd::{Cmd, CmdInput, CmdStack, CmdStep};
use crate::error::{EngineError, InputError};
use crate::game::Message;
use crate::session::CommitSession;
use crate::state::{Colour, GameState, PlayerId};

/// What the game should do after a phase handled a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseTransition {
    /// Stay in the current phase.
    None,
    /// Every team is chosen and the opening setup is recorded.
    StartMain,
    /// All teams passed.
    FinishActions,
    /// No contested hex is left.
    FinishCombat,
    /// Every team committed its upkeep and the round ended.
    FinishRound,
}

/// Behaviour shared by every phase.
pub trait PhaseStep {
    /// Runs when the phase becomes active.
    fn enter(&mut self, _session: &mut CommitSession<'_>) -> Result<PhaseTransition, EngineError> {
        Ok(PhaseTransition::None)
    }

    fn process(
        &mut self,
        player: PlayerId,
        message: &Message,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError>;

    /// Teams the phase is waiting on.
    fn active_colours(&self, state: &GameState) -> Vec<Colour>;

    /// Pending decision of `colour`, if any.
    fn current_cmd(&self, colour: Colour) -> Option<&Cmd>;
}

/// The active phase, tagged with `type` when serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum Phase {
    ChooseTeam(ChooseTeamPhase),
    Action(ActionPhase),
    Combat(CombatPhase),
    Upkeep(UpkeepPhase),
}

impl Phase {
    fn inner(&self) -> &dyn PhaseStep {
        match self {
            Phase::ChooseTeam(phase) => phase,
            Phase::Action(phase) => phase,
            Phase::Combat(phase) => phase,
            Phase::Upkeep(phase) => phase,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PhaseStep {
        match self {
            Phase::ChooseTeam(phase) => phase,
            Phase::Action(phase) => phase,
            Phase::Combat(phase) => phase,
            Phase::Upkeep(phase) => phase,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::ChooseTeam(_) => "choose_team",
            Phase::Action(_) => "action",
            Phase::Combat(_) => "combat",
            Phase::Upkeep(_) => "upkeep",
        }
    }
}

impl PhaseStep for Phase {
    fn enter(&mut self, session: &mut CommitSession<'_>) -> Result<PhaseTransition, EngineError> {
        self.inner_mut().enter(session)
    }

    fn process(
        &mut self,
        player: PlayerId,
        message: &Message,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        self.inner_mut().process(player, message, session)
    }

    fn active_colours(&self, state: &GameState) -> Vec<Colour> {
        self.inner().active_colours(state)
    }

    fn current_cmd(&self, colour: Colour) -> Option<&Cmd> {
        self.inner().current_cmd(colour)
    }
}

/// Colour of the team seated for `player`.
pub(crate) fn player_colour(
    session: &CommitSession<'_>,
    player: PlayerId,
) -> Result<Colour, InputError> {
    let state = session.state();
    let slot = state.slot_of(player).ok_or(InputError::UnknownPlayer)?;
    state.slot_colour(slot).ok_or(InputError::NoTeam)
}

/// Feeds `input` to the current command and records what it produced.
pub(crate) fn process_current(
    stack: &mut CmdStack,
    input: &CmdInput,
    session: &mut CommitSession<'_>,
) -> Result<(), EngineError> {
    let cmd = stack.current().cloned().ok_or(InputError::NoActiveCommand)?;
    let start = session.log().next_id();
    let result = cmd.process(input, session)?;
    stack.add_cmd(result, session.log().ids_from(start));
    drive_auto(stack, session)
}

/// Starts `cmd` and runs it immediately if it needs no input.
pub(crate) fn start_cmd(
    stack: &mut CmdStack,
    cmd: Cmd,
    session: &mut CommitSession<'_>,
) -> Result<(), EngineError> {
    stack.start_cmd(cmd);
    drive_auto(stack, session)
}

/// Processes auto commands until one needs input or the chain ends.
///
/// A failing auto command is dropped from the stack so the team can choose
/// again; it is validated before creating records, so nothing needs undoing.
fn drive_auto(stack: &mut CmdStack, session: &mut CommitSession<'_>) -> Result<(), EngineError> {
    while let Some(cmd) = stack.current().filter(|cmd| cmd.is_auto_process()).cloned() {
        let start = session.log().next_id();
        match cmd.process(&CmdInput::Auto, session) {
            Ok(result) => stack.add_cmd(result, session.log().ids_from(start)),
            Err(err) => {
                stack.discard_current();
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Reopens the latest decision on the stack, reversing its records.
///
/// Undoing past an auto command also drops it, so undo always lands on a
/// decision that takes input (or before the action started).
pub(crate) fn undo_last(
    stack: &mut CmdStack,
    session: &mut CommitSession<'_>,
) -> Result<(), EngineError> {
    let (cmd, records) = stack.remove_cmd().ok_or(InputError::NothingToUndo)?;
    for id in records.iter().rev() {
        session.undo_record(*id)?;
    }
    if cmd.is_auto_process() {
        stack.discard_current();
    }
    Ok(())
}
