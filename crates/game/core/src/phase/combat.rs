use std::collections::BTreeSet;

use super::{PhaseStep, PhaseTransition, player_colour, process_current, start_cmd};
use crate::battle::PopulationHits;
use crate::cmd::{Cmd, CmdStack, CmdStep, FireCmd};
use crate::error::{EngineError, InputError, ModelError, verify_input};
use crate::game::Message;
use crate::record::{
    AttackPopulationRecord, AttackShipsRecord, DiceRollRecord, FinishBattleRecord, NoteRecord,
    StartBattleRecord,
};
use crate::session::CommitSession;
use crate::state::{Colour, GameState, MapPos, PlayerId};
use crate::update::GameUpdate;

/// Resolves every contested hex, one battle at a time in map order.
///
/// Neutral groups fire on their own; team groups wait for a `Fire` from
/// their owner. Battles cannot be undone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatPhase {
    pub stack: CmdStack,
    /// Hexes whose fighting is over for this round.
    pub resolved: BTreeSet<MapPos>,
}

impl CombatPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs battles forward until a team has to fire or no battle is left.
    fn drive(&mut self, session: &mut CommitSession<'_>) -> Result<PhaseTransition, EngineError> {
        loop {
            if self.stack.current().is_some() {
                return Ok(PhaseTransition::None);
            }

            let Some(battle) = session.state().battle.as_ref() else {
                let next = session
                    .state()
                    .contested_hexes()
                    .into_iter()
                    .find(|pos| !self.resolved.contains(pos));
                let Some(pos) = next else {
                    return Ok(PhaseTransition::FinishCombat);
                };
                session.do_record(NoteRecord::new(format!("Battle at {pos}")))?;
                session.do_record(StartBattleRecord::new(pos))?;
                continue;
            };

            if battle.is_finished() {
                let pos = battle.pos;
                let fleets_before = live_fleets(session, pos)?;
                session.do_record(FinishBattleRecord::new())?;
                // A third fleet fights the survivor, as long as someone fell.
                let hex = session.state().hex(pos)?;
                let fight_again = hex.contest().is_some_and(|contest| contest.ships)
                    && live_fleets(session, pos)? < fleets_before;
                if !fight_again {
                    self.resolved.insert(pos);
                }
                continue;
            }

            let group = battle
                .turn()
                .group
                .ok_or(ModelError::Invariant("no group is firing"))?;
            match battle.firing_colour() {
                Some(colour) if battle.is_population_phase() => {
                    let hex = session.state().hex(battle.pos)?;
                    if hex.has_population() {
                        self.stack.clear();
                        start_cmd(&mut self.stack, FireCmd::new(colour).into(), session)?;
                    } else {
                        session.do_record(AttackPopulationRecord::new(
                            colour,
                            PopulationHits::default(),
                        ))?;
                    }
                }
                Some(colour) => {
                    self.stack.clear();
                    start_cmd(&mut self.stack, FireCmd::new(colour).into(), session)?;
                }
                None => {
                    let (count, damage) = battle
                        .volley()
                        .ok_or(ModelError::Invariant("no group is firing"))?;
                    let (_, roll) =
                        session.do_record(DiceRollRecord::new(None, group, count, damage))?;
                    let hits = session.state().battle()?.auto_assign_hits(&roll.dice());
                    session.do_record(AttackShipsRecord::new(hits))?;
                }
            }
        }
    }
}

fn live_fleets(session: &CommitSession<'_>, pos: MapPos) -> Result<usize, ModelError> {
    let hex = session.state().hex(pos)?;
    Ok(hex.fleets.iter().filter(|fleet| !fleet.is_empty()).count())
}

impl PhaseStep for CombatPhase {
    fn enter(&mut self, session: &mut CommitSession<'_>) -> Result<PhaseTransition, EngineError> {
        session.notify(GameUpdate::Phase);
        self.drive(session)
    }

    fn process(
        &mut self,
        player: PlayerId,
        message: &Message,
        session: &mut CommitSession<'_>,
    ) -> Result<PhaseTransition, EngineError> {
        let colour = player_colour(session, player)?;
        let firing = session
            .state()
            .battle
            .as_ref()
            .and_then(|battle| battle.firing_colour());
        verify_input(firing == Some(colour), InputError::NotYourTurn)?;

        match message {
            Message::Cmd { input } => {
                process_current(&mut self.stack, input, session)?;
                if self.stack.current().is_none() {
                    self.stack.clear();
                }
                session.notify(GameUpdate::Choices);
                self.drive(session)
            }
            Message::Undo => Err(InputError::UndoUnavailable.into()),
            _ => Err(InputError::ActionNotAllowed("a battle is being fought").into()),
        }
    }

    fn active_colours(&self, _state: &GameState) -> Vec<Colour> {
        self.stack.current().map(CmdStep::colour).into_iter().collect()
    }

    fn current_cmd(&self, colour: Colour) -> Option<&Cmd> {
        self.stack.current().filter(|cmd| cmd.colour() == colour)
    }
}
