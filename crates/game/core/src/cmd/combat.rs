use super::{CmdInput, CmdStep, ProcessResult};
use crate::battle::{Battle, Die};
use crate::error::{EngineError, InputError, ModelError, verify_input};
use crate::record::{AttackPopulationRecord, AttackShipsRecord, DiceRollRecord};
use crate::session::CommitSession;
use crate::state::{Colour, TechType};

fn firing_battle<'s>(
    session: &'s CommitSession<'_>,
    colour: Colour,
) -> Result<&'s Battle, EngineError> {
    let battle = session.state().battle()?;
    verify_input(
        battle.firing_colour() == Some(colour),
        InputError::NotYourTurn,
    )?;
    Ok(battle)
}

/// Roll the current group's dice.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FireCmd {
    pub colour: Colour,
}

impl FireCmd {
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }
}

impl CmdStep for FireCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::Fire => {
                let battle = firing_battle(session, self.colour)?;
                let group = battle
                    .turn()
                    .group
                    .ok_or(ModelError::Invariant("no group is firing"))?;
                let (count, damage) = battle
                    .volley()
                    .ok_or(ModelError::Invariant("no group is firing"))?;
                let population = battle.is_population_phase();
                let (_, roll) = session.do_record(DiceRollRecord::new(
                    Some(self.colour),
                    group,
                    count,
                    damage,
                ))?;
                let dice = roll.dice();
                Ok(if population {
                    ProcessResult::then(AttackPopulationCmd {
                        colour: self.colour,
                        dice,
                    })
                } else {
                    ProcessResult::then(AssignHitsCmd {
                        colour: self.colour,
                        dice,
                    })
                })
            }
            CmdInput::NeutronBomb => {
                let battle = firing_battle(session, self.colour)?;
                verify_input(
                    battle.is_population_phase(),
                    InputError::ActionNotAllowed("neutron bombs only hit population"),
                )?;
                let team = session.state().team(self.colour)?;
                verify_input(
                    team.has_tech(TechType::NeutronBomb),
                    InputError::ActionNotAllowed("technology required"),
                )?;
                let hex = session.state().hex(battle.pos)?;
                let hits = Battle::auto_destroy_population(hex);
                session.do_record(AttackPopulationRecord::new(self.colour, hits))?;
                Ok(ProcessResult::done())
            }
            _ => Err(InputError::UnexpectedInput { expected: "fire" }.into()),
        }
    }
}

/// Distribute rolled dice over enemy ships.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignHitsCmd {
    pub colour: Colour,
    pub dice: Vec<Die>,
}

impl CmdStep for AssignHitsCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        let battle = firing_battle(session, self.colour)?;
        let hits = match input {
            CmdInput::AutoAssign => battle.auto_assign_hits(&self.dice),
            CmdInput::AssignHits { hits } => battle.assign_hits(&self.dice, hits)?,
            _ => {
                return Err(InputError::UnexpectedInput {
                    expected: "assign_hits",
                }
                .into());
            }
        };
        session.do_record(AttackShipsRecord::new(hits))?;
        Ok(ProcessResult::done())
    }
}

/// Destroy population cubes with the rolled dice.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackPopulationCmd {
    pub colour: Colour,
    pub dice: Vec<Die>,
}

impl CmdStep for AttackPopulationCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        if *input != CmdInput::AutoAssign {
            return Err(InputError::UnexpectedInput {
                expected: "auto_assign",
            }
            .into());
        }
        let battle = firing_battle(session, self.colour)?;
        let hex = session.state().hex(battle.pos)?;
        let hits = battle.auto_assign_population_hits(&self.dice, hex);
        session.do_record(AttackPopulationRecord::new(self.colour, hits))?;
        Ok(ProcessResult::done())
    }
}
