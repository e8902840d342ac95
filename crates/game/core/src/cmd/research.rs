use super::{CmdInput, CmdStep, ProcessResult};
use crate::env::OracleError;
use crate::error::{EngineError, InputError, verify_input};
use crate::record::{ResearchRecord, TradeRecord};
use crate::session::CommitSession;
use crate::state::{Colour, TechType};

/// Buy one technology from the board with science.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResearchCmd {
    pub colour: Colour,
}

impl ResearchCmd {
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }

    fn cost(&self, session: &CommitSession<'_>, tech: TechType) -> Result<u32, EngineError> {
        let state = session.state();
        let team = state.team(self.colour)?;
        verify_input(
            state.tech_board.contains_key(&tech),
            InputError::InvalidChoice("technology is not on the board"),
        )?;
        verify_input(
            !team.has_tech(tech),
            InputError::ActionNotAllowed("technology already owned"),
        )?;
        let cost = session
            .env()
            .rules()?
            .research_cost(tech, team.techs_in_class(tech.class()))
            .ok_or(OracleError::TechNotFound(tech))?;
        verify_input(
            team.storage.science >= cost as i32,
            InputError::NotEnough("science"),
        )?;
        Ok(cost)
    }
}

impl CmdStep for ResearchCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::Research { tech } => {
                let cost = self.cost(session, *tech)?;
                session.do_record(ResearchRecord::new(self.colour, *tech, cost))?;
                Ok(ProcessResult::done())
            }
            CmdInput::Reject => {
                Err(InputError::ActionNotAllowed("undo to cancel research").into())
            }
            _ => Err(InputError::UnexpectedInput {
                expected: "research",
            }
            .into()),
        }
    }
}

/// Exchange resources at the race's trade rate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeCmd {
    pub colour: Colour,
}

impl TradeCmd {
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }
}

impl CmdStep for TradeCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::Trade { from, to, count } => {
                verify_input(*count > 0, InputError::InvalidChoice("nothing to trade"))?;
                verify_input(
                    from != to,
                    InputError::InvalidChoice("cannot trade a resource for itself"),
                )?;
                let team = session.state().team(self.colour)?;
                let rate = session.env().race_rules(team.race)?.trade_rate;
                let spent = count
                    .checked_mul(rate)
                    .and_then(|spent| i32::try_from(spent).ok())
                    .ok_or(InputError::NotEnough("resources to trade"))?;
                verify_input(
                    team.storage.get(*from) >= spent,
                    InputError::NotEnough("resources to trade"),
                )?;
                let received = i32::try_from(*count)
                    .ok()
                    .and_then(|count| team.storage.get(*to).checked_add(count));
                verify_input(
                    received.is_some(),
                    InputError::InvalidChoice("trade amount too large"),
                )?;
                let spent = spent.unsigned_abs();
                session.do_record(TradeRecord::new(self.colour, *from, *to, spent, *count))?;
                Ok(ProcessResult::done())
            }
            CmdInput::Reject => Ok(ProcessResult::done()),
            _ => Err(InputError::UnexpectedInput { expected: "trade" }.into()),
        }
    }
}

/// Board technologies `colour` could research right now.
pub fn affordable_techs(
    session: &CommitSession<'_>,
    colour: Colour,
) -> Result<Vec<TechType>, EngineError> {
    let cmd = ResearchCmd::new(colour);
    let mut techs = Vec::new();
    for tech in session.state().tech_board.keys() {
        match cmd.cost(session, *tech) {
            Ok(_) => techs.push(*tech),
            Err(EngineError::Input(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(techs)
}
