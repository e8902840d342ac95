use super::{
    BuildCmd, COLONY_SHIPS_REFRESHED, CmdInput, CmdStep, ColoniseCmd, ExploreCmd, InfluenceSrcCmd,
    MoveCmd, ProcessResult, ResearchCmd, TradeCmd,
};
use crate::error::{EngineError, InputError};
use crate::record::{ActionRecord, PassRecord, RefreshColonyShipsRecord};
use crate::session::CommitSession;
use crate::state::Colour;

/// What a team chose to do with its turn.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ActionKind {
    Explore,
    Research,
    Build,
    Move,
    Influence,
    Colonise,
    Trade,
    Pass,
}

impl ActionKind {
    /// Free actions may be taken any number of times besides the main action.
    pub const fn is_free(self) -> bool {
        matches!(self, ActionKind::Colonise | ActionKind::Trade)
    }

    /// Main actions that move an influence disc to the action track.
    pub const fn uses_disc(self) -> bool {
        matches!(
            self,
            ActionKind::Explore
                | ActionKind::Research
                | ActionKind::Build
                | ActionKind::Move
                | ActionKind::Influence
        )
    }

    /// Actions a team that already passed may still take as a reaction.
    pub const fn is_reaction(self) -> bool {
        matches!(self, ActionKind::Build | ActionKind::Move)
    }
}

/// Records the start of an action and opens its first decision.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartActionCmd {
    pub colour: Colour,
    pub action: ActionKind,
}

impl StartActionCmd {
    pub fn new(colour: Colour, action: ActionKind) -> Self {
        Self { colour, action }
    }
}

impl CmdStep for StartActionCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        if *input != CmdInput::Auto {
            return Err(InputError::UnexpectedInput { expected: "auto" }.into());
        }
        let colour = self.colour;
        if self.action.uses_disc() {
            let team = session.state().team(colour)?;
            if team.influence_discs == 0 {
                return Err(InputError::NotEnough("influence discs").into());
            }
            session.do_record(ActionRecord::new(colour, self.action))?;
        }

        Ok(match self.action {
            ActionKind::Explore => ProcessResult::then(ExploreCmd::new(colour, 0)),
            ActionKind::Research => ProcessResult::then(ResearchCmd::new(colour)),
            ActionKind::Build => ProcessResult::then(BuildCmd::new(colour, 0)),
            ActionKind::Move => ProcessResult::then(MoveCmd::new(colour, 0)),
            ActionKind::Influence => {
                if session.state().team(colour)?.colony_ships_used > 0 {
                    session.do_record(RefreshColonyShipsRecord::new(
                        colour,
                        COLONY_SHIPS_REFRESHED,
                    ))?;
                }
                ProcessResult::then(InfluenceSrcCmd::new(colour, 0))
            }
            ActionKind::Colonise => ProcessResult::then(ColoniseCmd::new(colour)),
            ActionKind::Trade => ProcessResult::then(TradeCmd::new(colour)),
            ActionKind::Pass => {
                session.do_record(PassRecord::new(colour))?;
                ProcessResult::done()
            }
        })
    }

    fn is_auto_process(&self) -> bool {
        true
    }
}
