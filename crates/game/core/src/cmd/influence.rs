use super::{CmdInput, CmdStep, ProcessResult, next_phase};
use crate::error::{EngineError, InputError, verify_input};
use crate::record::InfluenceRecord;
use crate::session::CommitSession;
use crate::state::{Colour, GameState, MapPos};

/// Discs one influence action may move.
pub const INFLUENCE_MOVES: u32 = 2;

/// Used colony ships an influence action turns face up.
pub const COLONY_SHIPS_REFRESHED: u32 = 2;

/// Unowned hexes `colour` may place an influence disc on.
///
/// The hex must be free of enemy ships and either hold a ship of `colour` or
/// border a hex `colour` already influences. Wormholes do not matter.
pub fn influence_targets(state: &GameState, colour: Colour) -> Vec<MapPos> {
    state
        .map
        .hexes()
        .filter(|hex| hex.owner.is_none() && hex.enemy_ship_count(colour) == 0)
        .filter(|hex| {
            hex.has_ships(Some(colour))
                || hex.pos.neighbours().any(|(_, pos)| {
                    state
                        .map
                        .get(pos)
                        .is_some_and(|neighbour| neighbour.owner == Some(colour))
                })
        })
        .map(|hex| hex.pos)
        .collect()
}

/// Pick the disc to move: a hex the team influences, or the track.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfluenceSrcCmd {
    pub colour: Colour,
    pub phase: u32,
}

impl InfluenceSrcCmd {
    pub fn new(colour: Colour, phase: u32) -> Self {
        Self { colour, phase }
    }
}

impl CmdStep for InfluenceSrcCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::InfluenceSrc { pos } => {
                let state = session.state();
                match pos {
                    Some(pos) => verify_input(
                        state
                            .map
                            .get(*pos)
                            .is_some_and(|hex| hex.owner == Some(self.colour)),
                        InputError::InvalidChoice("hex is not influenced by the team"),
                    )?,
                    None => verify_input(
                        state.team(self.colour)?.influence_discs > 0,
                        InputError::NotEnough("influence discs"),
                    )?,
                }
                Ok(ProcessResult::then(InfluenceDstCmd {
                    colour: self.colour,
                    phase: self.phase,
                    src: *pos,
                }))
            }
            // Influencing may stop at any point, even before the first disc.
            CmdInput::Reject => Ok(ProcessResult::done()),
            _ => Err(InputError::UnexpectedInput {
                expected: "influence_src",
            }
            .into()),
        }
    }
}

/// Pick where the chosen disc goes: an unowned hex, or back to the track.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfluenceDstCmd {
    pub colour: Colour,
    pub phase: u32,
    pub src: Option<MapPos>,
}

impl CmdStep for InfluenceDstCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::InfluenceDst { pos } => {
                verify_input(
                    *pos != self.src,
                    InputError::InvalidChoice("the disc has to move"),
                )?;
                if let Some(pos) = pos {
                    verify_input(
                        influence_targets(session.state(), self.colour).contains(pos),
                        InputError::InvalidChoice("hex cannot be influenced"),
                    )?;
                }
                session.do_record(InfluenceRecord::new(self.colour, self.src, *pos))?;
                let colour = self.colour;
                Ok(ProcessResult::maybe(next_phase(
                    self.phase,
                    INFLUENCE_MOVES,
                    |phase| InfluenceSrcCmd::new(colour, phase).into(),
                )))
            }
            CmdInput::Reject => Ok(ProcessResult::then(InfluenceSrcCmd::new(
                self.colour,
                self.phase,
            ))),
            _ => Err(InputError::UnexpectedInput {
                expected: "influence_dst",
            }
            .into()),
        }
    }
}
