//! Player decision steps.
//!
//! A [`Cmd`] is one pending decision of one team. Processing it with a
//! matching [`CmdInput`] validates the choice, applies records through the
//! [`CommitSession`] and returns what comes next: a primary successor and a
//! queue of side decisions that run once the successor chain is done (a
//! discovery tile claimed in the middle of an exploration, for example).
//!
//! Validation always happens before the first record is created, so a
//! rejected input leaves the game untouched and the command pending.
mod action;
mod build;
mod colonise;
mod combat;
mod explore;
mod influence;
mod movement;
mod research;
mod stack;

pub use action::{ActionKind, StartActionCmd};
pub use build::BuildCmd;
pub use colonise::{ColoniseCmd, ColoniseSquaresCmd};
pub use combat::{AssignHitsCmd, AttackPopulationCmd, FireCmd};
pub use explore::{DiscoverCmd, ExploreCmd, ExploreHexCmd, explore_positions, matching_rotations};
pub use influence::{
    COLONY_SHIPS_REFRESHED, INFLUENCE_MOVES, InfluenceDstCmd, InfluenceSrcCmd, influence_targets,
};
pub use movement::{MoveCmd, MoveDstCmd, reachable_hexes};
pub use research::{ResearchCmd, TradeCmd, affordable_techs};
pub use stack::{CmdEntry, CmdStack};

use crate::battle::HitAssignment;
use crate::env::{Buildable, RaceRules};
use crate::error::EngineError;
use crate::session::CommitSession;
use crate::state::{Colour, HexId, MapPos, Resource, ShipType, TechType};

/// Payload of a player message addressed to the pending command.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum CmdInput {
    /// Drives auto-processing commands.
    Auto,
    /// Declines the pending choice, ending a repeated command early.
    Reject,
    ExplorePos { pos: MapPos },
    ExploreHex { tile: HexId, rotation: u8, influence: bool },
    /// Draws another tile to choose from.
    ExploreTake,
    Discovery { take_reward: bool },
    Build { pos: MapPos, item: Buildable },
    MoveSrc { pos: MapPos, ship: ShipType },
    MoveDst { pos: MapPos },
    Colonise { pos: MapPos },
    ColoniseSquares { placements: Vec<(usize, Resource)> },
    /// Disc to move: a hex the team influences, or `None` for the track.
    InfluenceSrc { pos: Option<MapPos> },
    /// Where the disc goes: an unowned hex, or `None` for the track.
    InfluenceDst { pos: Option<MapPos> },
    Research { tech: TechType },
    /// Buys `count` units of `to`, paying the trade rate in `from` for each.
    Trade { from: Resource, to: Resource, count: u32 },
    Fire,
    AutoAssign,
    AssignHits { hits: Vec<HitAssignment> },
    /// Destroys every population cube in the hex without rolling.
    NeutronBomb,
}

/// Outcome of processing a command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub next: Option<Cmd>,
    pub queue: Vec<Cmd>,
}

impl ProcessResult {
    pub fn done() -> Self {
        Self::default()
    }

    pub fn then(next: impl Into<Cmd>) -> Self {
        Self {
            next: Some(next.into()),
            queue: Vec::new(),
        }
    }

    pub fn maybe(next: Option<Cmd>) -> Self {
        Self {
            next,
            queue: Vec::new(),
        }
    }

    pub fn with_queue(mut self, queue: Vec<Cmd>) -> Self {
        self.queue = queue;
        self
    }
}

/// Behaviour shared by every command.
pub trait CmdStep {
    /// Team that must answer this command.
    fn colour(&self) -> Colour;

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError>;

    /// Auto-processing commands run as soon as they are started.
    fn is_auto_process(&self) -> bool {
        false
    }
}

macro_rules! cmd_kinds {
    ($($variant:ident($cmd:ty)),+ $(,)?) => {
        /// Every concrete command, tagged with `type` when serialized.
        #[derive(Clone, Debug, PartialEq, Eq)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(tag = "type")
        )]
        pub enum Cmd {
            $($variant($cmd),)+
        }

        $(
            impl From<$cmd> for Cmd {
                fn from(cmd: $cmd) -> Self {
                    Cmd::$variant(cmd)
                }
            }
        )+

        impl CmdStep for Cmd {
            fn colour(&self) -> Colour {
                match self {
                    $(Cmd::$variant(cmd) => cmd.colour(),)+
                }
            }

            fn process(
                &self,
                input: &CmdInput,
                session: &mut CommitSession<'_>,
            ) -> Result<ProcessResult, EngineError> {
                match self {
                    $(Cmd::$variant(cmd) => cmd.process(input, session),)+
                }
            }

            fn is_auto_process(&self) -> bool {
                match self {
                    $(Cmd::$variant(cmd) => cmd.is_auto_process(),)+
                }
            }
        }
    };
}

cmd_kinds! {
    StartAction(StartActionCmd),
    Explore(ExploreCmd),
    ExploreHex(ExploreHexCmd),
    Discover(DiscoverCmd),
    Build(BuildCmd),
    Move(MoveCmd),
    MoveDst(MoveDstCmd),
    Colonise(ColoniseCmd),
    ColoniseSquares(ColoniseSquaresCmd),
    Research(ResearchCmd),
    Trade(TradeCmd),
    InfluenceSrc(InfluenceSrcCmd),
    InfluenceDst(InfluenceDstCmd),
    Fire(FireCmd),
    AssignHits(AssignHitsCmd),
    AttackPopulation(AttackPopulationCmd),
}

/// Steps a team may take in one repeated command: the race rate, or a single
/// reaction step once the team has passed.
pub(crate) fn phase_limit(
    session: &CommitSession<'_>,
    colour: Colour,
    rate: impl Fn(&RaceRules) -> u32,
) -> Result<u32, EngineError> {
    let team = session.state().team(colour)?;
    if team.passed {
        return Ok(1);
    }
    let rules = session.env().race_rules(team.race)?;
    Ok(rate(&rules).max(1))
}

/// Successor of step `phase` of a repeated command, if the limit allows one.
pub(crate) fn next_phase(phase: u32, limit: u32, make: impl FnOnce(u32) -> Cmd) -> Option<Cmd> {
    (phase + 1 < limit).then(|| make(phase + 1))
}
