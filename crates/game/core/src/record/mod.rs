//! Reversible state mutations.
//!
//! A record is the only way [`GameState`] changes once a game is running.
//! Every record implements [`RecordTransition::apply`] for both directions:
//! applying it forward and then backward restores the state exactly. Values
//! that are only known when the record first runs (dice faces, drawn tiles,
//! shuffled piles, the battle turn it replaced) are captured on the record at
//! that moment and reused when it is reversed or replayed.
mod action;
mod combat;
mod explore;
mod fleet;
mod influence;
mod log;
mod setup;

use std::fmt;

pub use action::{ActionRecord, EndRoundRecord, IncomeRecord, PassRecord};
pub use combat::{
    AttackPopulationRecord, AttackShipsRecord, DiceRollRecord, FinishBattleRecord,
    StartBattleRecord,
};
pub use explore::{DiscardHexRecord, DiscoveryRecord, DrawHexRecord, ExploreRecord};
pub use fleet::{BuildRecord, ColoniseRecord, MoveRecord, ResearchRecord, TradeRecord};
pub use influence::{InfluenceRecord, RefreshColonyShipsRecord};
pub use log::RecordLog;
pub use setup::{AssignTeamRecord, NoteRecord, StartGameRecord};

use crate::env::GameEnv;
use crate::error::ModelError;
use crate::state::GameState;
use crate::update::GameUpdate;

/// Log-assigned record identifier, monotonically increasing and never reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Read-only facts available while a record is applied.
#[derive(Clone, Copy)]
pub struct RecordContext<'a> {
    pub id: RecordId,
    pub env: GameEnv<'a>,
}

/// Defines how a concrete record mutates game state in both directions.
pub trait RecordTransition {
    /// Applies (`forward == true`) or reverts the mutation.
    ///
    /// Reverting must use only data stored on the record, so implementations
    /// capture anything computed during the first forward application.
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError>;

    /// Log line for players; empty when nothing is player-visible.
    fn describe(&self) -> String {
        String::new()
    }

    /// Informational records never mutate state and are skipped by undo.
    fn is_message(&self) -> bool {
        false
    }

    /// Parts of the game this record changes.
    fn updates(&self) -> Vec<GameUpdate> {
        Vec::new()
    }
}

macro_rules! record_kinds {
    ($($variant:ident($record:ty)),+ $(,)?) => {
        /// Every concrete record, tagged with `type` when serialized.
        #[derive(Clone, Debug, PartialEq, Eq)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(tag = "type")
        )]
        pub enum RecordKind {
            $($variant($record),)+
        }

        $(
            impl From<$record> for RecordKind {
                fn from(record: $record) -> Self {
                    RecordKind::$variant(record)
                }
            }
        )+

        impl RecordTransition for RecordKind {
            fn apply(
                &mut self,
                forward: bool,
                state: &mut GameState,
                ctx: &RecordContext<'_>,
            ) -> Result<(), ModelError> {
                match self {
                    $(RecordKind::$variant(record) => record.apply(forward, state, ctx),)+
                }
            }

            fn describe(&self) -> String {
                match self {
                    $(RecordKind::$variant(record) => record.describe(),)+
                }
            }

            fn is_message(&self) -> bool {
                match self {
                    $(RecordKind::$variant(record) => record.is_message(),)+
                }
            }

            fn updates(&self) -> Vec<GameUpdate> {
                match self {
                    $(RecordKind::$variant(record) => record.updates(),)+
                }
            }
        }
    };
}

record_kinds! {
    AssignTeam(AssignTeamRecord),
    StartGame(StartGameRecord),
    Note(NoteRecord),
    Action(ActionRecord),
    Pass(PassRecord),
    DrawHex(DrawHexRecord),
    DiscardHex(DiscardHexRecord),
    Explore(ExploreRecord),
    Discovery(DiscoveryRecord),
    Build(BuildRecord),
    Move(MoveRecord),
    Colonise(ColoniseRecord),
    Research(ResearchRecord),
    Trade(TradeRecord),
    Influence(InfluenceRecord),
    RefreshColonyShips(RefreshColonyShipsRecord),
    StartBattle(StartBattleRecord),
    DiceRoll(DiceRollRecord),
    AttackShips(AttackShipsRecord),
    AttackPopulation(AttackPopulationRecord),
    FinishBattle(FinishBattleRecord),
    Income(IncomeRecord),
    EndRound(EndRoundRecord),
}

/// A logged record.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
}

impl Record {
    pub fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        env: GameEnv<'_>,
    ) -> Result<(), ModelError> {
        let ctx = RecordContext { id: self.id, env };
        self.kind.apply(forward, state, &ctx)
    }

    pub fn describe(&self) -> String {
        self.kind.describe()
    }

    pub fn is_message(&self) -> bool {
        self.kind.is_message()
    }

    pub fn updates(&self) -> Vec<GameUpdate> {
        self.kind.updates()
    }
}

/// Returns the value captured on a record, failing if it was never captured.
pub(crate) fn captured<'a, T>(
    value: &'a Option<T>,
    what: &'static str,
) -> Result<&'a T, ModelError> {
    value.as_ref().ok_or(ModelError::NotCaptured(what))
}
