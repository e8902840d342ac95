//! Deterministic rules engine for the Galaxy strategy game.
//!
//! `galaxy-core` holds the canonical rules and exposes pure APIs shared by
//! the runtime and offline tools. [`LiveGame`] routes player messages to the
//! active [`phase::Phase`], whose commands change [`GameState`] only through
//! reversible [`record::Record`]s. The log of applied records drives undo,
//! replay and [`Review`].
pub mod battle;
pub mod cmd;
pub mod config;
pub mod env;
pub mod error;
pub mod game;
pub mod phase;
pub mod record;
pub mod review;
pub mod session;
pub mod state;
pub mod update;

#[cfg(test)]
mod test_support;

pub use battle::{Battle, BattlePhase, Die, Group, Hit, HitAssignment, PopulationHits, Turn};
pub use cmd::{ActionKind, Cmd, CmdInput, CmdStack, CmdStep, ProcessResult};
pub use config::GameConfig;
pub use env::{
    Buildable, Env, GameEnv, OracleError, PcgRng, RaceRules, RngOracle, RulesOracle,
    ShipBlueprint, TechCost, TileDef, TileOracle,
};
pub use error::{EngineError, ErrorSeverity, GameError, InputError, ModelError};
pub use game::{GameId, GamePhase, LiveGame, Message};
pub use phase::{Phase, PhaseStep, PhaseTransition};
pub use record::{Record, RecordId, RecordKind, RecordLog};
pub use review::Review;
pub use session::CommitSession;
pub use state::{
    Colour, DiscoveryType, Edge, EdgeSet, Hex, HexId, HexRing, Map, MapPos, PlayerId, RaceType,
    Resource, ShipType, SquareType, Storage, TeamSlot, TeamState, TechClass, TechType,
};
pub use update::{CollectingSink, GameUpdate, NullSink, UpdateSink};
