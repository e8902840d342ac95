//! Common error infrastructure for galaxy-core.
//!
//! Every engine entry point returns [`EngineError`], which splits failures in
//! two families with very different handling:
//!
//! - [`InputError`]: a player submitted something the rules do not allow. The
//!   input is rejected before any record is created and the pending command
//!   stays pending.
//! - [`ModelError`]: an internal invariant was broken (a record that cannot be
//!   reversed, a battle that does not exist, a log that does not match). These
//!   are never turned into user-facing behaviour; callers log them and stop
//!   processing the game.
use crate::env::OracleError;
use crate::record::RecordId;
use crate::state::{Colour, HexRing, MapPos};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: the player can try another input right away
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: unrecoverable errors indicating corrupted game state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all galaxy-core errors.
///
/// Provides a uniform interface for error classification across the crate.
/// Error enums derive `thiserror::Error` for Display and implement this trait
/// for severity and a stable code usable in logs and tests.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Rejection of a player input.
///
/// Carries a short diagnostic that is returned to the offending player only.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("game has already started")]
    AlreadyStarted,

    #[error("game has not started")]
    NotStarted,

    #[error("game is over")]
    GameOver,

    #[error("game is full")]
    GameFull,

    #[error("player is not part of this game")]
    UnknownPlayer,

    #[error("player has already joined")]
    AlreadyJoined,

    #[error("only the game owner can do that")]
    NotOwner,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("no team chosen yet")]
    NoTeam,

    #[error("colour {0} is already taken")]
    ColourTaken(Colour),

    #[error("race is already taken")]
    RaceTaken,

    #[error("no command is waiting for input")]
    NoActiveCommand,

    #[error("finish the current command first")]
    CommandInProgress,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("undo is not available in this phase")]
    UndoUnavailable,

    #[error("unexpected input, expected {expected}")]
    UnexpectedInput { expected: &'static str },

    #[error("action not allowed: {0}")]
    ActionNotAllowed(&'static str),

    #[error("invalid choice: {0}")]
    InvalidChoice(&'static str),

    #[error("not enough {0}")]
    NotEnough(&'static str),
}

impl GameError for InputError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotYourTurn | Self::CommandInProgress | Self::NotEnough(_) => {
                ErrorSeverity::Recoverable
            }
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyStarted => "INPUT_ALREADY_STARTED",
            Self::NotStarted => "INPUT_NOT_STARTED",
            Self::GameOver => "INPUT_GAME_OVER",
            Self::GameFull => "INPUT_GAME_FULL",
            Self::UnknownPlayer => "INPUT_UNKNOWN_PLAYER",
            Self::AlreadyJoined => "INPUT_ALREADY_JOINED",
            Self::NotOwner => "INPUT_NOT_OWNER",
            Self::NotYourTurn => "INPUT_NOT_YOUR_TURN",
            Self::NoTeam => "INPUT_NO_TEAM",
            Self::ColourTaken(_) => "INPUT_COLOUR_TAKEN",
            Self::RaceTaken => "INPUT_RACE_TAKEN",
            Self::NoActiveCommand => "INPUT_NO_ACTIVE_COMMAND",
            Self::CommandInProgress => "INPUT_COMMAND_IN_PROGRESS",
            Self::NothingToUndo => "INPUT_NOTHING_TO_UNDO",
            Self::UndoUnavailable => "INPUT_UNDO_UNAVAILABLE",
            Self::UnexpectedInput { .. } => "INPUT_UNEXPECTED",
            Self::ActionNotAllowed(_) => "INPUT_ACTION_NOT_ALLOWED",
            Self::InvalidChoice(_) => "INPUT_INVALID_CHOICE",
            Self::NotEnough(_) => "INPUT_NOT_ENOUGH",
        }
    }
}

/// Internal invariant violation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("team {0} not found")]
    TeamNotFound(Colour),

    #[error("team slot {0} not found")]
    SlotNotFound(usize),

    #[error("no hex at {0}")]
    HexNotFound(MapPos),

    #[error("hex already placed at {0}")]
    HexOccupied(MapPos),

    #[error("{ring} hex pile is empty")]
    PileEmpty { ring: HexRing },

    #[error("no battle in progress")]
    NoBattle,

    #[error("a battle is already in progress")]
    BattleInProgress,

    #[error("record log is empty")]
    EmptyLog,

    #[error("record {0} not found in log")]
    RecordNotFound(RecordId),

    #[error("expected to pop record {expected}, found {found}")]
    RecordMismatch { expected: RecordId, found: RecordId },

    #[error("record reversed before its values were captured: {0}")]
    NotCaptured(&'static str),

    #[error("replayed record diverged: {0}")]
    ReplayDiverged(&'static str),

    #[error("invariant violated: {0}")]
    Invariant(&'static str),
}

impl GameError for ModelError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Oracle(err) => err.severity(),
            Self::RecordMismatch { .. }
            | Self::RecordNotFound(_)
            | Self::EmptyLog
            | Self::ReplayDiverged(_) => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Oracle(err) => err.error_code(),
            Self::TeamNotFound(_) => "MODEL_TEAM_NOT_FOUND",
            Self::SlotNotFound(_) => "MODEL_SLOT_NOT_FOUND",
            Self::HexNotFound(_) => "MODEL_HEX_NOT_FOUND",
            Self::HexOccupied(_) => "MODEL_HEX_OCCUPIED",
            Self::PileEmpty { .. } => "MODEL_PILE_EMPTY",
            Self::NoBattle => "MODEL_NO_BATTLE",
            Self::BattleInProgress => "MODEL_BATTLE_IN_PROGRESS",
            Self::EmptyLog => "MODEL_EMPTY_LOG",
            Self::RecordNotFound(_) => "MODEL_RECORD_NOT_FOUND",
            Self::RecordMismatch { .. } => "MODEL_RECORD_MISMATCH",
            Self::NotCaptured(_) => "MODEL_NOT_CAPTURED",
            Self::ReplayDiverged(_) => "MODEL_REPLAY_DIVERGED",
            Self::Invariant(_) => "MODEL_INVARIANT",
        }
    }
}

/// Error returned by every engine entry point.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<OracleError> for EngineError {
    fn from(err: OracleError) -> Self {
        Self::Model(ModelError::Oracle(err))
    }
}

impl EngineError {
    /// Returns the input rejection, if this is one.
    pub fn as_input(&self) -> Option<&InputError> {
        match self {
            Self::Input(err) => Some(err),
            Self::Model(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Input(err) => err.severity(),
            Self::Model(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Input(err) => err.error_code(),
            Self::Model(err) => err.error_code(),
        }
    }
}

/// Rejects the input with `err` unless `cond` holds.
#[inline]
pub(crate) fn verify_input(cond: bool, err: InputError) -> Result<(), InputError> {
    if cond { Ok(()) } else { Err(err) }
}

/// Fails with an invariant violation unless `cond` holds.
#[inline]
pub(crate) fn verify_model(cond: bool, what: &'static str) -> Result<(), ModelError> {
    if cond {
        Ok(())
    } else {
        Err(ModelError::Invariant(what))
    }
}
