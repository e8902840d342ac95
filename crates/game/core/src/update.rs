//! Change notifications emitted while a message is processed.
use crate::state::Colour;

/// A part of the game that changed and should be re-sent to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameUpdate {
    /// Lifecycle or phase changed.
    Phase,
    /// Team assignment or turn order changed.
    Teams,
    /// The active team or its pending command changed.
    Choices,
    Map,
    Round,
    Storage(Colour),
    Influence(Colour),
    Population(Colour),
    Ships(Colour),
    Technologies(Colour),
    TechBoard,
    Battle,
    /// A new line is visible in the game log.
    Log,
}

/// Receiver of update events at the end of a commit session.
pub trait UpdateSink {
    fn publish(&mut self, updates: &[GameUpdate]);
}

/// Sink that drops every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl UpdateSink for NullSink {
    fn publish(&mut self, _updates: &[GameUpdate]) {}
}

/// Sink that keeps every published update, handy for inspection.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    pub updates: Vec<GameUpdate>,
}

impl UpdateSink for CollectingSink {
    fn publish(&mut self, updates: &[GameUpdate]) {
        self.updates.extend_from_slice(updates);
    }
}
