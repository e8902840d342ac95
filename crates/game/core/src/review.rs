//! Read-only stepping through a game's history.
use crate::env::GameEnv;
use crate::error::ModelError;
use crate::record::Record;
use crate::state::GameState;

/// Cursor over a copy of the record log.
///
/// Moving the cursor applies records forward or reverses them on a private
/// state, so the live game is never touched.
#[derive(Clone, Debug)]
pub struct Review {
    records: Vec<Record>,
    /// Number of records applied to `state`.
    position: usize,
    state: GameState,
}

impl Review {
    /// Starts at the beginning of the history.
    pub fn new(initial: GameState, records: Vec<Record>) -> Self {
        Self {
            records,
            position: 0,
            state: initial,
        }
    }

    /// Applies the next record. Returns `false` at the end of the history.
    pub fn advance(&mut self, env: GameEnv<'_>) -> Result<bool, ModelError> {
        let Some(record) = self.records.get_mut(self.position) else {
            return Ok(false);
        };
        record.apply(true, &mut self.state, env)?;
        self.position += 1;
        Ok(true)
    }

    /// Reverses the last applied record. Returns `false` at the start.
    pub fn retreat(&mut self, env: GameEnv<'_>) -> Result<bool, ModelError> {
        if self.position == 0 {
            return Ok(false);
        }
        self.position -= 1;
        self.records[self.position].apply(false, &mut self.state, env)?;
        Ok(true)
    }

    /// Moves to `target` applied records, clamped to the history length.
    pub fn seek(&mut self, target: usize, env: GameEnv<'_>) -> Result<(), ModelError> {
        let target = target.min(self.records.len());
        while self.position < target {
            self.advance(env)?;
        }
        while self.position > target {
            self.retreat(env)?;
        }
        Ok(())
    }

    /// Skips message records so each step shows a visible change.
    pub fn step_forward(&mut self, env: GameEnv<'_>) -> Result<bool, ModelError> {
        while self.advance(env)? {
            if !self.records[self.position - 1].is_message() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn step_back(&mut self, env: GameEnv<'_>) -> Result<bool, ModelError> {
        while self.retreat(env)? {
            if !self.records[self.position].is_message() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Log line of the record last applied.
    pub fn current_line(&self) -> Option<String> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.records.get(index))
            .map(Record::describe)
    }
}
