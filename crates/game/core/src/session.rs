//! Transaction scope for one processed input message.
use std::collections::BTreeSet;

use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::error::ModelError;
use crate::record::{Record, RecordContext, RecordId, RecordKind, RecordLog, RecordTransition};
use crate::state::GameState;
use crate::update::{GameUpdate, UpdateSink};

/// Borrowed view of a live game while one message is processed.
///
/// Commands never touch [`GameState`] directly: every change goes through
/// [`CommitSession::do_record`], which applies the record and appends it to
/// the log in one step. The updates the records report are collected and
/// published once at [`CommitSession::finish`].
pub struct CommitSession<'a> {
    state: &'a mut GameState,
    log: &'a mut RecordLog,
    env: GameEnv<'a>,
    config: &'a GameConfig,
    updates: BTreeSet<GameUpdate>,
    /// First record id logged by this session.
    start: RecordId,
    /// Records removed by undo, most recent last.
    undone: Vec<Record>,
}

impl<'a> CommitSession<'a> {
    pub fn new(
        state: &'a mut GameState,
        log: &'a mut RecordLog,
        env: GameEnv<'a>,
        config: &'a GameConfig,
    ) -> Self {
        let start = log.next_id();
        Self {
            state,
            log,
            env,
            config,
            updates: BTreeSet::new(),
            start,
            undone: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        self.state
    }

    pub fn env(&self) -> GameEnv<'a> {
        self.env
    }

    pub fn config(&self) -> &GameConfig {
        self.config
    }

    pub fn log(&self) -> &RecordLog {
        self.log
    }

    /// Applies `record` forward and logs it.
    ///
    /// Returns the id and the record with every lazily captured value filled in.
    pub fn do_record<R>(&mut self, mut record: R) -> Result<(RecordId, R), ModelError>
    where
        R: RecordTransition + Clone + Into<RecordKind>,
    {
        let ctx = RecordContext {
            id: self.log.next_id(),
            env: self.env,
        };
        record.apply(true, self.state, &ctx)?;
        self.updates.extend(record.updates());
        let id = self.log.push(record.clone().into());
        Ok((id, record))
    }

    /// Reverses a logged record and removes it from the log.
    ///
    /// Message records have nothing to reverse and stay in the log.
    pub fn undo_record(&mut self, id: RecordId) -> Result<(), ModelError> {
        let record = self.log.get(id).ok_or(ModelError::RecordNotFound(id))?;
        if record.is_message() {
            return Ok(());
        }
        let mut record = self.log.pop_record(id)?;
        record.apply(false, self.state, self.env)?;
        self.updates.extend(record.updates());
        self.undone.push(record);
        Ok(())
    }

    /// Reverts every change made through this session.
    ///
    /// Records logged by the session are reversed newest first and their
    /// ids handed out again; records it undid are applied and logged again.
    /// Nothing is published.
    pub fn rollback(self) -> Result<(), ModelError> {
        for mut record in self.log.truncate_from(self.start).into_iter().rev() {
            if !record.is_message() {
                record.apply(false, self.state, self.env)?;
            }
        }
        for mut record in self.undone.into_iter().rev() {
            record.apply(true, self.state, self.env)?;
            self.log.restore(record);
        }
        Ok(())
    }

    pub fn notify(&mut self, update: GameUpdate) {
        self.updates.insert(update);
    }

    /// Publishes the collected updates, deduplicated and in a stable order.
    pub fn finish(self, sink: &mut dyn UpdateSink) -> Vec<GameUpdate> {
        let updates: Vec<GameUpdate> = self.updates.into_iter().collect();
        if !updates.is_empty() {
            sink.publish(&updates);
        }
        updates
    }
}
