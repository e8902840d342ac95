use super::{Record, RecordId, RecordKind};
use crate::error::ModelError;

/// Append-only history of applied records.
///
/// Identifiers are handed out in increasing order and never reused after a
/// record is popped by undo. Only [`RecordLog::truncate_from`] hands them out
/// again, when a rejected message is rolled back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordLog {
    records: Vec<Record>,
    next_id: u64,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the next pushed record will receive.
    pub fn next_id(&self) -> RecordId {
        RecordId(self.next_id)
    }

    pub fn push(&mut self, kind: RecordKind) -> RecordId {
        let id = self.next_id();
        self.next_id += 1;
        self.records.push(Record { id, kind });
        id
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .map(|index| &self.records[index])
    }

    /// Removes the most recent state-changing record, which must be `id`.
    ///
    /// Message records logged after it stay in place.
    pub fn pop_record(&mut self, id: RecordId) -> Result<Record, ModelError> {
        let index = self
            .records
            .iter()
            .rposition(|record| !record.is_message())
            .ok_or(ModelError::EmptyLog)?;
        let found = self.records[index].id;
        if found != id {
            return Err(ModelError::RecordMismatch {
                expected: id,
                found,
            });
        }
        Ok(self.records.remove(index))
    }

    /// Removes the records logged at or after `start` and hands their ids
    /// out again.
    pub fn truncate_from(&mut self, start: RecordId) -> Vec<Record> {
        let first = self.records.partition_point(|record| record.id < start);
        let removed = self.records.split_off(first);
        self.next_id = self.next_id.min(start.0);
        removed
    }

    /// Puts a popped record back in id order.
    pub fn restore(&mut self, record: Record) {
        let index = self.records.partition_point(|existing| existing.id < record.id);
        self.records.insert(index, record);
    }

    /// Ids of the records logged at or after `start`.
    pub fn ids_from(&self, start: RecordId) -> Vec<RecordId> {
        let first = self.records.partition_point(|record| record.id < start);
        self.records[first..].iter().map(|record| record.id).collect()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Player-visible log lines in order.
    pub fn logs(&self) -> Vec<(RecordId, String)> {
        self.records
            .iter()
            .map(|record| (record.id, record.describe()))
            .filter(|(_, line)| !line.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{NoteRecord, PassRecord};
    use crate::state::Colour;

    #[test]
    fn ids_are_never_reused() {
        let mut log = RecordLog::new();
        let first = log.push(PassRecord::new(Colour::Red).into());
        log.pop_record(first).unwrap();
        let second = log.push(PassRecord::new(Colour::Red).into());
        assert_eq!(first, RecordId(0));
        assert_eq!(second, RecordId(1));
    }

    #[test]
    fn pop_skips_trailing_messages() {
        let mut log = RecordLog::new();
        let pass = log.push(PassRecord::new(Colour::Red).into());
        let note = log.push(NoteRecord::new("battle at (0, 1)").into());

        let err = log.pop_record(note).unwrap_err();
        assert!(matches!(err, ModelError::RecordMismatch { .. }));

        let popped = log.pop_record(pass).unwrap();
        assert_eq!(popped.id, pass);
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].id, note);
        assert!(matches!(log.pop_record(note), Err(ModelError::EmptyLog)));
    }

    #[test]
    fn logs_skip_silent_records() {
        let mut log = RecordLog::new();
        log.push(NoteRecord::new("").into());
        log.push(NoteRecord::new("hello").into());
        assert_eq!(log.logs(), vec![(RecordId(1), "hello".to_string())]);
        assert!(log.get(RecordId(0)).is_some());
    }
}
