use super::{Cmd, ProcessResult};
use crate::record::RecordId;

/// A command on a team's stack and the records it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CmdEntry {
    pub cmd: Cmd,
    /// Records applied when the command was processed, in order.
    pub records: Vec<RecordId>,
    /// Side commands still waiting when this command became current.
    pub queue: Vec<Cmd>,
    pub processed: bool,
}

impl CmdEntry {
    fn new(cmd: Cmd, queue: Vec<Cmd>) -> Self {
        Self {
            cmd,
            records: Vec::new(),
            queue,
            processed: false,
        }
    }
}

/// Ordered history of one team's commands within a turn.
///
/// Processed entries stay on the stack until the turn is committed so that
/// undo can reopen them one at a time. Only an unprocessed top entry is
/// current.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CmdStack {
    entries: Vec<CmdEntry>,
}

impl CmdStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The command awaiting input, if any.
    pub fn current(&self) -> Option<&Cmd> {
        self.entries
            .last()
            .filter(|entry| !entry.processed)
            .map(|entry| &entry.cmd)
    }

    pub fn start_cmd(&mut self, cmd: Cmd) {
        self.entries.push(CmdEntry::new(cmd, Vec::new()));
    }

    /// Marks the current command processed and makes its successor current.
    ///
    /// The successor is `result.next` if any, otherwise the first queued
    /// command. Newly queued commands run before older ones.
    pub fn add_cmd(&mut self, result: ProcessResult, records: Vec<RecordId>) {
        let Some(top) = self.entries.last_mut().filter(|entry| !entry.processed) else {
            return;
        };
        top.processed = true;
        top.records = records;

        let mut outstanding = result.queue;
        outstanding.extend(top.queue.iter().cloned());
        let next = match result.next {
            Some(next) => Some(next),
            None if !outstanding.is_empty() => Some(outstanding.remove(0)),
            None => None,
        };
        if let Some(next) = next {
            self.entries.push(CmdEntry::new(next, outstanding));
        }
    }

    /// Whether undo has anything to reopen.
    pub fn can_remove_cmd(&self) -> bool {
        self.entries.iter().any(|entry| entry.processed)
    }

    /// Drops an unprocessed top command and reopens the latest processed one.
    ///
    /// Returns the reopened command with the records it had produced; the
    /// caller reverses those records, newest first.
    pub fn remove_cmd(&mut self) -> Option<(Cmd, Vec<RecordId>)> {
        if !self.can_remove_cmd() {
            return None;
        }
        self.discard_current();
        let top = self.entries.last_mut()?;
        top.processed = false;
        Some((top.cmd.clone(), std::mem::take(&mut top.records)))
    }

    /// Removes the current command without processing it.
    pub fn discard_current(&mut self) -> Option<Cmd> {
        match self.entries.last() {
            Some(entry) if !entry.processed => self.entries.pop().map(|entry| entry.cmd),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &CmdEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{ActionKind, CmdStep, DiscoverCmd, ExploreCmd, StartActionCmd};
    use crate::state::{Colour, DiscoveryType, MapPos};

    fn explore(phase: u32) -> Cmd {
        ExploreCmd::new(Colour::Red, phase).into()
    }

    #[test]
    fn successor_then_queue_order() {
        let mut stack = CmdStack::new();
        stack.start_cmd(StartActionCmd::new(Colour::Red, ActionKind::Explore).into());
        stack.add_cmd(ProcessResult::then(explore(0)), vec![RecordId(1)]);
        assert_eq!(stack.current(), Some(&explore(0)));

        let discover: Cmd = DiscoverCmd::new(Colour::Red, MapPos::new(0, -1), DiscoveryType::Money).into();
        stack.add_cmd(
            ProcessResult::then(discover.clone()).with_queue(vec![explore(1)]),
            vec![RecordId(2), RecordId(3)],
        );
        assert_eq!(stack.current(), Some(&discover));

        stack.add_cmd(ProcessResult::done(), vec![RecordId(4)]);
        assert_eq!(stack.current(), Some(&explore(1)));

        stack.add_cmd(ProcessResult::done(), Vec::new());
        assert_eq!(stack.current(), None);
        assert!(!stack.is_empty());
    }

    #[test]
    fn remove_reopens_latest_processed_command() {
        let mut stack = CmdStack::new();
        assert!(!stack.can_remove_cmd());
        assert_eq!(stack.remove_cmd(), None);

        stack.start_cmd(explore(0));
        stack.add_cmd(ProcessResult::then(explore(1)), vec![RecordId(7)]);

        let (cmd, records) = stack.remove_cmd().unwrap();
        assert_eq!(cmd, explore(0));
        assert_eq!(records, vec![RecordId(7)]);
        assert_eq!(stack.current(), Some(&explore(0)));
        assert_eq!(stack.current().map(CmdStep::colour), Some(Colour::Red));
        assert!(!stack.can_remove_cmd());
    }
}
