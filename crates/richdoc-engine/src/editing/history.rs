//! Linear undo/redo over whole-document snapshots.
//!
//! Entries are markup snapshots plus the selection at commit time. The
//! stack is bounded; pushing past the cap evicts the oldest entry. Undoing
//! and then committing a new edit truncates the redo branch, so history is
//! always a single line.

use crate::selection::Selection;

const MAX_ENTRIES: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub markup: String,
    pub selection: Option<Selection>,
}

/// Bounded snapshot stack. `index` points at the entry matching the
/// current document state; entries above it are the redo branch.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commit a new snapshot, discarding any redo branch. Evicts the
    /// oldest entry when full.
    pub fn push(&mut self, entry: HistoryEntry) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(entry);
        if self.entries.len() > MAX_ENTRIES {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    /// Overwrite the current entry in place. Used to coalesce bursts of
    /// typing into one undo step.
    pub fn replace_top(&mut self, entry: HistoryEntry) {
        match self.entries.get_mut(self.index) {
            Some(top) => *top = entry,
            None => self.push(entry),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Step back one snapshot, returning the entry to restore.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward one snapshot, returning the entry to restore.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }

    /// Drop everything and start over from one baseline snapshot.
    pub fn reset(&mut self, baseline: HistoryEntry) {
        self.entries.clear();
        self.entries.push(baseline);
        self.index = 0;
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}
