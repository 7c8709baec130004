//! Execution history
//!
//! One entry per successfully executed instruction, holding the state right
//! after it ran. Faulting steps are never recorded.

use crate::state::Flags;
use serde::{Deserialize, Serialize};
use stackvm_spec::Word;

/// Post-step snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 1-based step number since load or reset
    pub step: u64,
    /// Instruction text, e.g. `PUSH 5`
    pub command: String,
    pub stack: Vec<Word>,
    pub pc_after: usize,
    pub flags: Flags,
    pub counter: Word,
}

/// Append-only step log
#[derive(Debug, Clone, Default)]
pub struct StepRecorder {
    entries: Vec<HistoryEntry>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }
}
