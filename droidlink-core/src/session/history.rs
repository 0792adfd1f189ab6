//! Command history for the selected device

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entries kept before the oldest are dropped
pub const MAX_HISTORY_ENTRIES: usize = 200;

/// What produced a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    /// A one-shot command and its output
    Executed,
    /// A long-running command was launched
    Started,
    /// Something failed; the output holds the message
    Diagnostic,
}

/// One line of command history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Command as the user typed it
    pub command: String,
    /// Output, pid notice or failure text
    pub output: String,
    /// Entry kind
    pub kind: HistoryKind,
    /// When the entry was recorded
    pub at: DateTime<Utc>,
}

/// Bounded, oldest-first history
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::with_limit(MAX_HISTORY_ENTRIES)
    }
}

impl CommandHistory {
    /// Creates an empty history holding at most `limit` entries
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Appends an entry, dropping the oldest beyond the limit
    pub fn record(&mut self, kind: HistoryKind, command: impl Into<String>, output: impl Into<String>) {
        self.entries.push(HistoryEntry {
            command: command.into(),
            output: output.into(),
            kind,
            at: Utc::now(),
        });
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    /// Entries, oldest first
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
