// Bounded linear undo/redo over full forest snapshots.
//
// Entries are serialized snapshots, append-only up to a fixed capacity.
// Recording while the cursor sits mid-stack discards the abandoned future
// first (standard linear branch-discard); recording at capacity drops the
// oldest entry. Undo/redo only move the cursor and rehydrate; they never
// mutate stored entries.

use tracing::debug;

use crate::model::Forest;

/// Maximum retained snapshots.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    /// Index of the entry matching the live forest; `None` before the
    /// first record.
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Record the post-normalization state of a committed mutation.
    pub fn record(&mut self, forest: &Forest) {
        let keep = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.entries.truncate(keep);
        self.entries.push(forest.to_snapshot());
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.remove(0);
        }
        self.cursor = Some(self.entries.len() - 1);
        debug!(entries = self.entries.len(), "history recorded");
    }

    /// Step back one entry. No-op at the lower bound.
    pub fn undo(&mut self) -> Option<Forest> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.rehydrate(cursor - 1)
    }

    /// Step forward one entry. No-op at the upper bound.
    pub fn redo(&mut self) -> Option<Forest> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor = Some(cursor + 1);
        self.rehydrate(cursor + 1)
    }

    fn rehydrate(&self, index: usize) -> Option<Forest> {
        match Forest::from_snapshot(&self.entries[index]) {
            Ok(forest) => Some(forest),
            // A stored snapshot that fails to parse is a programming
            // error; surface it loudly in debug, act as a no-op otherwise.
            Err(err) => {
                debug_assert!(false, "unparseable history snapshot: {err}");
                None
            }
        }
    }
}
