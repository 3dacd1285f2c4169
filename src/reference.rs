//! Reference (carry-over) tracking across header lists.
//!
//! Every compress or decompress call is one turn. A dynamic entry referenced
//! during turn `t` is stamped with `t`; during turn `t + 1` it is carried
//! over, meaning it belongs to the new header list unless it is explicitly
//! toggled off. Carry-over is always judged against the previous turn, never
//! the one in progress.
//!
//! The tracker holds only the turn counter. Watermarks live on the table
//! entries themselves, so eviction drops an entry's reference with it.

use tracing::debug;

use crate::table::{Entry, HeaderField, HeaderTable};

#[derive(Debug, Default, Clone)]
pub struct ReferenceTracker {
    turn: u64,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The turn in progress.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    fn previous(&self) -> Option<u64> {
        self.turn.checked_sub(1)
    }

    fn is_carried(&self, entry: &Entry) -> bool {
        entry.mark.is_some() && entry.mark == self.previous()
    }

    /// True if the entry at `index` was part of the previous header list and
    /// has not been toggled off since.
    pub fn is_carried_over(&self, table: &HeaderTable, index: usize) -> bool {
        table.entry(index).is_some_and(|e| self.is_carried(e))
    }

    /// Stamps the entry at `index` as referenced in the current turn.
    pub fn mark(&self, table: &mut HeaderTable, index: usize) {
        if let Some(entry) = table.entry_mut(index) {
            entry.mark = Some(self.turn);
        }
    }

    pub fn unmark(&self, table: &mut HeaderTable, index: usize) {
        if let Some(entry) = table.entry_mut(index) {
            entry.mark = None;
        }
    }

    /// Clears every carry-over mark.
    ///
    /// References made earlier in the current turn are kept.
    pub fn reset_all(&self, table: &mut HeaderTable) {
        for entry in table.entries_mut() {
            if self.is_carried(entry) {
                entry.mark = None;
            }
        }
    }

    /// Indices of all carried-over entries, in table order.
    pub fn carried_over(&self, table: &HeaderTable) -> Vec<usize> {
        table
            .entries()
            .enumerate()
            .filter(|(_, e)| self.is_carried(e))
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Inserts `field` and references it if it was stored.
    ///
    /// Carried-over entries pushed out by the insertion are appended to
    /// `released`: they still belong to the header list being processed.
    pub fn insert(
        &self,
        table: &mut HeaderTable,
        field: HeaderField,
        released: &mut Vec<HeaderField>,
    ) -> bool {
        let mut evicted = Vec::new();
        let stored = table.insert(field, &mut evicted);
        self.release(evicted, released);
        if stored {
            self.mark(table, 1);
        }
        stored
    }

    /// Applies a size update, collecting evicted carried-over entries.
    pub fn set_max_size(
        &self,
        table: &mut HeaderTable,
        size: usize,
        released: &mut Vec<HeaderField>,
    ) -> usize {
        let mut evicted = Vec::new();
        let applied = table.resize(size, &mut evicted);
        self.release(evicted, released);
        applied
    }

    fn release(&self, evicted: Vec<Entry>, released: &mut Vec<HeaderField>) {
        for entry in evicted {
            if self.is_carried(&entry) {
                debug!(field = ?entry.field, "evicted carried-over entry");
                released.push(entry.field);
            }
        }
    }

    /// Ends the turn. Entries still carried over are re-stamped and appended
    /// to `out` oldest first, then the turn counter advances.
    pub fn finish_turn(&mut self, table: &mut HeaderTable, out: &mut Vec<HeaderField>) {
        let previous = self.previous();
        for entry in table.entries_mut().rev() {
            if entry.mark.is_some() && entry.mark == previous {
                entry.mark = Some(self.turn);
                out.push(entry.field.clone());
            }
        }
        self.turn += 1;
    }
}
