//! Snapshot-based undo history.

use crate::surface::{RasterSurface, Snapshot};
use std::collections::VecDeque;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 25;

/// Bounded stack of full pixel snapshots.
///
/// When full, pushing evicts the oldest entry; undo always pops the newest.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_capacity(MAX_UNDO_HISTORY)
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a copy of the surface (call before mutating it).
    pub fn snapshot(&mut self, surface: &dyn RasterSurface) {
        self.push(surface.snapshot());
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Restore the newest snapshot into the surface.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, surface: &mut dyn RasterSurface) -> bool {
        match self.entries.pop_back() {
            Some(snapshot) => {
                surface.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
