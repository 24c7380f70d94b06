//! Undo/redo command history of field-level diffs.
//!
//! Each [`HistoryEntry`] holds only the fields touched by one mutation, with
//! their values before and after. Recording a new entry clears the redo stack,
//! so there is never a branching redo after a fresh edit.

use chrono::Utc;
use serde::Serialize;

use crate::marker::{Marker, MarkerPatch};
use crate::types::{MarkerId, Timestamp};

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub marker_id: MarkerId,
    /// Values of the touched fields before the mutation.
    pub previous: MarkerPatch,
    /// Values of the touched fields after the mutation.
    pub next: MarkerPatch,
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    /// Build an entry for applying `patch` to `marker` in its current state.
    pub fn capture(marker: &Marker, patch: &MarkerPatch) -> Self {
        Self {
            marker_id: marker.id,
            previous: marker.capture(patch),
            next: patch.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// History and redo stacks.
///
/// With a `max_depth`, the oldest history entries are discarded once the
/// history stack grows past it. Without one the stacks are unbounded.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_depth: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Record a fresh mutation. Clears the redo stack.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.push_undo(entry);
    }

    /// Pop the most recent history entry.
    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop()
    }

    /// Pop the most recent redo entry.
    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Push onto the history stack without touching redo.
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push(entry);
        if let Some(max) = self.max_depth {
            if self.undo.len() > max {
                let excess = self.undo.len() - max;
                self.undo.drain(..excess);
            }
        }
    }

    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Most recent history entry, if any.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.undo.last()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
