// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo over whole annotation list snapshots.
//!
//! Every mutating editor call encodes the annotation list before and after
//! the change. A drag is one gesture and records a single pair.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Edits kept before the oldest is forgotten
pub const DEFAULT_UNDO_DEPTH: usize = 100;

/// Undo/redo failures
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Undo requested with no recorded edit
    #[error("Nothing to undo")]
    UndoEmpty,

    /// Redo requested with no undone edit
    #[error("Nothing to redo")]
    RedoEmpty,

    /// The annotation list could not be encoded or decoded
    #[error("Annotation snapshot is unreadable: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// bincode encoding of an annotation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    /// Encode `value`
    pub fn of<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self(bincode::serialize(value)?))
    }

    /// Decode the stored value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.0)?)
    }
}

/// The annotation list around one edit
#[derive(Debug, Clone)]
pub struct Edit {
    /// Shown in logs, e.g. "Move bubble"
    pub label: String,
    /// Restored by undo
    pub before: Snapshot,
    /// Restored by redo
    pub after: Snapshot,
}

impl Edit {
    /// Pair two snapshots under a label
    pub fn new(label: impl Into<String>, before: Snapshot, after: Snapshot) -> Self {
        Self {
            label: label.into(),
            before,
            after,
        }
    }
}

/// Bounded stacks of done and undone edits
#[derive(Debug)]
pub struct History {
    done: VecDeque<Edit>,
    undone: Vec<Edit>,
    depth: usize,
}

impl History {
    /// History keeping at most `depth` edits (at least one)
    pub fn with_max_depth(depth: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Record an edit and forget everything undone.
    ///
    /// An edit that leaves the list unchanged is ignored.
    pub fn commit(&mut self, edit: Edit) {
        if edit.before == edit.after {
            return;
        }
        tracing::trace!("Recording edit: {}", edit.label);
        self.undone.clear();
        self.done.push_back(edit);
        if self.done.len() > self.depth {
            self.done.pop_front();
        }
    }

    /// Move the newest edit to the redo stack and return it
    pub fn undo(&mut self) -> Result<&Edit> {
        let edit = self.done.pop_back().ok_or(HistoryError::UndoEmpty)?;
        self.undone.push(edit);
        self.undone.last().ok_or(HistoryError::UndoEmpty)
    }

    /// Move the newest undone edit back and return it
    pub fn redo(&mut self) -> Result<&Edit> {
        let edit = self.undone.pop().ok_or(HistoryError::RedoEmpty)?;
        self.done.push_back(edit);
        self.done.back().ok_or(HistoryError::RedoEmpty)
    }

    /// Whether an edit can be undone
    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    /// Whether an undone edit can be redone
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_UNDO_DEPTH)
    }
}
