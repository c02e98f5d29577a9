//! Pending Change Log
//!
//! Ordered, append-only mutations not yet acknowledged by the remote store. The remote
//! applies a batch in submission order, so entries are never merged or reordered here.

use crate::record::{Field, Record};
use crate::types::RecordId;
use serde_json::Value;
use std::collections::VecDeque;

/// One deferred mutation
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    /// Create a record
    Add(Record),
    /// Overwrite one field of an existing record
    FieldPatch {
        id: RecordId,
        field: Field,
        value: Value,
    },
    /// Delete a record
    Delete(RecordId),
}

impl PendingChange {
    pub fn patch(id: &str, field: Field, value: Value) -> Self {
        PendingChange::FieldPatch {
            id: id.to_string(),
            field,
            value,
        }
    }

    /// Identifier the change targets
    pub fn target(&self) -> &str {
        match self {
            PendingChange::Add(record) => &record.id,
            PendingChange::FieldPatch { id, .. } => id,
            PendingChange::Delete(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PendingChange::Add(_) => "add",
            PendingChange::FieldPatch { .. } => "patch",
            PendingChange::Delete(_) => "delete",
        }
    }
}

/// Ordered log of pending changes
#[derive(Debug, Default)]
pub struct ChangeLog {
    entries: VecDeque<PendingChange>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, change: PendingChange) {
        self.entries.push_back(change);
    }

    /// Take every entry, leaving the log empty
    pub fn drain(&mut self) -> Vec<PendingChange> {
        self.entries.drain(..).collect()
    }

    /// Put a failed batch back in front of anything appended since it was drained
    pub fn restore_front(&mut self, batch: Vec<PendingChange>) {
        for change in batch.into_iter().rev() {
            self.entries.push_front(change);
        }
    }

    pub fn snapshot(&self) -> Vec<PendingChange> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
