//! Record Cache
//!
//! Partial view of remote records keyed by identifier. Absence means "not fetched yet",
//! not "does not exist"; only tombstoned ids are known not to exist.

use crate::record::Record;
use crate::types::RecordId;
use std::collections::{HashMap, HashSet};

/// Identifier -> full record, plus ids deleted locally
#[derive(Debug, Default)]
pub struct RecordCache {
    records: HashMap<RecordId, Record>,
    tombstones: HashSet<RecordId>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned copy of a cached record
    pub fn get(&self, id: &str) -> Option<Record> {
        self.records.get(id).cloned()
    }

    pub fn peek(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Store `record`, replacing the cached copy wholesale
    pub fn put(&mut self, record: Record) {
        self.tombstones.remove(&record.id);
        self.records.insert(record.id.clone(), record);
    }

    /// Store a fetched record unless the cache already holds or has deleted it
    ///
    /// Returns true when the record was inserted.
    pub fn fill(&mut self, record: Record) -> bool {
        if self.records.contains_key(&record.id) || self.tombstones.contains(&record.id) {
            return false;
        }
        self.records.insert(record.id.clone(), record);
        true
    }

    /// Drop a cached record so the next `ensure` refetches it
    pub fn invalidate(&mut self, id: &str) -> Option<Record> {
        self.records.remove(id)
    }

    /// Drop a record and remember it was deleted locally
    pub fn delete(&mut self, id: &str) -> Option<Record> {
        self.tombstones.insert(id.to_string());
        self.records.remove(id)
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.tombstones.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
