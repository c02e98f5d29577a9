//! Path Index
//!
//! Maps normalized path keys to record identifiers. The index is the source of truth for
//! existence and lookup. Keys must already be normalized; the client owns normalization.

use crate::types::RecordId;
use std::collections::{BTreeSet, HashMap};

/// Normalized path key -> record identifier
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: HashMap<String, RecordId>,
    loaded: bool,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Install a fetched index and mark it loaded
    ///
    /// Later pairs win when two raw paths collapse to the same key. Entries inserted
    /// locally before the load are kept unless the fetched index names the same key.
    pub fn install<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, RecordId)>,
    {
        for (key, id) in pairs {
            self.entries.insert(key, id);
        }
        self.loaded = true;
    }

    /// Forget every entry and the loaded flag
    pub fn reset(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }

    pub fn lookup(&self, key: &str) -> Option<&RecordId> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite `key`, returning the identifier it previously held
    pub fn insert(&mut self, key: String, id: RecordId) -> Option<RecordId> {
        self.entries.insert(key, id)
    }

    pub fn remove(&mut self, key: &str) -> Option<RecordId> {
        self.entries.remove(key)
    }

    /// Move the entry at `old` to `new`, overwriting whatever `new` held
    ///
    /// Callers hold the client lock for the whole call, so no reader observes both keys
    /// or neither. Returns the moved identifier, or `None` if `old` was absent.
    pub fn rekey(&mut self, old: &str, new: String) -> Option<RecordId> {
        let id = self.entries.remove(old)?;
        self.entries.insert(new, id.clone());
        Some(id)
    }

    /// First path segment after `prefix` for every key below it
    pub fn children(&self, prefix: &str) -> BTreeSet<String> {
        let base = if prefix == "/" {
            "/".to_string()
        } else {
            format!("{}/", prefix.trim_end_matches('/'))
        };
        self.entries
            .keys()
            .filter_map(|key| key.strip_prefix(base.as_str()))
            .filter_map(|rest| rest.split('/').next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Every key, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
