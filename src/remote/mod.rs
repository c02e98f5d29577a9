//! Remote store boundary
//!
//! The remote service is reachable only through three operations: fetch the index,
//! fetch records by id, and apply an ordered batch of changes atomically.

pub mod http;
pub mod memory;
pub mod wire;

use crate::changes::PendingChange;
use crate::error::ApiError;
use crate::record::Record;
use crate::types::RecordId;
use serde_json::Value;
use std::collections::HashMap;

/// Result of one index fetch
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    /// Raw (un-normalized) path and identifier pairs
    pub entries: Vec<(String, RecordId)>,
    /// Acting principal, when the remote reports one
    pub principal: Option<String>,
    /// Full records, when the remote sends them along with the index
    pub records: Vec<Record>,
}

impl IndexSnapshot {
    /// Build a snapshot from full records, deriving each raw path from its fields
    pub fn from_records(records: Vec<Record>, principal: Option<String>) -> Self {
        let entries = records
            .iter()
            .map(|r| (r.raw_path(), r.id.clone()))
            .collect();
        Self {
            entries,
            principal,
            records,
        }
    }
}

/// Opaque acknowledgement of an applied batch
#[derive(Debug, Clone, PartialEq)]
pub struct PatchReceipt {
    pub applied: usize,
    pub payload: Value,
}

/// Blocking access to the remote store
pub trait RemoteStore: Send + Sync {
    fn fetch_index(&self) -> Result<IndexSnapshot, ApiError>;

    /// Fetch records by id. Ids missing from the result do not exist remotely.
    fn fetch_records(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Record>, ApiError>;

    /// Apply a batch in order. Any error means nothing was applied.
    fn apply_patches(&self, changes: &[PendingChange]) -> Result<PatchReceipt, ApiError>;

    fn fetch_record(&self, id: &str) -> Result<Option<Record>, ApiError> {
        let mut found = self.fetch_records(&[id.to_string()])?;
        Ok(found.remove(id))
    }
}
