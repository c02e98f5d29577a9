//! In-process remote store
//!
//! Applies batches the way the remote service does: in submission order, all or nothing.
//! Call counters and injectable failures make it the backend for tests and benchmarks.

use super::{IndexSnapshot, PatchReceipt, RemoteStore};
use crate::changes::PendingChange;
use crate::error::ApiError;
use crate::record::Record;
use crate::types::RecordId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Remote operation selector for counters and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    FetchIndex,
    FetchRecords,
    ApplyPatches,
}

#[derive(Debug, Default)]
struct Counters {
    fetch_index: AtomicUsize,
    fetch_records: AtomicUsize,
    apply_patches: AtomicUsize,
}

impl Counters {
    fn slot(&self, op: RemoteOp) -> &AtomicUsize {
        match op {
            RemoteOp::FetchIndex => &self.fetch_index,
            RemoteOp::FetchRecords => &self.fetch_records,
            RemoteOp::ApplyPatches => &self.apply_patches,
        }
    }
}

/// `RemoteStore` backed by an in-memory map
#[derive(Debug, Default)]
pub struct MemoryRemote {
    records: Mutex<BTreeMap<RecordId, Record>>,
    principal: Option<String>,
    /// Whether `fetch_index` ships full records alongside the path map
    index_carries_records: bool,
    latency: Option<Duration>,
    calls: Counters,
    failures: Mutex<HashMap<RemoteOp, usize>>,
    batches: Mutex<Vec<Vec<PendingChange>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, principal: &str) -> Self {
        self.principal = Some(principal.to_string());
        self
    }

    /// Ship full records with the index, as the flat HTTP index payload does
    pub fn with_records_in_index(mut self) -> Self {
        self.index_carries_records = true;
        self
    }

    /// Sleep this long inside every remote call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a record directly, bypassing the batch path
    pub fn seed(&self, record: Record) {
        self.records.lock().insert(record.id.clone(), record);
    }

    /// Make the next `count` calls of `op` fail with `RemoteUnavailable`
    pub fn fail_next(&self, op: RemoteOp, count: usize) {
        self.failures.lock().insert(op, count);
    }

    pub fn calls(&self, op: RemoteOp) -> usize {
        self.calls.slot(op).load(Ordering::SeqCst)
    }

    pub fn record(&self, id: &str) -> Option<Record> {
        self.records.lock().get(id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Every batch applied successfully, in order
    pub fn applied_batches(&self) -> Vec<Vec<PendingChange>> {
        self.batches.lock().clone()
    }

    fn enter(&self, op: RemoteOp) -> Result<(), ApiError> {
        self.calls.slot(op).fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ApiError::RemoteUnavailable(format!(
                    "injected failure for {:?}",
                    op
                )));
            }
        }
        Ok(())
    }

    fn apply_one(
        records: &mut BTreeMap<RecordId, Record>,
        change: &PendingChange,
    ) -> Result<(), ApiError> {
        match change {
            PendingChange::Add(record) => {
                records.insert(record.id.clone(), record.clone());
            }
            PendingChange::FieldPatch { id, field, value } => {
                let record = records.get_mut(id).ok_or_else(|| {
                    ApiError::RemoteUnavailable(format!("patch targets unknown id {}", id))
                })?;
                record.set_field(*field, value.clone()).map_err(|e| {
                    ApiError::RemoteUnavailable(format!("patch rejected for {}: {}", id, e))
                })?;
            }
            PendingChange::Delete(id) => {
                records.remove(id).ok_or_else(|| {
                    ApiError::RemoteUnavailable(format!("delete targets unknown id {}", id))
                })?;
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    fn fetch_index(&self) -> Result<IndexSnapshot, ApiError> {
        self.enter(RemoteOp::FetchIndex)?;
        let records: Vec<Record> = self.records.lock().values().cloned().collect();
        let mut snapshot = IndexSnapshot::from_records(records, self.principal.clone());
        if !self.index_carries_records {
            snapshot.records.clear();
        }
        Ok(snapshot)
    }

    fn fetch_records(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Record>, ApiError> {
        self.enter(RemoteOp::FetchRecords)?;
        let records = self.records.lock();
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    fn apply_patches(&self, changes: &[PendingChange]) -> Result<PatchReceipt, ApiError> {
        self.enter(RemoteOp::ApplyPatches)?;
        let mut records = self.records.lock();
        let mut staged = records.clone();
        for change in changes {
            Self::apply_one(&mut staged, change)?;
        }
        *records = staged;
        self.batches.lock().push(changes.to_vec());
        Ok(PatchReceipt {
            applied: changes.len(),
            payload: Value::from("ok"),
        })
    }
}
