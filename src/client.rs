//! Overlay Client
//!
//! Path-oriented operations over a remote, UUID-addressed file store. Reads resolve
//! through the local path index and record cache; mutations update both in memory and
//! append to the pending change log, which `commit` flushes as one batch.
//!
//! Locking discipline: one mutex guards the index, cache, log and principal. No remote
//! call is ever made while holding it. Remote fetches happen with the lock released and
//! their results are reconciled under the lock afterwards. Two further gates serialize
//! index loading (so the index is fetched at most once) and commits (so batches reach
//! the remote in log order).
//!
//! Every mutating operation validates everything it needs before touching state, so an
//! operation that returns an error has not changed the cache, index or log.

use crate::cache::RecordCache;
use crate::changes::{ChangeLog, PendingChange};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::ident::IdGenerator;
use crate::index::PathIndex;
use crate::path::{display_path, PathNormalizer, PathParts};
use crate::record::{Field, Record};
use crate::remote::http::HttpRemote;
use crate::remote::{PatchReceipt, RemoteStore};
use crate::types::{now_millis, RecordId};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How many times an operation re-resolves a path that changed while a fetch was in flight
const RESOLVE_ATTEMPTS: usize = 4;

#[derive(Debug, Default)]
struct ClientState {
    index: PathIndex,
    cache: RecordCache,
    log: ChangeLog,
    principal: Option<String>,
}

impl ClientState {
    fn append(&mut self, change: PendingChange) {
        debug!(
            kind = change.kind(),
            id = %change.target(),
            pending = self.log.len() + 1,
            "Appended pending change"
        );
        self.log.append(change);
    }
}

/// Result of validating a create against current state
enum CreatePlan {
    /// Ancestors that must be created, root-to-leaf, as display segments
    Ready(Vec<Vec<String>>),
    /// Some existing ancestors are not cached yet
    NeedsFetch(Vec<RecordId>),
    /// The index was invalidated since the last load
    NeedsLoad,
}

/// Stateful client over one remote store
pub struct OverlayClient {
    remote: Arc<dyn RemoteStore>,
    normalizer: PathNormalizer,
    ids: IdGenerator,
    state: Mutex<ClientState>,
    load_gate: Mutex<()>,
    commit_gate: Mutex<()>,
}

impl OverlayClient {
    pub fn new(remote: Arc<dyn RemoteStore>, normalizer: PathNormalizer) -> Self {
        Self {
            remote,
            normalizer,
            ids: IdGenerator::new(),
            state: Mutex::new(ClientState::default()),
            load_gate: Mutex::new(()),
            commit_gate: Mutex::new(()),
        }
    }

    /// Client over HTTP, configured from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let remote = HttpRemote::new(&config.remote)?;
        Ok(Self::new(
            Arc::new(remote),
            PathNormalizer::new(&config.paths.root_prefix),
        ))
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Fetch the remote index once for the client's lifetime
    ///
    /// Concurrent callers wait on the load gate instead of issuing their own fetch; the
    /// state lock is not held across the network call.
    pub fn load_index(&self) -> Result<(), ApiError> {
        if self.state.lock().index.is_loaded() {
            return Ok(());
        }

        let _gate = self.load_gate.lock();
        if self.state.lock().index.is_loaded() {
            return Ok(());
        }

        let started = Instant::now();
        let snapshot = self.remote.fetch_index()?;

        let mut state = self.state.lock();
        if state.index.is_loaded() {
            return Ok(());
        }

        let entry_count = snapshot.entries.len();
        let record_count = snapshot.records.len();
        for record in snapshot.records {
            state.cache.fill(record);
        }

        // Ids with pending changes keep their local paths when an index is reloaded.
        let touched: HashSet<RecordId> = state
            .log
            .snapshot()
            .iter()
            .map(|c| c.target().to_string())
            .collect();
        let pairs: Vec<(String, RecordId)> = snapshot
            .entries
            .into_iter()
            .filter(|(_, id)| !touched.contains(id) && !state.cache.is_deleted(id))
            .map(|(raw, id)| (self.normalizer.normalize(&raw), id))
            .collect();
        state.index.install(pairs);
        for id in &touched {
            if let Some(key) = state
                .cache
                .peek(id)
                .map(|r| self.normalizer.normalize(&r.raw_path()))
            {
                state.index.insert(key, id.clone());
            }
        }

        if state.principal.is_none() {
            state.principal = snapshot.principal;
        }

        info!(
            entries = entry_count,
            prefetched = record_count,
            paths = state.index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded remote index"
        );
        Ok(())
    }

    /// Drop the loaded index so the next operation refetches it
    ///
    /// Cached records and pending changes are kept.
    pub fn invalidate_index(&self) {
        self.state.lock().index.reset();
        debug!("Invalidated path index");
    }

    /// Acting principal, once the index is loaded
    pub fn principal(&self) -> Result<Option<String>, ApiError> {
        self.load_index()?;
        Ok(self.state.lock().principal.clone())
    }

    pub fn exists(&self, path: &str) -> Result<bool, ApiError> {
        let key = self.normalizer.normalize(path);
        self.with_loaded(|state| Ok(state.index.contains(&key)))
    }

    /// Copy of the record at `path`
    pub fn read(&self, path: &str) -> Result<Record, ApiError> {
        self.with_resolved(path, |state, _, id| {
            state
                .cache
                .get(&id)
                .ok_or_else(|| ApiError::NotFound(path.to_string()))
        })
    }

    /// Content of the file at `path`
    pub fn read_content(&self, path: &str) -> Result<String, ApiError> {
        let record = self.read(path)?;
        record.content().map(str::to_string)
    }

    /// Copy of the record with identifier `id`
    pub fn stat_by_id(&self, id: &str) -> Result<Record, ApiError> {
        self.load_index()?;
        self.ensure(id)?;
        self.state
            .lock()
            .cache
            .get(id)
            .ok_or_else(|| ApiError::NotFound(format!("record {}", id)))
    }

    /// Replace the content of an existing file
    ///
    /// Never creates: an unknown path fails with `NotFound`.
    pub fn write(&self, path: &str, content: &str) -> Result<(), ApiError> {
        self.with_resolved(path, |state, _, id| {
            let mut record = state
                .cache
                .get(&id)
                .ok_or_else(|| ApiError::NotFound(path.to_string()))?;
            if record.is_folder() {
                return Err(ApiError::TypeConflict(format!(
                    "{} is a folder, expected a file",
                    path
                )));
            }

            record.set_content(content, now_millis());
            for field in [Field::Data, Field::Edited, Field::Size] {
                state.append(PendingChange::patch(&id, field, record.field_value(field)));
            }
            state.cache.put(record);
            Ok(())
        })
    }

    /// Create a file, creating any missing ancestor folders first
    pub fn create(&self, path: &str, content: &str) -> Result<RecordId, ApiError> {
        self.create_entry(path, Some(content))
    }

    /// Create a folder, creating any missing ancestor folders first
    pub fn create_folder(&self, path: &str) -> Result<RecordId, ApiError> {
        self.create_entry(path, None)
    }

    /// Remove the record at `path`
    ///
    /// Folders are not removed recursively; their children stay in the index.
    pub fn remove(&self, path: &str) -> Result<(), ApiError> {
        let key = self.normalizer.normalize(path);
        self.with_loaded(|state| {
            let id = state
                .index
                .remove(&key)
                .ok_or_else(|| ApiError::NotFound(path.to_string()))?;
            state.cache.delete(&id);
            state.append(PendingChange::Delete(id));
            Ok(())
        })
    }

    /// Move the record at `old_path` to `new_path`
    ///
    /// `new_path` is not checked for an existing entry; whatever it mapped to is
    /// overwritten in the index. Children of a renamed folder keep their old location.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        let parts = PathParts::split(&self.normalizer, new_path)
            .ok_or_else(|| root_target_error(new_path))?;
        let new_key = self.normalizer.normalize(new_path);

        self.with_resolved(old_path, move |state, old_key, id| {
            let mut record = state
                .cache
                .get(&id)
                .ok_or_else(|| ApiError::NotFound(old_path.to_string()))?;

            if record.is_folder() {
                record.name = parts.file_name();
            } else {
                record.name = parts.name.clone();
                record.kind = parts.ext.clone();
            }
            record.location = self.normalizer.remote_location(&parts.dir);
            record.edited = now_millis();

            for field in [Field::Type, Field::Name, Field::Location, Field::Edited] {
                state.append(PendingChange::patch(&id, field, record.field_value(field)));
            }
            state.cache.put(record);
            let displaced = state
                .index
                .lookup(&new_key)
                .filter(|previous| **previous != id)
                .cloned();
            state.index.rekey(old_key, new_key.clone());
            if let Some(displaced) = displaced {
                warn!(path = %new_key, %displaced, "Rename overwrote an existing path");
            }
            Ok(())
        })
    }

    /// Names directly below `path`, computed from the loaded index
    ///
    /// Best effort: an index load failure yields an empty set.
    pub fn list_direct_children(&self, path: &str) -> BTreeSet<String> {
        let prefix = self.normalizer.normalize(path);
        match self.with_loaded(|state| Ok(state.index.children(&prefix))) {
            Ok(children) => children,
            Err(e) => {
                warn!(error = %e, "Index unavailable, listing no children");
                BTreeSet::new()
            }
        }
    }

    /// Every known path key, sorted
    pub fn list_paths(&self) -> Result<Vec<String>, ApiError> {
        self.with_loaded(|state| Ok(state.index.keys()))
    }

    /// Flush the pending log as one batch
    ///
    /// Returns `None` without contacting the remote when nothing is pending. On failure
    /// the batch goes back in front of anything appended meanwhile.
    pub fn commit(&self) -> Result<Option<PatchReceipt>, ApiError> {
        let _gate = self.commit_gate.lock();
        let batch = {
            let mut state = self.state.lock();
            if state.log.is_empty() {
                return Ok(None);
            }
            state.log.drain()
        };

        let started = Instant::now();
        match self.remote.apply_patches(&batch) {
            Ok(receipt) => {
                info!(
                    changes = batch.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Committed pending changes"
                );
                Ok(Some(receipt))
            }
            Err(e) => {
                let count = batch.len();
                self.state.lock().log.restore_front(batch);
                warn!(changes = count, error = %e, "Commit failed, changes kept for retry");
                Err(e)
            }
        }
    }

    /// Drop the cached copy of `id` so the next access refetches it
    ///
    /// Records with pending changes are kept, since the remote copy does not have those
    /// changes yet. Returns whether a cached copy was dropped.
    pub fn invalidate_record(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        if state.log.snapshot().iter().any(|c| c.target() == id) {
            debug!(id, "Kept cached record with pending changes");
            return false;
        }
        state.cache.invalidate(id).is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Copy of the pending log, in order
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.state.lock().log.snapshot()
    }

    /// Fetch `id` into the cache unless it is already there
    fn ensure(&self, id: &str) -> Result<(), ApiError> {
        {
            let state = self.state.lock();
            if state.cache.contains(id) {
                return Ok(());
            }
            if state.cache.is_deleted(id) {
                return Err(ApiError::NotFound(format!("record {}", id)));
            }
        }

        let record = self
            .remote
            .fetch_record(id)?
            .ok_or_else(|| ApiError::NotFound(format!("record {}", id)))?;
        check_record_id(id, &record)?;

        if self.state.lock().cache.fill(record) {
            debug!(id, "Cached record");
        }
        Ok(())
    }

    /// Fetch several ids in one call; every id must exist remotely
    fn ensure_many(&self, ids: &[RecordId]) -> Result<(), ApiError> {
        let found = self.remote.fetch_records(ids)?;
        if let Some(missing) = ids.iter().find(|id| !found.contains_key(*id)) {
            return Err(ApiError::NotFound(format!("record {}", missing)));
        }
        for (id, record) in &found {
            check_record_id(id, record)?;
        }
        let mut state = self.state.lock();
        for record in found.into_values() {
            state.cache.fill(record);
        }
        debug!(count = ids.len(), "Cached records");
        Ok(())
    }

    /// Resolve `path` to a cached record and run `op` under the state lock
    ///
    /// The id is re-checked after any fetch; if the path moved meanwhile, resolution is
    /// repeated.
    fn with_resolved<T, F>(&self, path: &str, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut ClientState, &str, RecordId) -> Result<T, ApiError>,
    {
        let key = self.normalizer.normalize(path);

        for _ in 0..RESOLVE_ATTEMPTS {
            self.load_index()?;
            let id = {
                let state = self.state.lock();
                if !state.index.is_loaded() {
                    continue;
                }
                state
                    .index
                    .lookup(&key)
                    .cloned()
                    .ok_or_else(|| ApiError::NotFound(path.to_string()))?
            };
            self.ensure(&id)?;

            let mut state = self.state.lock();
            if state.index.is_loaded()
                && state.index.lookup(&key) == Some(&id)
                && state.cache.contains(&id)
            {
                return op(&mut *state, &key, id);
            }
        }
        Err(ApiError::NotFound(format!(
            "{} kept changing while it was being resolved",
            path
        )))
    }

    /// Run `op` under the state lock against a loaded index
    fn with_loaded<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut ClientState) -> Result<T, ApiError>,
    {
        for _ in 0..RESOLVE_ATTEMPTS {
            self.load_index()?;
            let mut state = self.state.lock();
            if state.index.is_loaded() {
                return op(&mut *state);
            }
        }
        Err(ApiError::RemoteUnavailable(
            "index was invalidated on every load attempt".to_string(),
        ))
    }

    fn create_entry(&self, path: &str, content: Option<&str>) -> Result<RecordId, ApiError> {
        let parts =
            PathParts::split(&self.normalizer, path).ok_or_else(|| root_target_error(path))?;
        let mut segments = parts.dir.clone();
        segments.push(parts.file_name());
        let key = self.normalizer.normalize(&display_path(&segments));

        for _ in 0..RESOLVE_ATTEMPTS {
            self.load_index()?;
            let plan = {
                let state = self.state.lock();
                self.plan_create(&state, &key, &parts)?
            };
            let plan = match plan {
                CreatePlan::Ready(_) => {
                    let mut state = self.state.lock();
                    // Re-plan under the same guard that applies it.
                    match self.plan_create(&state, &key, &parts)? {
                        CreatePlan::Ready(ancestors) => {
                            return Ok(self.apply_create(&mut state, key, parts, ancestors, content));
                        }
                        other => other,
                    }
                }
                other => other,
            };
            match plan {
                CreatePlan::NeedsFetch(missing) => self.ensure_many(&missing)?,
                CreatePlan::NeedsLoad | CreatePlan::Ready(_) => {}
            }
        }
        Err(ApiError::NotFound(format!(
            "ancestors of {} kept changing while it was being created",
            path
        )))
    }

    fn plan_create(
        &self,
        state: &ClientState,
        key: &str,
        parts: &PathParts,
    ) -> Result<CreatePlan, ApiError> {
        if !state.index.is_loaded() {
            return Ok(CreatePlan::NeedsLoad);
        }
        if state.index.contains(key) {
            return Err(ApiError::AlreadyExists(key.to_string()));
        }

        let mut to_create = Vec::new();
        let mut missing = Vec::new();
        for segments in parts.ancestors() {
            let ancestor_key = self.normalizer.normalize(&display_path(&segments));
            match state.index.lookup(&ancestor_key) {
                None => to_create.push(segments),
                Some(id) => match state.cache.peek(id) {
                    Some(record) if record.is_folder() => {}
                    Some(_) => {
                        return Err(ApiError::TypeConflict(format!(
                            "{} exists and is not a folder",
                            ancestor_key
                        )))
                    }
                    None => missing.push(id.clone()),
                },
            }
        }

        if missing.is_empty() {
            Ok(CreatePlan::Ready(to_create))
        } else {
            Ok(CreatePlan::NeedsFetch(missing))
        }
    }

    fn apply_create(
        &self,
        state: &mut ClientState,
        key: String,
        parts: PathParts,
        ancestors: Vec<Vec<String>>,
        content: Option<&str>,
    ) -> RecordId {
        let now = now_millis();

        for segments in ancestors {
            let (name, dir) = match segments.split_last() {
                Some((name, dir)) => (name.clone(), dir),
                None => continue,
            };
            let id = self.fresh_id(state);
            let folder = Record::folder(id.clone(), self.normalizer.remote_location(dir), name, now);
            let folder_key = self.normalizer.normalize(&display_path(&segments));
            state.cache.put(folder.clone());
            state.index.insert(folder_key, id);
            state.append(PendingChange::Add(folder));
        }

        let id = self.fresh_id(state);
        let location = self.normalizer.remote_location(&parts.dir);
        let record = match content {
            Some(content) => Record::file(id.clone(), location, parts.name, parts.ext, content, now),
            None => Record::folder(id.clone(), location, parts.file_name(), now),
        };
        state.cache.put(record.clone());
        state.index.insert(key, id.clone());
        state.append(PendingChange::Add(record));
        id
    }

    fn fresh_id(&self, state: &ClientState) -> RecordId {
        loop {
            let id = self.ids.new_id(state.principal.as_deref());
            if !state.cache.contains(&id) && !state.cache.is_deleted(&id) {
                return id;
            }
        }
    }
}

fn root_target_error(path: &str) -> ApiError {
    ApiError::TypeConflict(format!("{} names the root folder, which has no record", path))
}

/// A fetched record must carry the identifier it was requested under
fn check_record_id(requested: &str, record: &Record) -> Result<(), ApiError> {
    if record.id == requested {
        Ok(())
    } else {
        Err(ApiError::InvalidResponse(format!(
            "requested record {} but the remote returned {}",
            requested, record.id
        )))
    }
}
