//! HTTP transport for the remote store
//!
//! Thin blocking shim: every request carries the credential as the `auth` query
//! parameter and is bounded by the configured timeout.

use super::wire::{IndexPayload, RecordsRequest, RecordsResponse, UpdateRequest, UpdateResponse};
use super::{IndexSnapshot, PatchReceipt, RemoteStore};
use crate::changes::PendingChange;
use crate::config::RemoteConfig;
use crate::error::ApiError;
use crate::record::Record;
use crate::types::RecordId;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const INDEX_PATH: &str = "/files/index";
const ENTRIES_PATH: &str = "/files/entries";
const UPDATE_PATH: &str = "/files/update";

/// `RemoteStore` over HTTP
pub struct HttpRemote {
    client: Client,
    base_url: String,
    token: String,
    principal: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let token = config.token.clone().filter(|t| !t.is_empty()).ok_or_else(|| {
            ApiError::ConfigError(
                "remote token required (set remote.token or UUIDFS_TOKEN)".to_string(),
            )
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            principal: config.principal.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            ApiError::ConfigError(format!("Invalid remote URL {}{}: {}", self.base_url, path, e))
        })?;
        url.query_pairs_mut().append_pair("auth", &self.token);
        Ok(url)
    }

    fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text()?;
        if status != StatusCode::OK {
            return Err(ApiError::RemoteUnavailable(format!(
                "{} returned http {}: {}",
                operation,
                status.as_u16(),
                body
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", operation, e)))
    }
}

impl RemoteStore for HttpRemote {
    fn fetch_index(&self) -> Result<IndexSnapshot, ApiError> {
        let started = Instant::now();
        let response = self.client.get(self.url(INDEX_PATH)?).send()?;
        let payload: IndexPayload = Self::read_json("fetch index", response)?;
        let snapshot = payload.into_snapshot(self.principal.clone())?;
        debug!(
            entries = snapshot.entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched remote index"
        );
        Ok(snapshot)
    }

    fn fetch_records(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Record>, ApiError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let started = Instant::now();
        let response = self
            .client
            .post(self.url(ENTRIES_PATH)?)
            .json(&RecordsRequest { uuids: ids })
            .send()?;
        let records: RecordsResponse = Self::read_json("fetch records", response)?;
        debug!(
            requested = ids.len(),
            found = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched remote records"
        );
        Ok(records)
    }

    fn apply_patches(&self, changes: &[PendingChange]) -> Result<PatchReceipt, ApiError> {
        let started = Instant::now();
        let response = self
            .client
            .post(self.url(UPDATE_PATH)?)
            .json(&UpdateRequest::from_changes(changes))
            .send()?;
        let result: UpdateResponse = Self::read_json("apply patches", response)?;
        debug!(
            changes = changes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Applied patch batch"
        );
        Ok(PatchReceipt {
            applied: changes.len(),
            payload: result.payload,
        })
    }
}
