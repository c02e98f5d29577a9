//! JSON shapes exchanged with the remote store over HTTP.

use super::IndexSnapshot;
use crate::changes::PendingChange;
use crate::error::ApiError;
use crate::record::codec;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const COMMAND_ADD: &str = "UUIDa";
pub const COMMAND_PATCH: &str = "UUIDr";
pub const COMMAND_DELETE: &str = "UUIDd";

/// One entry of an update batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChange {
    pub command: String,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dta: Option<Value>,
    /// 1-based field offset, present on patches only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<usize>,
}

impl From<&PendingChange> for UpdateChange {
    fn from(change: &PendingChange) -> Self {
        match change {
            PendingChange::Add(record) => UpdateChange {
                command: COMMAND_ADD.to_string(),
                uuid: record.id.clone(),
                dta: Some(Value::Array(codec::encode(record))),
                idx: None,
            },
            PendingChange::FieldPatch { id, field, value } => UpdateChange {
                command: COMMAND_PATCH.to_string(),
                uuid: id.clone(),
                dta: Some(value.clone()),
                idx: Some(field.api_offset()),
            },
            PendingChange::Delete(id) => UpdateChange {
                command: COMMAND_DELETE.to_string(),
                uuid: id.clone(),
                dta: None,
                idx: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub updates: Vec<UpdateChange>,
}

impl UpdateRequest {
    pub fn from_changes(changes: &[PendingChange]) -> Self {
        Self {
            updates: changes.iter().map(UpdateChange::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordsRequest<'a> {
    pub uuids: &'a [String],
}

pub type RecordsResponse = HashMap<String, Record>;

/// Index endpoint payload: either the flat record array or a keyed path map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndexPayload {
    Flat(Vec<Value>),
    Keyed {
        index: HashMap<String, String>,
        #[serde(default)]
        username: Option<String>,
    },
}

impl IndexPayload {
    /// Convert into a snapshot; `fallback_principal` is used when the payload names none
    pub fn into_snapshot(
        self,
        fallback_principal: Option<String>,
    ) -> Result<IndexSnapshot, ApiError> {
        match self {
            IndexPayload::Flat(values) => {
                let records = codec::decode_flat(&values)?;
                Ok(IndexSnapshot::from_records(records, fallback_principal))
            }
            IndexPayload::Keyed { index, username } => Ok(IndexSnapshot {
                entries: index.into_iter().collect(),
                principal: username.or(fallback_principal),
                records: Vec::new(),
            }),
        }
    }
}
