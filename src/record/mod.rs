//! File and folder records
//!
//! A record is stored remotely as a fixed-offset positional array. This module holds the
//! named-field view and the offset table; `codec` converts between the two.

pub mod codec;

use crate::error::ApiError;
use crate::types::{Millis, RecordId, FOLDER_MARKER};
use serde_json::Value;
use std::collections::BTreeMap;

/// Minimum length of a record's positional array
pub const ENTRY_LEN: usize = 14;

/// Named fields of a record and their positions in the wire array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Type,
    Name,
    Location,
    Data,
    Created,
    Edited,
    Size,
    Id,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Type,
        Field::Name,
        Field::Location,
        Field::Data,
        Field::Created,
        Field::Edited,
        Field::Size,
        Field::Id,
    ];

    /// 0-based position in the in-memory positional array
    pub const fn array_offset(self) -> usize {
        match self {
            Field::Type => 0,
            Field::Name => 1,
            Field::Location => 2,
            Field::Data => 3,
            Field::Created => 8,
            Field::Edited => 9,
            Field::Size => 11,
            Field::Id => 13,
        }
    }

    /// 1-based position used by field patches on the wire
    pub const fn api_offset(self) -> usize {
        self.array_offset() + 1
    }

    pub fn from_array_offset(offset: usize) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.array_offset() == offset)
    }

    pub fn from_api_offset(offset: usize) -> Option<Field> {
        offset.checked_sub(1).and_then(Field::from_array_offset)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Type => "type",
            Field::Name => "name",
            Field::Location => "location",
            Field::Data => "data",
            Field::Created => "created",
            Field::Edited => "edited",
            Field::Size => "size",
            Field::Id => "id",
        }
    }
}

/// Payload of the `data` field
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    /// File content
    Content(String),
    /// Child placeholder carried by folders
    Children(Vec<Value>),
    /// Anything else the remote stored; preserved untouched
    Other(Value),
}

impl RecordData {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => RecordData::Content(s),
            Value::Array(items) => RecordData::Children(items),
            other => RecordData::Other(other),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordData::Content(s) => Value::String(s.clone()),
            RecordData::Children(items) => Value::Array(items.clone()),
            RecordData::Other(v) => v.clone(),
        }
    }
}

/// Values at array offsets with no named field, kept verbatim for round-trips
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReservedSlots(BTreeMap<usize, Value>);

impl ReservedSlots {
    pub fn get(&self, offset: usize) -> Option<&Value> {
        self.0.get(&offset)
    }

    pub(crate) fn insert(&mut self, offset: usize, value: Value) {
        debug_assert!(Field::from_array_offset(offset).is_none());
        self.0.insert(offset, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// One past the highest occupied offset
    pub fn span(&self) -> usize {
        self.0.keys().next_back().map(|k| k + 1).unwrap_or(0)
    }
}

/// Named-field view of one file or folder
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Extension including leading dot, or the folder marker
    pub kind: String,
    /// Base name without extension
    pub name: String,
    /// Parent directory, remote-rooted
    pub location: String,
    pub data: RecordData,
    pub created: Millis,
    pub edited: Millis,
    /// Byte length of the content
    pub size: u64,
    pub id: RecordId,
    pub reserved: ReservedSlots,
}

impl Record {
    /// New file record with `created == edited == now`
    pub fn file(
        id: RecordId,
        location: String,
        name: String,
        ext: String,
        content: &str,
        now: Millis,
    ) -> Self {
        Self {
            kind: ext,
            name,
            location,
            data: RecordData::Content(content.to_string()),
            created: now,
            edited: now,
            size: content.len() as u64,
            id,
            reserved: ReservedSlots::default(),
        }
    }

    /// New folder record with an empty child placeholder
    pub fn folder(id: RecordId, location: String, name: String, now: Millis) -> Self {
        Self {
            kind: FOLDER_MARKER.to_string(),
            name,
            location,
            data: RecordData::Children(Vec::new()),
            created: now,
            edited: now,
            size: 0,
            id,
            reserved: ReservedSlots::default(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == FOLDER_MARKER
    }

    /// Un-normalized path built from location, name and type
    ///
    /// The folder marker is a type tag, not a suffix, and is left out.
    pub fn raw_path(&self) -> String {
        let suffix = if self.is_folder() { "" } else { self.kind.as_str() };
        format!("{}/{}{}", self.location, self.name, suffix)
    }

    /// File content, or `InvalidType` when the data is not content-shaped
    pub fn content(&self) -> Result<&str, ApiError> {
        match &self.data {
            RecordData::Content(s) => Ok(s),
            RecordData::Children(_) => Err(ApiError::InvalidType(format!(
                "record {} holds folder children, not content",
                self.id
            ))),
            RecordData::Other(v) => Err(ApiError::InvalidType(format!(
                "record {} holds non-content data: {}",
                self.id, v
            ))),
        }
    }

    /// Replace content, bumping `edited` and recomputing `size`
    pub fn set_content(&mut self, content: &str, now: Millis) {
        self.data = RecordData::Content(content.to_string());
        self.edited = now;
        self.size = content.len() as u64;
    }

    /// Wire value of one named field
    pub fn field_value(&self, field: Field) -> Value {
        match field {
            Field::Type => Value::from(self.kind.clone()),
            Field::Name => Value::from(self.name.clone()),
            Field::Location => Value::from(self.location.clone()),
            Field::Data => self.data.to_value(),
            Field::Created => Value::from(self.created),
            Field::Edited => Value::from(self.edited),
            Field::Size => Value::from(self.size),
            Field::Id => Value::from(self.id.clone()),
        }
    }

    /// Overwrite one named field from its wire value
    pub fn set_field(&mut self, field: Field, value: Value) -> Result<(), ApiError> {
        match field {
            Field::Type => self.kind = codec::expect_string(field, value)?,
            Field::Name => self.name = codec::expect_string(field, value)?,
            Field::Location => self.location = codec::expect_string(field, value)?,
            Field::Data => self.data = RecordData::from_value(value),
            Field::Created => self.created = codec::expect_millis(field, &value)?,
            Field::Edited => self.edited = codec::expect_millis(field, &value)?,
            Field::Size => self.size = codec::expect_size(field, &value)?,
            Field::Id => self.id = codec::expect_string(field, value)?,
        }
        Ok(())
    }
}
