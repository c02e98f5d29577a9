//! Positional array codec
//!
//! `decode` reads the named offsets and keeps every other slot verbatim; `encode` writes
//! them back in place, so `encode(decode(a)) == a` for any well-formed array whose
//! numeric fields are integers. Whole-number floats in `created`, `edited` and `size`
//! are accepted and come back out as integers.

use super::{Field, Record, RecordData, ReservedSlots, ENTRY_LEN};
use crate::error::ApiError;
use crate::types::Millis;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Encode a record into its positional array
pub fn encode(record: &Record) -> Vec<Value> {
    let len = ENTRY_LEN.max(record.reserved.span());
    let mut out = vec![Value::Null; len];
    for (offset, value) in record.reserved.iter() {
        out[offset] = value.clone();
    }
    for field in Field::ALL {
        out[field.array_offset()] = record.field_value(field);
    }
    out
}

/// Decode a positional array into a record
pub fn decode(values: &[Value]) -> Result<Record, ApiError> {
    if values.len() < ENTRY_LEN {
        return Err(ApiError::InvalidResponse(format!(
            "record array has {} slots, expected at least {}",
            values.len(),
            ENTRY_LEN
        )));
    }

    let slot = |field: Field| values[field.array_offset()].clone();
    let mut reserved = ReservedSlots::default();
    for (offset, value) in values.iter().enumerate() {
        if Field::from_array_offset(offset).is_none() {
            reserved.insert(offset, value.clone());
        }
    }

    Ok(Record {
        kind: expect_string(Field::Type, slot(Field::Type))?,
        name: expect_string(Field::Name, slot(Field::Name))?,
        location: expect_string(Field::Location, slot(Field::Location))?,
        data: RecordData::from_value(slot(Field::Data)),
        created: expect_millis(Field::Created, &values[Field::Created.array_offset()])?,
        edited: expect_millis(Field::Edited, &values[Field::Edited.array_offset()])?,
        size: expect_size(Field::Size, &values[Field::Size.array_offset()])?,
        id: expect_string(Field::Id, slot(Field::Id))?,
        reserved,
    })
}

/// Decode a flat array holding consecutive fixed-width records
pub fn decode_flat(values: &[Value]) -> Result<Vec<Record>, ApiError> {
    if values.len() % ENTRY_LEN != 0 {
        return Err(ApiError::InvalidResponse(format!(
            "flat index length {} is not a multiple of {}",
            values.len(),
            ENTRY_LEN
        )));
    }
    values.chunks(ENTRY_LEN).map(decode).collect()
}

pub(crate) fn expect_string(field: Field, value: Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ApiError::InvalidResponse(format!(
            "field {} expected a string, got {}",
            field.as_str(),
            other
        ))),
    }
}

/// Integer milliseconds; a whole-number float is normalized to its integer value
pub(crate) fn expect_millis(field: Field, value: &Value) -> Result<Millis, ApiError> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "field {} expected integer milliseconds, got {}",
                field.as_str(),
                value
            ))
        })
}

/// Byte count; a non-negative whole-number float is normalized to its integer value
pub(crate) fn expect_size(field: Field, value: &Value) -> Result<u64, ApiError> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "field {} expected a byte count, got {}",
                field.as_str(),
                value
            ))
        })
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        decode(&values).map_err(D::Error::custom)
    }
}
