//! Core types shared across the client.

/// RecordId: Globally unique identifier assigned to a record at creation
pub type RecordId = String;

/// Millis: Epoch milliseconds, the unit of every timestamp field on the wire
pub type Millis = i64;

/// Type marker stored in the `type` field of folder records
pub const FOLDER_MARKER: &str = ".folder";

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> Millis {
    chrono::Utc::now().timestamp_millis()
}
