//! uuidfs: Path-Oriented Overlay for a UUID-Addressed File Store
//!
//! The remote keeps every file and folder as a flat positional record keyed by a
//! UUID, and exposes a path index plus batched field updates. This crate layers a
//! conventional path API on top: reads resolve through a local index and record cache,
//! and mutations accumulate in a pending change log that commits as one batch.

pub mod cache;
pub mod changes;
pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod index;
pub mod logging;
pub mod path;
pub mod record;
pub mod remote;
pub mod tooling;
pub mod types;

pub use client::OverlayClient;
pub use error::ApiError;
pub use path::PathNormalizer;
pub use record::{Field, Record, RecordData};
pub use remote::RemoteStore;
