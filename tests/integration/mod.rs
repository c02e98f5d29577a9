//! Integration tests for the uuidfs overlay client

mod commit_batches;
mod concurrency;
mod overlay_properties;
mod support;
