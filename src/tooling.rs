//! Tooling & Integration Layer
//!
//! Command-line access to the overlay client.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
