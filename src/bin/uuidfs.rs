//! uuidfs CLI Binary
//!
//! Command-line interface for a UUID-addressed remote file store.

use clap::Parser;
use std::process;
use uuidfs::logging::init_logging;
use uuidfs::tooling::cli::{Cli, CliContext};

fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    // Create CLI context
    let context = match CliContext::new(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing client: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
