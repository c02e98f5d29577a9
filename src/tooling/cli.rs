//! CLI Tooling
//!
//! Command-line interface over the overlay client. Every mutating command commits
//! before returning, so one invocation is one remote batch.

use crate::client::OverlayClient;
use crate::config::{ClientConfig, ConfigLoader};
use crate::error::ApiError;
use crate::record::{Record, RecordData};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// uuidfs - path-oriented access to a UUID-addressed remote file store
#[derive(Parser)]
#[command(name = "uuidfs")]
#[command(about = "Read and edit a remote UUID-addressed file store by path")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (same as --log-level debug)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every known path
    Paths,
    /// List the names directly below a folder
    Ls {
        /// Folder path
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print the content of a file
    Cat {
        path: String,
    },
    /// Show a record's fields
    Stat {
        /// Path of the record (omit when using --id)
        path: Option<String>,
        /// Record identifier instead of path
        #[arg(long)]
        id: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Replace the content of a file
    Put {
        path: String,
        content: String,
        /// Create the file (and missing parent folders) if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Create a folder and any missing parents
    Mkdir {
        path: String,
    },
    /// Remove a file or an empty folder entry
    Rm {
        path: String,
    },
    /// Move or rename a record
    Mv {
        from: String,
        to: String,
    },
}

impl Cli {
    /// Load configuration and apply the logging flags on top of it
    pub fn load_config(&self) -> Result<ClientConfig, ApiError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };

        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        Ok(config)
    }
}

/// CLI context for executing commands against one client
pub struct CliContext {
    client: OverlayClient,
}

impl CliContext {
    /// Create a context talking to the configured remote
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: OverlayClient::from_config(config)?,
        })
    }

    /// Create a context around an existing client
    pub fn with_client(client: OverlayClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &OverlayClient {
        &self.client
    }

    /// Execute a CLI command, returning the text to print
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Paths => Ok(self.client.list_paths()?.join("\n")),
            Commands::Ls { path } => {
                let children = self.client.list_direct_children(path);
                Ok(children.into_iter().collect::<Vec<_>>().join("\n"))
            }
            Commands::Cat { path } => self.client.read_content(path),
            Commands::Stat { path, id, format } => {
                self.handle_stat(path.as_deref(), id.as_deref(), format)
            }
            Commands::Put {
                path,
                content,
                create,
            } => self.handle_put(path, content, *create),
            Commands::Mkdir { path } => {
                let id = self.client.create_folder(path)?;
                self.finish(format!("Created folder {} ({})", path, id))
            }
            Commands::Rm { path } => {
                self.client.remove(path)?;
                self.finish(format!("Removed {}", path))
            }
            Commands::Mv { from, to } => {
                self.client.rename(from, to)?;
                self.finish(format!("Moved {} to {}", from, to))
            }
        };

        info!(
            command = command_name(command),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_stat(
        &self,
        path: Option<&str>,
        id: Option<&str>,
        format: &str,
    ) -> Result<String, ApiError> {
        let record = match (path, id) {
            (_, Some(id)) => self.client.stat_by_id(id)?,
            (Some(path), None) => self.client.read(path)?,
            (None, None) => {
                return Err(ApiError::ConfigError(
                    "stat needs a path or --id".to_string(),
                ))
            }
        };

        match format {
            "json" => serde_json::to_string_pretty(&record).map_err(ApiError::from),
            "text" => Ok(format_record_text(&record)),
            other => Err(ApiError::ConfigError(format!(
                "Unknown output format '{}'; use text or json",
                other
            ))),
        }
    }

    fn handle_put(&self, path: &str, content: &str, create: bool) -> Result<String, ApiError> {
        if create && !self.client.exists(path)? {
            let id = self.client.create(path, content)?;
            return self.finish(format!("Created {} ({})", path, id));
        }
        self.client.write(path, content)?;
        self.finish(format!("Wrote {} bytes to {}", content.len(), path))
    }

    /// Commit pending changes and append the outcome to `message`
    fn finish(&self, message: String) -> Result<String, ApiError> {
        match self.client.commit()? {
            Some(receipt) => Ok(format!("{}\nCommitted {} change(s)", message, receipt.applied)),
            None => Ok(message),
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Paths => "paths",
        Commands::Ls { .. } => "ls",
        Commands::Cat { .. } => "cat",
        Commands::Stat { .. } => "stat",
        Commands::Put { .. } => "put",
        Commands::Mkdir { .. } => "mkdir",
        Commands::Rm { .. } => "rm",
        Commands::Mv { .. } => "mv",
    }
}

fn format_timestamp(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// Format a record as a two-column table
fn format_record_text(record: &Record) -> String {
    let data = match &record.data {
        RecordData::Content(text) => format!("{} bytes of text", text.len()),
        RecordData::Children(children) => format!("{} child placeholder(s)", children.len()),
        RecordData::Other(value) => value.to_string(),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["id".to_string(), record.id.clone()]);
    table.add_row(vec!["path".to_string(), record.raw_path()]);
    table.add_row(vec!["type".to_string(), record.kind.clone()]);
    table.add_row(vec!["size".to_string(), record.size.to_string()]);
    table.add_row(vec!["created".to_string(), format_timestamp(record.created)]);
    table.add_row(vec!["edited".to_string(), format_timestamp(record.edited)]);
    table.add_row(vec!["data".to_string(), data]);
    for (offset, value) in record.reserved.iter() {
        table.add_row(vec![format!("slot {}", offset), value.to_string()]);
    }
    table.to_string()
}
