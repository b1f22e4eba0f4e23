//! Command-line argument parsing for the Calcite CLI.
//!
//! Flag names keep the camelCase spelling operators already use in scripts
//! (`--maxRowsTotal`, `--connectionParams`); kebab-case aliases are accepted.

use crate::config::{Config, ConnectionSettings};
use clap::Parser;
use std::path::PathBuf;

/// Interactive SQL prompt for Apache Calcite Avatica servers.
#[derive(Parser, Debug)]
#[command(name = "calcite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Avatica server base URL (e.g., http://localhost:8080)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Wire serialization format
    #[arg(long, value_name = "FORMAT")]
    pub serialization: Option<String>,

    /// Default schema, appended to the URL path
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// Avatica user (requires --password)
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Avatica password (requires --user)
    #[arg(long, alias = "passwd", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Maximum number of rows any query may return
    #[arg(long = "maxRowsTotal", alias = "max-rows-total", value_name = "N")]
    pub max_rows_total: Option<u64>,

    /// Extra connection parameters as key=value pairs, '&'-separated or repeated
    #[arg(
        long = "connectionParams",
        alias = "connection-params",
        value_name = "KEY=VALUE",
        value_delimiter = '&'
    )]
    pub connection_params: Vec<String>,

    /// Legacy toggle: enable partition pruning
    #[arg(
        long = "enablePartitionPruning",
        alias = "enable-partition-pruning",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub enable_partition_pruning: Option<bool>,

    /// Legacy toggle: enable distributed execution
    #[arg(
        long = "distributedExecution",
        alias = "distributed-execution",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub distributed_execution: Option<bool>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// History file path
    #[arg(long, value_name = "PATH", conflicts_with = "no_history")]
    pub history_file: Option<PathBuf>,

    /// Do not load or save input history
    #[arg(long)]
    pub no_history: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file instead of stderr (default location when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    pub log_file: Option<Option<PathBuf>>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Collects the connection flags into settings.
    ///
    /// Unset flags stay `None` so lower-precedence sources can fill them.
    pub fn to_connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            url: self.url.clone(),
            serialization: self.serialization.clone(),
            schema: self.schema.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            max_rows_total: self.max_rows_total,
            params: self
                .connection_params
                .iter()
                .filter(|param| !param.trim().is_empty())
                .cloned()
                .collect(),
            enable_partition_pruning: self.enable_partition_pruning,
            distributed_execution: self.distributed_execution,
        }
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Returns the log file to write to, if file logging was requested.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_ref()
            .map(|path| path.clone().unwrap_or_else(crate::logging::get_log_path))
    }

    /// Resolves where history is persisted, if anywhere.
    pub fn history_path(&self, config: &Config) -> Option<PathBuf> {
        if self.no_history {
            return None;
        }
        Some(
            self.history_file
                .clone()
                .unwrap_or_else(|| config.repl.history_path()),
        )
    }
}
