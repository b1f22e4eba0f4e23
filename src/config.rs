//! Configuration management for the Calcite CLI.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named connection profiles and REPL settings.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Base URL used when nothing else names a server.
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Serialization used when nothing else names one.
pub const DEFAULT_SERIALIZATION: &str = "json";

/// Main configuration structure for the Calcite CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Line editor settings.
    #[serde(default)]
    pub repl: ReplConfig,

    /// Named connection profiles.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionSettings>,
}

/// Line editor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Where command history is persisted. Defaults to the platform data directory.
    pub history_file: Option<PathBuf>,

    /// Maximum number of history entries kept.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_history_size() -> usize {
    1000
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            history_size: default_history_size(),
        }
    }
}

impl ReplConfig {
    /// Returns the configured history path, or the platform default.
    pub fn history_path(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(default_history_path)
    }
}

/// Returns the default history file location (`<data_dir>/calcite-cli/history.txt`).
pub fn default_history_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("calcite-cli")
        .join("history.txt")
}

/// Discrete settings from which a connection descriptor is assembled.
///
/// Every field is optional so that CLI flags, profiles, and the environment
/// can be layered on top of each other.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Base address of the Avatica server.
    pub url: Option<String>,

    /// Wire serialization (`json`).
    pub serialization: Option<String>,

    /// Default schema, appended to the URL as a path segment.
    pub schema: Option<String>,

    /// Avatica user.
    pub user: Option<String>,

    /// Avatica password (not recommended to store in config).
    pub password: Option<String>,

    /// Upper bound on rows returned per statement.
    pub max_rows_total: Option<u64>,

    /// Free-form `key=value` connection parameters, in order.
    pub params: Vec<String>,

    /// Legacy partition-pruning toggle.
    pub enable_partition_pruning: Option<bool>,

    /// Legacy distributed-execution toggle.
    pub distributed_execution: Option<bool>,
}

impl ConnectionSettings {
    /// Merges another settings value into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &ConnectionSettings) {
        if other.url.is_some() {
            self.url = other.url.clone();
        }
        if other.serialization.is_some() {
            self.serialization = other.serialization.clone();
        }
        if other.schema.is_some() {
            self.schema = other.schema.clone();
        }
        if other.user.is_some() {
            self.user = other.user.clone();
        }
        if other.password.is_some() {
            self.password = other.password.clone();
        }
        if other.max_rows_total.is_some() {
            self.max_rows_total = other.max_rows_total;
        }
        if !other.params.is_empty() {
            self.params = other.params.clone();
        }
        if other.enable_partition_pruning.is_some() {
            self.enable_partition_pruning = other.enable_partition_pruning;
        }
        if other.distributed_execution.is_some() {
            self.distributed_execution = other.distributed_execution;
        }
    }

    /// Applies environment variables (CALCITE_URL, CALCITE_USER, etc.) as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_env_defaults_from(|key| std::env::var(key).ok());
    }

    /// Applies defaults from an arbitrary variable lookup.
    pub fn apply_env_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.url.is_none() {
            self.url = lookup("CALCITE_URL");
        }
        if self.schema.is_none() {
            self.schema = lookup("CALCITE_SCHEMA");
        }
        if self.user.is_none() {
            self.user = lookup("CALCITE_USER");
        }
        if self.password.is_none() {
            self.password = lookup("CALCITE_PASSWORD");
        }
    }

    /// Fills the base URL and serialization with built-in defaults when unset.
    pub fn apply_builtin_defaults(&mut self) {
        if self.url.is_none() {
            self.url = Some(DEFAULT_URL.to_string());
        }
        if self.serialization.is_none() {
            self.serialization = Some(DEFAULT_SERIALIZATION.to_string());
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calcite-cli")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the default config.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            CliError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionSettings> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
