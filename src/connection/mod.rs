//! Connection settings resolution and descriptor assembly.

pub mod descriptor;

pub use descriptor::{build_descriptor, ConnectionDescriptor, Credentials};

use crate::config::{Config, ConnectionSettings};
use crate::error::{CliError, Result};

/// Resolves the final connection settings with precedence:
/// 1. CLI arguments (highest)
/// 2. Named profile from the config file
/// 3. `default` profile from the config file
/// 4. Environment variables
/// 5. Built-in defaults
pub fn resolve_settings(
    cli: &ConnectionSettings,
    profile: Option<&str>,
    config: &Config,
) -> Result<ConnectionSettings> {
    let mut settings = match profile {
        Some(name) => config.get_connection(Some(name)).cloned().ok_or_else(|| {
            CliError::config(format!("Connection '{}' not found in config file", name))
        })?,
        None => config.get_connection(None).cloned().unwrap_or_default(),
    };

    settings.merge(cli);
    settings.apply_env_defaults();
    settings.apply_builtin_defaults();

    Ok(settings)
}
