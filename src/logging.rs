//! Logging configuration for the Calcite CLI.
//!
//! Logs go to stderr by default at `warn`, so diagnostics stay out of the
//! way of result tables. `RUST_LOG` always wins over the built-in level.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Returns the filter directive used when `RUST_LOG` is unset.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)))
}

/// Initializes logging to a file.
///
/// The file is truncated on each run. If it cannot be created, a warning is
/// printed and logging falls back to stderr.
pub fn init_file_logging(path: &Path, verbose: bool) {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging(verbose);
            return;
        }
    }

    // Truncate on each run to avoid unbounded growth
    let log_file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging(verbose);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Returns a conventional log file location.
///
/// Uses the XDG state directory on Linux (`~/.local/state/calcite-cli/calcite.log`),
/// or falls back to the config directory on other platforms.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("calcite-cli").join("calcite.log");
    }

    // Fall back to config directory
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("calcite-cli").join("calcite.log");
    }

    // Last resort: temp directory
    std::env::temp_dir().join("calcite.log")
}
