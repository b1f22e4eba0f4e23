//! Error types for the Calcite CLI.
//!
//! Defines the main error enum used throughout the application, plus the
//! row-level decode error that never aborts an execution.

use thiserror::Error;

/// Main error type for Calcite CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration errors (missing base URL, unpaired credentials, bad config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection errors (server unreachable, unsupported serialization, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (statement rejected, stream failed mid-query, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Line source errors (terminal unavailable, history I/O, etc.)
    #[error("Input error: {0}")]
    Input(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an input error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Input(_) => "Input Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if this error must end the process rather than the current statement.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Connection(_) | Self::Internal(_))
    }
}

/// A single result row that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row {index}: {reason}")]
pub struct RowDecodeError {
    /// Zero-based position of the row in the server's result stream.
    pub index: usize,
    /// Why the row was rejected.
    pub reason: String,
}

impl RowDecodeError {
    /// Creates a decode error for the row at `index`.
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Result type alias using CliError.
pub type Result<T> = std::result::Result<T, CliError>;
