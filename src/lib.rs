//! Calcite CLI - an interactive SQL prompt for Apache Calcite Avatica servers.
//!
//! This library exposes the core modules for use by the binary and integration tests.

pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod repl;
