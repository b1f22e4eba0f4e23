//! Mock connection for testing.
//!
//! Provides an in-memory, scripted engine that records what was executed and
//! how many result cursors were opened and released.

use super::{Connection, Row, RowCursor, RowResult, Value};
use crate::error::{CliError, Result, RowDecodeError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted row: either a decodable row or a malformed one.
#[derive(Debug, Clone, PartialEq)]
pub enum MockRow {
    Decoded(Row),
    Malformed(String),
}

impl From<Row> for MockRow {
    fn from(row: Row) -> Self {
        MockRow::Decoded(row)
    }
}

#[derive(Debug, Clone)]
enum Script {
    Rows {
        columns: Vec<String>,
        rows: Vec<MockRow>,
        /// Fail the stream with this message once the rows run out.
        stream_error: Option<String>,
    },
    Reject(String),
}

/// Counters shared between a mock connection and its cursors.
#[derive(Debug, Default)]
pub struct MockStats {
    executed: Mutex<Vec<String>>,
    opened_cursors: AtomicUsize,
    released_cursors: AtomicUsize,
    closed: AtomicBool,
}

impl MockStats {
    /// Statements dispatched so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of cursors handed out.
    pub fn opened_cursors(&self) -> usize {
        self.opened_cursors.load(Ordering::SeqCst)
    }

    /// Number of cursors released, via close or drop.
    pub fn released_cursors(&self) -> usize {
        self.released_cursors.load(Ordering::SeqCst)
    }

    /// Returns true once the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A mock connection that returns scripted results.
///
/// Unscripted `SELECT` statements echo the SQL back in a single `result`
/// column; any other unscripted statement returns an empty result.
#[derive(Debug, Default)]
pub struct MockConnection {
    scripts: HashMap<String, Script>,
    stats: Arc<MockStats>,
}

impl MockConnection {
    /// Creates a new mock connection with no scripted statements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `sql` to return the given columns and rows.
    pub fn with_result(
        mut self,
        sql: impl Into<String>,
        columns: &[&str],
        rows: Vec<MockRow>,
    ) -> Self {
        self.scripts.insert(
            sql.into(),
            Script::Rows {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
                stream_error: None,
            },
        );
        self
    }

    /// Scripts `sql` to be rejected at dispatch.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripts.insert(sql.into(), Script::Reject(message.into()));
        self
    }

    /// Scripts `sql` to yield `rows` and then fail mid-stream.
    pub fn with_stream_error(
        mut self,
        sql: impl Into<String>,
        columns: &[&str],
        rows: Vec<MockRow>,
        message: impl Into<String>,
    ) -> Self {
        self.scripts.insert(
            sql.into(),
            Script::Rows {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
                stream_error: Some(message.into()),
            },
        );
        self
    }

    /// Returns a handle on the connection's counters.
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn script_for(&self, sql: &str) -> Script {
        if let Some(script) = self.scripts.get(sql) {
            return script.clone();
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            Script::Rows {
                columns: vec!["result".to_string()],
                rows: vec![MockRow::Decoded(vec![Value::String(format!(
                    "Mock result for: {sql}"
                ))])],
                stream_error: None,
            }
        } else {
            Script::Rows {
                columns: vec![],
                rows: vec![],
                stream_error: None,
            }
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>> {
        self.stats
            .executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sql.to_string());

        match self.script_for(sql) {
            Script::Reject(message) => Err(CliError::query(message)),
            Script::Rows {
                columns,
                rows,
                stream_error,
            } => {
                self.stats.opened_cursors.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockCursor {
                    columns,
                    rows: rows.into(),
                    position: 0,
                    stream_error,
                    stats: Arc::clone(&self.stats),
                    released: false,
                }))
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.stats.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockCursor {
    columns: Vec<String>,
    rows: VecDeque<MockRow>,
    position: usize,
    stream_error: Option<String>,
    stats: Arc<MockStats>,
    released: bool,
}

impl MockCursor {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stats.released_cursors.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl RowCursor for MockCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<RowResult>> {
        let Some(row) = self.rows.pop_front() else {
            return match self.stream_error.take() {
                Some(message) => Err(CliError::query(message)),
                None => Ok(None),
            };
        };

        let index = self.position;
        self.position += 1;

        Ok(Some(match row {
            MockRow::Decoded(values) => Ok(values),
            MockRow::Malformed(reason) => Err(RowDecodeError::new(index, reason)),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut cursor = self;
        cursor.release();
        Ok(())
    }
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.release();
    }
}
