//! Statement execution against the remote engine.
//!
//! Provides isolated execution that can be tested independently of the
//! session loop.

use std::time::Instant;

use tracing::{debug, warn};

use super::Statement;
use crate::db::{Connection, ExecutionReport, ResultSet, RowCursor};
use crate::error::Result;

/// Dispatches completed statements and materializes their results.
pub struct QueryExecutor<'a> {
    conn: &'a dyn Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    /// Executes one statement and drains its rows.
    ///
    /// The elapsed time covers dispatch and the full row iteration. Rows that
    /// fail to decode are skipped and not counted. On any error no partial
    /// result is returned. The result cursor is closed on every path once it
    /// has been opened.
    pub async fn execute(&self, statement: &Statement) -> Result<(ResultSet, ExecutionReport)> {
        let start = Instant::now();
        debug!(sql = statement.sql(), "Dispatching statement");

        let mut cursor = self.conn.query(statement.sql()).await?;
        let drained = drain(cursor.as_mut()).await;
        // Stop the clock before releasing the cursor; the close round trip is
        // not part of the query.
        let elapsed = start.elapsed();

        // Close before looking at the drain outcome so a failed stream still
        // releases the statement.
        if let Err(e) = cursor.close().await {
            warn!("Failed to release result cursor: {}", e);
        }

        let (result, skipped_rows) = drained?;
        let report = ExecutionReport {
            row_count: result.rows.len(),
            skipped_rows,
            elapsed,
        };
        debug!(rows = report.row_count, skipped = skipped_rows, ?elapsed, "Statement finished");

        Ok((result, report))
    }
}

/// Reads every row off the cursor, returning the result and the number of skipped rows.
async fn drain(cursor: &mut dyn RowCursor) -> Result<(ResultSet, usize)> {
    let mut result = ResultSet::new(cursor.columns().to_vec());
    let mut skipped = 0;

    while let Some(row) = cursor.next_row().await? {
        match row {
            Ok(values) => result.rows.push(values),
            Err(e) => {
                warn!("Error retrieving row data: {}", e);
                skipped += 1;
            }
        }
    }

    Ok((result, skipped))
}
