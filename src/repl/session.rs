//! The interactive session loop.
//!
//! Reads lines, feeds them through [`SessionState`], and runs each completed
//! statement to completion before reading the next line. The loop never
//! terminates the process; it reports why it stopped and lets the caller
//! decide what to do.

use std::io::Write;

use tracing::{debug, warn};

use super::line_source::{LineEvent, LineSource};
use super::state::{SessionState, Transition};
use crate::db::Connection;
use crate::error::{CliError, Result};
use crate::query::{render, QueryExecutor, Statement, TERMINATOR};

/// Why the session loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The operator typed `exit` or `quit`.
    Exit,
    /// The line source ran out of input.
    EndOfInput,
    /// The operator pressed Ctrl+C.
    Interrupted,
}

/// Drives one interactive session against an open connection.
pub struct Session<'a, W: Write, E: Write> {
    executor: QueryExecutor<'a>,
    out: W,
    err: E,
}

impl<'a, W: Write, E: Write> Session<'a, W, E> {
    /// Creates a session writing results to `out` and failures to `err`.
    pub fn new(conn: &'a dyn Connection, out: W, err: E) -> Self {
        Self {
            executor: QueryExecutor::new(conn),
            out,
            err,
        }
    }

    /// Runs until an exit directive, end of input, or interrupt.
    ///
    /// Execution errors are reported and the loop continues; only a failing
    /// line source or output stream ends the loop with an error.
    pub async fn run<L: LineSource>(&mut self, source: &mut L) -> Result<SessionEnd> {
        let mut state = SessionState::new();

        loop {
            let line = match source.read_line(state.prompt())? {
                LineEvent::Line(line) => line,
                LineEvent::Interrupted => return Ok(SessionEnd::Interrupted),
                LineEvent::Eof => return Ok(SessionEnd::EndOfInput),
            };

            let (next, transition) = state.accept(&line);
            state = next;

            match transition {
                Transition::Continue => {}
                Transition::Exit => {
                    debug!("Exit directive received");
                    return Ok(SessionEnd::Exit);
                }
                Transition::Execute(statement) => {
                    // History keeps the terminator so recalled entries run as-is.
                    source.add_history(&format!("{}{}", statement.sql(), TERMINATOR));
                    self.dispatch(&statement).await?;
                }
            }
        }
    }

    /// Executes one statement and writes either its table or the failure.
    async fn dispatch(&mut self, statement: &Statement) -> Result<()> {
        match self.executor.execute(statement).await {
            Ok((result, report)) => {
                let text = render(&result, &report);
                self.out
                    .write_all(text.as_bytes())
                    .and_then(|()| self.out.flush())
                    .map_err(|e| CliError::internal(format!("Failed to write output: {e}")))
            }
            Err(e) => {
                warn!("Error executing query: {}", e);
                writeln!(self.err, "Error executing query: {e}")
                    .map_err(|e| CliError::internal(format!("Failed to write output: {e}")))
            }
        }
    }

    /// Consumes the session, returning its writers.
    pub fn into_writers(self) -> (W, E) {
        (self.out, self.err)
    }
}
