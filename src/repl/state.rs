//! Input accumulation state for the REPL.
//!
//! Statement boundaries are decided purely by the trailing terminator, never
//! by parsing SQL. [`SessionState::accept`] consumes the current state and one
//! input line and returns the next state together with what the driver
//! should do.

use crate::query::{Statement, TERMINATOR};

/// Prompt shown when no statement is pending.
pub const PRIMARY_PROMPT: &str = "calcite \u{1F48E}:sql> ";

/// Prompt shown while a multi-line statement is incomplete.
pub const CONTINUATION_PROMPT: &str = "... ";

/// What the driver should do after a line was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Read another line.
    Continue,
    /// Execute the completed statement, then read another line.
    Execute(Statement),
    /// Leave the loop. Pending input is discarded.
    Exit,
}

/// Lines collected since the last completed statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    lines: Vec<String>,
    continuation: bool,
}

impl SessionState {
    /// Creates an idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a statement is partially entered.
    pub fn is_accumulating(&self) -> bool {
        self.continuation
    }

    /// Lines buffered so far.
    pub fn pending_lines(&self) -> &[String] {
        &self.lines
    }

    /// Prompt for the next line.
    pub fn prompt(&self) -> &'static str {
        if self.continuation {
            CONTINUATION_PROMPT
        } else {
            PRIMARY_PROMPT
        }
    }

    /// Feeds one raw input line through the state machine.
    ///
    /// - `exit`/`quit` (any case) ends the session and drops pending input.
    /// - Blank lines are ignored in either state.
    /// - A line ending with `;` completes the statement and resets to idle,
    ///   including a lone `;` while accumulating. A statement that is empty
    ///   once terminators are stripped is dropped without being executed.
    /// - Any other line is buffered and the prompt switches to continuation.
    pub fn accept(mut self, line: &str) -> (Self, Transition) {
        let line = line.trim();

        if is_exit_directive(line) {
            return (Self::new(), Transition::Exit);
        }
        if line.is_empty() {
            return (self, Transition::Continue);
        }

        self.lines.push(line.to_string());

        // Completion is decided by the last character only; SQL is never parsed.
        if line.ends_with(TERMINATOR) {
            let transition = match Statement::from_lines(&self.lines) {
                Some(statement) => Transition::Execute(statement),
                None => Transition::Continue,
            };
            return (Self::new(), transition);
        }

        self.continuation = true;
        (self, Transition::Continue)
    }
}

/// Returns true for `exit` or `quit`, case-insensitively.
pub fn is_exit_directive(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}
