//! Statement execution and result rendering.
//!
//! This module isolates dispatching a completed statement and turning its
//! result into text from the session loop.

pub mod executor;
pub mod render;

pub use executor::QueryExecutor;
pub use render::render;

/// Character that ends a statement.
pub const TERMINATOR: char = ';';

/// A single completed SQL statement, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement(String);

impl Statement {
    /// Joins accumulated lines with single spaces and strips trailing terminators.
    ///
    /// Returns `None` when nothing but terminators and whitespace remain.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Option<Self> {
        let joined = lines
            .iter()
            .map(|line| line.as_ref().trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let sql = joined.trim_end_matches(|c: char| c == TERMINATOR || c.is_whitespace());
        if sql.is_empty() {
            None
        } else {
            Some(Self(sql.to_string()))
        }
    }

    /// The SQL text sent to the engine.
    pub fn sql(&self) -> &str {
        &self.0
    }
}
