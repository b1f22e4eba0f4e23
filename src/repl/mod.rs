//! Interactive read-eval-print loop.

pub mod completer;
pub mod line_source;
pub mod session;
pub mod state;

pub use line_source::{EditorLineSource, LineEvent, LineSource, ScriptedLineSource};
pub use session::{Session, SessionEnd};
pub use state::{SessionState, Transition, CONTINUATION_PROMPT, PRIMARY_PROMPT};

/// Printed once before the first prompt.
pub const BANNER: &str = "Enter your queries. Type 'exit' to quit.";

/// Printed when the operator leaves via `exit`, `quit`, or Ctrl+C.
pub const FAREWELL: &str = "Exiting calcite CLI Prompt...";
