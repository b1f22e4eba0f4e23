//! Line sources for the REPL.
//!
//! The session loop only needs "give me the next line with this prompt".
//! [`EditorLineSource`] provides that on a terminal via rustyline, with
//! keyword completion and persistent history; [`ScriptedLineSource`] replays
//! a fixed script for tests and automation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, EditMode, Editor};
use tracing::{debug, warn};

use super::completer::SqlHelper;
use crate::error::{CliError, Result};

/// One event from a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A line of input, without the trailing newline.
    Line(String),
    /// The operator pressed Ctrl+C.
    Interrupted,
    /// Input is exhausted (Ctrl+D or end of a piped file).
    Eof,
}

/// Supplies input lines to the session loop.
pub trait LineSource {
    /// Blocks until the next line or signal.
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent>;

    /// Records a completed statement in the source's history.
    fn add_history(&mut self, _entry: &str) {}
}

/// Terminal line source backed by rustyline.
pub struct EditorLineSource {
    editor: Editor<SqlHelper, DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl EditorLineSource {
    /// Creates an editor. History is loaded from `history_path` when given.
    pub fn new(history_path: Option<PathBuf>, history_size: usize) -> Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            // Only completed statements go into history, not every physical line
            .auto_add_history(false)
            .max_history_size(history_size)
            .and_then(|builder| builder.history_ignore_dups(true))
            .map_err(|e| CliError::input(format!("Invalid history settings: {e}")))?
            .build();

        let mut editor = Editor::with_config(config)
            .map_err(|e| CliError::input(format!("Failed to initialize line editor: {e}")))?;
        editor.set_helper(Some(SqlHelper::new()));

        if let Some(path) = &history_path {
            load_history(&mut editor, path);
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Writes history back to disk. Failures are logged, not returned.
    pub fn save_history(&mut self) {
        let Some(path) = &self.history_path else {
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Could not create history directory {}: {}", parent.display(), e);
                return;
            }
        }

        match self.editor.save_history(path) {
            Ok(()) => debug!("Saved history to {}", path.display()),
            Err(e) => warn!("Could not save history to {}: {}", path.display(), e),
        }
    }
}

fn load_history(editor: &mut Editor<SqlHelper, DefaultHistory>, path: &Path) {
    match editor.load_history(path) {
        Ok(()) => debug!("Loaded history from {}", path.display()),
        Err(ReadlineError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No history file at {}", path.display())
        }
        Err(e) => warn!("Could not load history from {}: {}", path.display(), e),
    }
}

impl LineSource for EditorLineSource {
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(LineEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(LineEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(LineEvent::Eof),
            Err(e) => Err(CliError::input(e.to_string())),
        }
    }

    fn add_history(&mut self, entry: &str) {
        if let Err(e) = self.editor.add_history_entry(entry) {
            debug!("Could not add history entry: {}", e);
        }
    }
}

/// Replays a fixed sequence of events, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedLineSource {
    events: VecDeque<LineEvent>,
    prompts: Vec<String>,
    history: Vec<String>,
}

impl ScriptedLineSource {
    /// Creates a source that yields each line in order.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self::from_events(
            lines
                .iter()
                .map(|line| LineEvent::Line(line.as_ref().to_string()))
                .collect(),
        )
    }

    /// Creates a source from explicit events.
    pub fn from_events(events: Vec<LineEvent>) -> Self {
        Self {
            events: events.into(),
            ..Default::default()
        }
    }

    /// Prompts shown so far, one per read.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// History entries recorded so far.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl LineSource for ScriptedLineSource {
    fn read_line(&mut self, prompt: &str) -> Result<LineEvent> {
        self.prompts.push(prompt.to_string());
        Ok(self.events.pop_front().unwrap_or(LineEvent::Eof))
    }

    fn add_history(&mut self, entry: &str) {
        self.history.push(entry.to_string());
    }
}
