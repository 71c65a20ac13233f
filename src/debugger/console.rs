//! Line-editing front for the debugger prompt.

use std::collections::VecDeque;
use std::path::Path;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::warn;

use super::command;
use super::DebuggerError;

/// Source of debugger command lines plus the history that goes with them.
pub trait Console {
    /// `Ok(None)` ends the session: end of input or an interrupt at the prompt.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, DebuggerError>;
    fn add_history(&mut self, line: &str);
    fn load_history(&mut self, path: &Path) -> Result<(), DebuggerError>;
    fn save_history(&mut self, path: &Path) -> Result<(), DebuggerError>;
}

// ── rustyline ────────────────────────────────────────────────────────

/// Prefix completion over the debugger command list.
pub struct CommandHelper;

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        let matches = command::complete(typed)
            .into_iter()
            .map(|c| Pair { display: c.to_string(), replacement: c.to_string() })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {}

impl Validator for CommandHelper {}

impl Helper for CommandHelper {}

pub struct RustylineConsole {
    editor: Editor<CommandHelper, DefaultHistory>,
}

impl RustylineConsole {
    pub fn new() -> Result<Self, DebuggerError> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CommandHelper));
        Ok(RustylineConsole { editor })
    }
}

impl Console for RustylineConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, DebuggerError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            warn!(error = %e, "could not record history entry");
        }
    }

    fn load_history(&mut self, path: &Path) -> Result<(), DebuggerError> {
        self.editor.load_history(path)?;
        Ok(())
    }

    fn save_history(&mut self, path: &Path) -> Result<(), DebuggerError> {
        self.editor.save_history(path)?;
        Ok(())
    }
}

// ── scripted ─────────────────────────────────────────────────────────

/// Replays a fixed list of lines; history is a plain one-entry-per-line file.
#[derive(Default)]
pub struct ScriptedConsole {
    lines: VecDeque<String>,
    history: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedConsole { lines: lines.into_iter().map(Into::into).collect(), history: Vec::new() }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, DebuggerError> {
        Ok(self.lines.pop_front())
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn load_history(&mut self, path: &Path) -> Result<(), DebuggerError> {
        let text = std::fs::read_to_string(path)?;
        self.history.extend(text.lines().map(str::to_string));
        Ok(())
    }

    fn save_history(&mut self, path: &Path) -> Result<(), DebuggerError> {
        let mut text = self.history.join("\n");
        text.push('\n');
        std::fs::write(path, text)?;
        Ok(())
    }
}
