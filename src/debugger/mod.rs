//! Interactive debugger: breakpoints, single-stepping and state inspection over an [`Executor`].

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::vm::{Executor, LineSink, RuntimeError};

pub mod command;
pub mod console;
pub mod view;

pub use command::{Command, CommandError};
pub use console::{Console, RustylineConsole, ScriptedConsole};

const PROMPT: &str = "> ";

#[derive(Debug, thiserror::Error)]
pub enum DebuggerError {
    #[error("console error: {0}")]
    Console(#[from] rustyline::error::ReadlineError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct DebuggerConfig {
    pub history_path: PathBuf,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        DebuggerConfig { history_path: std::env::temp_dir().join(".fflt_debug_history") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Paused before the instruction at `pc`.
    Interrupted,
    /// Executing until a breakpoint, the end, or an error.
    Running,
    /// A runtime error stopped the program; it is re-reported instead of re-executed.
    Halted(RuntimeError),
    Exited,
}

// ── Output capture ───────────────────────────────────────────────────

/// Everything the program printed, and how much of it already reached the real sink.
struct Capture {
    transcript: String,
    flushed: usize,
    passthrough: bool,
    sink: Option<Box<dyn LineSink>>,
}

impl Capture {
    fn flush(&mut self) -> io::Result<()> {
        if self.flushed == self.transcript.len() {
            return Ok(());
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(&self.transcript[self.flushed..])?;
        }
        self.flushed = self.transcript.len();
        Ok(())
    }
}

/// Installed as the machine's output while the debugger is attached.
struct CaptureSink(Rc<RefCell<Capture>>);

impl LineSink for CaptureSink {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        let mut capture = self.0.borrow_mut();
        capture.transcript.push_str(text);
        if capture.passthrough { capture.flush() } else { Ok(()) }
    }
}

// ── Session ──────────────────────────────────────────────────────────

pub struct Debugger<'a> {
    executor: &'a mut Executor,
    console: Box<dyn Console + 'a>,
    out: Box<dyn Write + 'a>,
    config: DebuggerConfig,
    breakpoints: BTreeSet<usize>,
    state: State,
    capture: Rc<RefCell<Capture>>,
}

impl<'a> Debugger<'a> {
    /// Attach to `executor`. Views are written to `out`; program output is held back
    /// until `continue` and then passed to the executor's original sink.
    pub fn new(
        executor: &'a mut Executor,
        console: Box<dyn Console + 'a>,
        out: Box<dyn Write + 'a>,
        config: DebuggerConfig,
    ) -> Self {
        let capture = Rc::new(RefCell::new(Capture {
            transcript: String::new(),
            flushed: 0,
            passthrough: false,
            sink: None,
        }));
        let original = executor.replace_output(Box::new(CaptureSink(Rc::clone(&capture))));
        capture.borrow_mut().sink = Some(original);

        Debugger {
            executor,
            console,
            out,
            config,
            breakpoints: BTreeSet::from([0]),
            state: State::Interrupted,
            capture,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    /// Everything the program has printed so far in this session.
    pub fn output(&self) -> String {
        self.capture.borrow().transcript.clone()
    }

    /// Run the session until the program ends, the user exits, or input runs out.
    /// History is loaded first and saved on every way out.
    pub fn run(&mut self) -> Result<(), DebuggerError> {
        self.load_history();
        self.executor.reset();
        self.set_state(State::Interrupted);

        let result = self.session();
        let flushed = self.detach();
        self.save_history();
        result?;
        flushed.map_err(DebuggerError::from)
    }

    fn session(&mut self) -> Result<(), DebuggerError> {
        while self.state != State::Exited && !self.executor.is_finished() {
            if self.state == State::Running {
                if self.breakpoints.contains(&self.executor.pc()) {
                    self.set_state(State::Interrupted);
                } else {
                    self.execute_instruction()?;
                }
                continue;
            }
            self.show_status()?;
            self.prompt()?;
        }
        if self.executor.is_finished() {
            self.set_state(State::Exited);
        }
        debug!(pc = self.executor.pc(), "debugger session finished");
        Ok(())
    }

    /// Read commands until one resumes execution or ends the session.
    fn prompt(&mut self) -> Result<(), DebuggerError> {
        loop {
            let Some(line) = self.console.read_line(PROMPT)? else {
                self.set_state(State::Exited);
                return Ok(());
            };
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(self.out, "{e}")?;
                    continue;
                }
            };
            if command != Command::Exit {
                self.console.add_history(line.trim());
            }
            self.apply(command)?;
            if command.resumes() || command == Command::Exit {
                return Ok(());
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<(), DebuggerError> {
        match command {
            Command::Step => self.execute_instruction()?,
            Command::Continue => {
                self.execute_instruction()?;
                if self.state == State::Interrupted {
                    self.set_state(State::Running);
                }
            }
            Command::Break(n) => {
                self.breakpoints.insert(n);
                debug!(index = n, "breakpoint set");
                writeln!(self.out, "Breakpoint set at {n}")?;
            }
            Command::Delete(n) => {
                if self.breakpoints.remove(&n) {
                    debug!(index = n, "breakpoint deleted");
                    writeln!(self.out, "Breakpoint deleted at {n}")?;
                } else {
                    writeln!(self.out, "No breakpoint at {n}")?;
                }
            }
            Command::InfoBreakpoints => write!(self.out, "{}", view::breakpoints(&self.breakpoints))?,
            Command::InfoStack => write!(self.out, "{}", view::stack(self.executor.machine().stack()))?,
            Command::InfoHeap => write!(self.out, "{}", view::heap(self.executor.machine().heap()))?,
            Command::InfoCallStack => {
                write!(self.out, "{}", view::call_stack(self.executor.machine().call_stack()))?
            }
            Command::InfoLabels => write!(self.out, "{}", view::labels(&self.executor.program().labels))?,
            Command::InfoVm => self.show_vm()?,
            Command::InfoInstructions => {
                write!(self.out, "{}", view::instructions(self.executor.program(), self.executor.pc()))?
            }
            Command::Help => write!(self.out, "{}", command::HELP)?,
            Command::Exit => self.set_state(State::Exited),
        }
        Ok(())
    }

    /// One instruction, or the stored error again if the program already failed.
    fn execute_instruction(&mut self) -> Result<(), DebuggerError> {
        if let State::Halted(err) = &self.state {
            writeln!(self.out, "Runtime error occurred: ({err})")?;
            return Ok(());
        }
        if let Err(err) = self.executor.step() {
            writeln!(self.out, "{err}")?;
            self.set_state(State::Halted(err));
        }
        Ok(())
    }

    fn set_state(&mut self, state: State) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, pc = self.executor.pc(), "debugger state");
        }
        let running = state == State::Running;
        {
            let mut capture = self.capture.borrow_mut();
            capture.passthrough = running;
            if running {
                if let Err(e) = capture.flush() {
                    warn!(error = %e, "could not flush captured output");
                }
            }
        }
        self.state = state;
    }

    fn show_status(&mut self) -> Result<(), DebuggerError> {
        let output = self.output();
        let status = view::status(self.executor.pc(), self.executor.current(), &output);
        write!(self.out, "{status}{}", view::stack(self.executor.machine().stack()))?;
        Ok(())
    }

    fn show_vm(&mut self) -> Result<(), DebuggerError> {
        let machine = self.executor.machine();
        let program = self.executor.program();
        write!(
            self.out,
            "\nFilename: {}\nProgram counter: {}\n{}{}{}{}",
            program.file,
            self.executor.pc(),
            view::labels(&program.labels),
            view::call_stack(machine.call_stack()),
            view::stack(machine.stack()),
            view::heap(machine.heap()),
        )?;
        Ok(())
    }

    /// Flush pending output and give the executor its original sink back.
    fn detach(&mut self) -> io::Result<()> {
        let mut capture = self.capture.borrow_mut();
        capture.passthrough = false;
        let flushed = capture.flush();
        if let Some(sink) = capture.sink.take() {
            self.executor.replace_output(sink);
        }
        flushed
    }

    fn load_history(&mut self) {
        let path = &self.config.history_path;
        if !path.exists() {
            debug!(path = %path.display(), "no history file");
            return;
        }
        match self.console.load_history(path) {
            Ok(()) => debug!(path = %path.display(), "history loaded"),
            Err(e) => warn!(path = %path.display(), error = %e, "could not read history file"),
        }
    }

    fn save_history(&mut self) {
        let path = &self.config.history_path;
        match self.console.save_history(path) {
            Ok(()) => debug!(path = %path.display(), "history saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "Error writing history file"),
        }
    }
}
