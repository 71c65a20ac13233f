use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ast::*;

pub mod io;
mod instructions;

pub use io::{BufferSink, LineSink, LineSource, ScriptedInput, StdinSource, StdoutSink};

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("stack is empty")]
    StackUnderflow,
    #[error("{0}")]
    InvalidOperand(String),
    #[error("integer divide by zero")]
    DivideByZero,
    #[error("invalid heap access at address {0}")]
    InvalidHeapAccess(i64),
    #[error("label \"{0}\" is not found")]
    UnresolvedLabel(Label),
    #[error("call stack is empty")]
    EmptyCallStack,
    #[error("{0}")]
    MalformedInput(String),
    #[error("failed to write output: {0}")]
    OutputFailed(String),
}

impl ErrorKind {
    /// Stable diagnostic code, see `diagnostic::registry`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::StackUnderflow => "FFL-R001",
            ErrorKind::InvalidOperand(_) => "FFL-R002",
            ErrorKind::DivideByZero => "FFL-R003",
            ErrorKind::InvalidHeapAccess(_) => "FFL-R004",
            ErrorKind::UnresolvedLabel(_) => "FFL-R005",
            ErrorKind::EmptyCallStack => "FFL-R006",
            ErrorKind::MalformedInput(_) => "FFL-R007",
            ErrorKind::OutputFailed(_) => "FFL-R008",
        }
    }
}

/// Fatal failure of the current run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Runtime error: {kind}{}", .position.as_ref().map(|p| format!(" at {p}")).unwrap_or_default())]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub position: Option<Position>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, position: Option<&Position>) -> Self {
        RuntimeError { kind, position: position.cloned() }
    }
}

type VmResult<T> = Result<T, RuntimeError>;

// ── Machine state ────────────────────────────────────────────────────

/// How the program counter moves after an instruction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the following instruction.
    Next,
    /// Continue at an absolute instruction index.
    Jump(usize),
    /// Stop the program normally.
    Halt,
}

/// Operand stack, heap, call stack and program counter, plus the I/O hooks.
pub struct Machine {
    pub(crate) stack: Vec<i64>,
    pub(crate) heap: HashMap<i64, i64>,
    pub(crate) call_stack: Vec<usize>,
    pub(crate) pc: usize,
    input: Box<dyn LineSource>,
    output: Box<dyn LineSink>,
}

impl Machine {
    pub fn new(input: Box<dyn LineSource>, output: Box<dyn LineSink>) -> Self {
        Machine {
            stack: Vec::with_capacity(64),
            heap: HashMap::new(),
            call_stack: Vec::new(),
            pc: 0,
            input,
            output,
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.heap.clear();
        self.call_stack.clear();
        self.pc = 0;
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn heap(&self) -> &HashMap<i64, i64> {
        &self.heap
    }

    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub(crate) fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self, pos: &Position) -> VmResult<i64> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeError::new(ErrorKind::StackUnderflow, Some(pos)))
    }

    pub(crate) fn pop_call(&mut self, pos: &Position) -> VmResult<usize> {
        self.call_stack
            .pop()
            .ok_or_else(|| RuntimeError::new(ErrorKind::EmptyCallStack, Some(pos)))
    }

    pub(crate) fn read_line(&mut self) -> Option<String> {
        self.input.read_line()
    }

    pub(crate) fn emit(&mut self, text: &str, pos: &Position) -> VmResult<()> {
        self.output
            .emit(text)
            .map_err(|e| RuntimeError::new(ErrorKind::OutputFailed(e.to_string()), Some(pos)))
    }
}

// ── Executor ─────────────────────────────────────────────────────────

/// Drives the fetch-execute loop of one program over one machine.
pub struct Executor {
    program: Program,
    machine: Machine,
}

impl Executor {
    pub fn new(program: Program, input: Box<dyn LineSource>, output: Box<dyn LineSink>) -> Self {
        Executor { program, machine: Machine::new(input, output) }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn pc(&self) -> usize {
        self.machine.pc
    }

    /// `pc == len(program)` is normal termination.
    pub fn is_finished(&self) -> bool {
        self.machine.pc >= self.program.len()
    }

    pub fn current(&self) -> Option<&Instruction> {
        self.program.instructions.get(self.machine.pc)
    }

    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Swap the output hook, returning the previous one.
    pub fn replace_output(&mut self, output: Box<dyn LineSink>) -> Box<dyn LineSink> {
        std::mem::replace(&mut self.machine.output, output)
    }

    /// Execute the instruction at `pc`. State mutated before a failure is kept as is.
    pub fn step(&mut self) -> VmResult<()> {
        let Some(instruction) = self.program.instructions.get(self.machine.pc) else {
            return Ok(());
        };
        trace!(pc = self.machine.pc, instruction = %instruction, "execute");
        match instruction.execute(&mut self.machine, &self.program)? {
            Flow::Next => self.machine.pc += 1,
            Flow::Jump(target) => self.machine.pc = target,
            Flow::Halt => self.machine.pc = self.program.len(),
        }
        Ok(())
    }

    /// Reset the machine and run until the program ends or the first runtime error.
    pub fn run(&mut self) -> VmResult<()> {
        self.reset();
        debug!(instructions = self.program.len(), file = %self.program.file, "run start");
        while !self.is_finished() {
            if let Err(err) = self.step() {
                debug!(pc = self.machine.pc, error = %err, "run aborted");
                return Err(err);
            }
        }
        debug!(pc = self.machine.pc, "run finished");
        Ok(())
    }
}
