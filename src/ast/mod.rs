use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Where an instruction came from. Used for diagnostics only, never for control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<Rc<str>>, line: usize, column: usize) -> Self {
        Position { file: file.into(), line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { file: Rc::from(""), line: 0, column: 0 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Label names are runs of `F`/`L` symbols; shared between the label map and the instructions
/// that reference them.
pub type Label = Rc<str>;

// ---- Instruction set ----

/// One executable operation. Index in [`Program::instructions`] is its address.
///
/// Variants that can fail at runtime carry the [`Position`] of the command in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // stack manipulation
    Push { value: i64 },
    Duplicate { pos: Position },
    Copy { n: i64, pos: Position },
    Swap { pos: Position },
    Discard { pos: Position },
    Slide { n: i64, pos: Position },

    // arithmetic, always `lhs op rhs` with rhs on top of the stack
    Addition { pos: Position },
    Subtraction { pos: Position },
    Multiplication { pos: Position },
    Division { pos: Position },
    Modulo { pos: Position },

    // heap access
    Store { pos: Position },
    Retrieve { pos: Position },

    // I/O
    OutputChar { pos: Position },
    OutputNum { pos: Position },
    InputChar { pos: Position },
    InputNum { pos: Position },

    // flow control
    MarkLabel { label: Label },
    Call { label: Label, pos: Position },
    Jump { label: Label, pos: Position },
    JumpIfZero { label: Label, pos: Position },
    JumpIfNegative { label: Label, pos: Position },
    Return { pos: Position },
    EndProgram,
}

/// Width of the mnemonic column in disassembly output.
const MNEMONIC_WIDTH: usize = 15;

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push { .. } => "PUSH",
            Instruction::Duplicate { .. } => "DUP",
            Instruction::Copy { .. } => "COPY",
            Instruction::Swap { .. } => "SWAP",
            Instruction::Discard { .. } => "DISCARD",
            Instruction::Slide { .. } => "SLIDE",
            Instruction::Addition { .. } => "ADD",
            Instruction::Subtraction { .. } => "SUB",
            Instruction::Multiplication { .. } => "MUL",
            Instruction::Division { .. } => "DIV",
            Instruction::Modulo { .. } => "MOD",
            Instruction::Store { .. } => "STORE",
            Instruction::Retrieve { .. } => "RETRIEVE",
            Instruction::OutputChar { .. } => "PUTC",
            Instruction::OutputNum { .. } => "PUTN",
            Instruction::InputChar { .. } => "GETC",
            Instruction::InputNum { .. } => "GETN",
            Instruction::MarkLabel { .. } => "LABEL",
            Instruction::Call { .. } => "CALLSUB",
            Instruction::Jump { .. } => "JUMP",
            Instruction::JumpIfZero { .. } => "JUMP_WHEN_ZERO",
            Instruction::JumpIfNegative { .. } => "JUMP_WHEN_NEGA",
            Instruction::Return { .. } => "ENDSUB",
            Instruction::EndProgram => "END",
        }
    }

    /// Human-readable form: fixed-width mnemonic followed by the operand, if any.
    pub fn disassemble(&self) -> String {
        let name = self.mnemonic();
        match self {
            Instruction::Push { value: n }
            | Instruction::Copy { n, .. }
            | Instruction::Slide { n, .. } => format!("{name:<width$}{n}", width = MNEMONIC_WIDTH),
            Instruction::MarkLabel { label }
            | Instruction::Call { label, .. }
            | Instruction::Jump { label, .. }
            | Instruction::JumpIfZero { label, .. }
            | Instruction::JumpIfNegative { label, .. } => format!("{name:<width$}{label}", width = MNEMONIC_WIDTH),
            _ => name.to_string(),
        }
    }

    pub fn operand(&self) -> Option<String> {
        match self {
            Instruction::Push { value: n }
            | Instruction::Copy { n, .. }
            | Instruction::Slide { n, .. } => Some(n.to_string()),
            Instruction::MarkLabel { label } => Some(label.to_string()),
            _ => self.target().map(|l| l.to_string()),
        }
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            Instruction::Push { .. } | Instruction::MarkLabel { .. } | Instruction::EndProgram => None,
            Instruction::Duplicate { pos }
            | Instruction::Copy { pos, .. }
            | Instruction::Swap { pos }
            | Instruction::Discard { pos }
            | Instruction::Slide { pos, .. }
            | Instruction::Addition { pos }
            | Instruction::Subtraction { pos }
            | Instruction::Multiplication { pos }
            | Instruction::Division { pos }
            | Instruction::Modulo { pos }
            | Instruction::Store { pos }
            | Instruction::Retrieve { pos }
            | Instruction::OutputChar { pos }
            | Instruction::OutputNum { pos }
            | Instruction::InputChar { pos }
            | Instruction::InputNum { pos }
            | Instruction::Call { pos, .. }
            | Instruction::Jump { pos, .. }
            | Instruction::JumpIfZero { pos, .. }
            | Instruction::JumpIfNegative { pos, .. }
            | Instruction::Return { pos } => Some(pos),
        }
    }

    /// Label this instruction transfers control to, if it is a jump or call.
    pub fn target(&self) -> Option<&Label> {
        match self {
            Instruction::Call { label, .. }
            | Instruction::Jump { label, .. }
            | Instruction::JumpIfZero { label, .. }
            | Instruction::JumpIfNegative { label, .. } => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble())
    }
}

// ---- Program ----

/// One row of a machine-readable disassembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub index: usize,
    pub mnemonic: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

/// Loaded program: instruction sequence plus the label table built by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub labels: BTreeMap<Label, usize>,
    pub file: Rc<str>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, labels: BTreeMap<Label, usize>) -> Self {
        Program { instructions, labels, file: Rc::from("") }
    }

    pub fn with_file(mut self, file: impl Into<Rc<str>>) -> Self {
        self.file = file.into();
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Full listing, one `NNNN <disassembly>` line per instruction.
    pub fn disassemble(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, ins)| format!("{i:04} {}\n", ins.disassemble()))
            .collect()
    }

    pub fn listing(&self) -> Vec<ListingEntry> {
        self.instructions
            .iter()
            .enumerate()
            .map(|(index, ins)| ListingEntry {
                index,
                mnemonic: ins.mnemonic(),
                operand: ins.operand(),
                line: ins.position().map(|p| p.line),
                column: ins.position().map(|p| p.column),
            })
            .collect()
    }
}
