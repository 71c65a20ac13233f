//! Source → program → executor plumbing shared by the CLI and the tests.

use std::path::Path;

use tracing::debug;

use crate::ast::Program;
use crate::lexer::{self, LexError};
use crate::parser::{self, ParseError};
use crate::vm::{Executor, RuntimeError, StdinSource, StdoutSink};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{path} can not read: {source}")]
    Read { path: String, source: std::io::Error },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub fn read_source(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path)
        .map_err(|source| LoadError::Read { path: path.display().to_string(), source })
}

/// Lex and parse `source`; `file` is the name recorded in positions.
pub fn compile(source: &str, file: &str) -> Result<Program, LoadError> {
    let tokens = lexer::lex(source, file)?;
    debug!(file, tokens = tokens.len(), "lexed");
    let program = parser::parse(tokens, file)?;
    debug!(file, instructions = program.len(), labels = program.labels.len(), "parsed");
    Ok(program)
}

pub fn load(path: &Path) -> Result<Program, LoadError> {
    let source = read_source(path)?;
    compile(&source, &path.display().to_string())
}

/// Executor wired to the process stdin and stdout.
pub fn stdio_executor(program: Program) -> Executor {
    Executor::new(program, Box::new(StdinSource), Box::new(StdoutSink))
}

/// Run to completion on stdio.
pub fn run(program: Program) -> Result<(), RuntimeError> {
    stdio_executor(program).run()
}
