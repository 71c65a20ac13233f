//! Input and output hooks injected into the machine.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Supplies one line of text per input instruction. `None` means end of input.
pub trait LineSource {
    fn read_line(&mut self) -> Option<String>;
}

/// Receives the exact text of each output instruction.
pub trait LineSink {
    fn emit(&mut self, text: &str) -> io::Result<()>;
}

/// Reads lines from the process stdin, without the trailing newline.
#[derive(Default)]
pub struct StdinSource;

impl LineSource for StdinSource {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
                Some(trimmed.to_string())
            }
        }
    }
}

/// Writes to the process stdout, flushing after every emit so prompts interleave correctly.
#[derive(Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

/// Fixed queue of input lines.
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput { lines: lines.into_iter().map(Into::into).collect() }
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Clone, Default)]
pub struct BufferSink {
    buf: Rc<RefCell<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buf.borrow().clone()
    }
}

impl LineSink for BufferSink {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.buf.borrow_mut().push_str(text);
        Ok(())
    }
}
