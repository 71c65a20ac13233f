/// Every spelling the prompt accepts, used for tab completion.
pub const COMMANDS: &[&str] = &[
    "s", "step",
    "c", "continue",
    "b", "break",
    "d", "delete",
    "ib", "info breakpoints",
    "is", "info stack",
    "ih", "info heap",
    "ic", "info callstack",
    "il", "info labels",
    "iv", "info vm",
    "ii", "info instructions",
    "h", "help",
    "exit",
];

pub const HELP: &str = "\
step, s --- Execute one instruction
continue, c --- Run until the next breakpoint or the end of the program
break [N], b [N] --- Set breakpoint at Nth instruction
delete [N], d [N] --- Delete breakpoint at Nth instruction
info breakpoints, ib --- Show breakpoints
info stack, is --- Show stack
info heap, ih --- Show heap
info callstack, ic --- Show call stack
info labels, il --- Show label map
info vm, iv --- Show VM state
info instructions, ii --- Disassemble instructions
help, h --- Show help
exit --- Exit debugger
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Continue,
    Break(usize),
    Delete(usize),
    InfoBreakpoints,
    InfoStack,
    InfoHeap,
    InfoCallStack,
    InfoLabels,
    InfoVm,
    InfoInstructions,
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: \"{0}\", Try \"help\"")]
    Unknown(String),
    #[error("Invalid command arguments: \"{0}\", Try \"help\"")]
    InvalidArgument(String),
}

impl Command {
    /// Parse one prompt line. Blank lines are `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Ok(None),
            ["s" | "step"] => Command::Step,
            ["c" | "continue"] => Command::Continue,
            ["ib"] | ["info", "breakpoints"] => Command::InfoBreakpoints,
            ["is"] | ["info", "stack"] => Command::InfoStack,
            ["ih"] | ["info", "heap"] => Command::InfoHeap,
            ["ic"] | ["info", "callstack"] => Command::InfoCallStack,
            ["il"] | ["info", "labels"] => Command::InfoLabels,
            ["iv"] | ["info", "vm"] => Command::InfoVm,
            ["ii"] | ["info", "instructions"] => Command::InfoInstructions,
            ["h" | "help"] => Command::Help,
            ["exit"] => Command::Exit,
            [name @ ("b" | "break" | "d" | "delete"), arg] => {
                let Ok(n) = arg.parse::<usize>() else {
                    return Err(CommandError::InvalidArgument(format!("{name} {arg}")));
                };
                if name.starts_with('b') { Command::Break(n) } else { Command::Delete(n) }
            }
            ["b" | "break" | "d" | "delete", ..] => {
                return Err(CommandError::InvalidArgument(words.join(" ")));
            }
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        };
        Ok(Some(command))
    }

    /// Whether the command resumes execution rather than inspecting or editing state.
    pub fn resumes(self) -> bool {
        matches!(self, Command::Step | Command::Continue)
    }
}

/// Completion candidates for the text typed so far.
pub fn complete(prefix: &str) -> Vec<&'static str> {
    COMMANDS.iter().copied().filter(|c| c.starts_with(prefix)).collect()
}
