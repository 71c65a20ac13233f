/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str,  // brief description for listings
    pub long: &'static str,   // full explanation for --explain
}

/// All stable diagnostic codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "FFL-L001",
        short: "invalid command",
        long: r#"## FFL-L001: invalid command

The symbols at this position do not form a command. Commands are
prefix-coded: `F` starts a stack command, `LF` arithmetic, `LL` heap
access, `LT` I/O and `T` flow control.

**Example that triggers this:**

    LLT

`LL` must be followed by `F` (store) or `L` (retrieve).
"#,
    },
    ErrorEntry {
        code: "FFL-L002",
        short: "unexpected end of input inside a command",
        long: r#"## FFL-L002: unexpected end of input

The source ended in the middle of a command.

**Example that triggers this:**

    FFFLT LF

`LF` needs two more symbols to name an arithmetic command.
"#,
    },
    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "FFL-P001",
        short: "missing or misplaced parameter",
        long: r#"## FFL-P001: missing or misplaced parameter

`push`, `copy` and `slide` take a number; `mark`, `call`, `jump` and
the conditional jumps take a label. The parameter must follow the
command directly.
"#,
    },
    ErrorEntry {
        code: "FFL-P002",
        short: "malformed parameter",
        long: r#"## FFL-P002: malformed parameter

A number starts with a sign symbol (`F` positive, `L` negative) and
needs at least one binary digit (`F` = 0, `L` = 1). A label needs at
least one symbol before its terminating `T`.

**Example that triggers this:**

    FF FT

The number has a sign but no digits. Write `FF FFT` to push zero.
"#,
    },
    ErrorEntry {
        code: "FFL-P003",
        short: "parameter not terminated",
        long: r#"## FFL-P003: parameter not terminated

Numbers and labels end with a `T`. The source ended before one was
found.

**Example that triggers this:**

    FF FLL

**Fix:**

    FF FLLT
"#,
    },
    ErrorEntry {
        code: "FFL-P004",
        short: "number out of range",
        long: r#"## FFL-P004: number out of range

Values are signed 64-bit integers. The binary literal has more
significant digits than fit.
"#,
    },
    ErrorEntry {
        code: "FFL-P005",
        short: "label marked twice",
        long: r#"## FFL-P005: label marked twice

Each label may be marked only once, otherwise jumps to it would be
ambiguous. Rename one of the marks.
"#,
    },
    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "FFL-R001",
        short: "stack is empty",
        long: r#"## FFL-R001: stack is empty

An instruction needed more values than the stack holds. Arithmetic,
`swap`, `store` and the output commands pop two or one values.
"#,
    },
    ErrorEntry {
        code: "FFL-R002",
        short: "invalid copy/slide operand",
        long: r#"## FFL-R002: invalid copy/slide operand

`copy n` and `slide n` require `0 <= n < stack length`.
"#,
    },
    ErrorEntry {
        code: "FFL-R003",
        short: "integer divide by zero",
        long: r#"## FFL-R003: integer divide by zero

The right-hand operand (top of stack) of `div` or `mod` was zero.
Both operands are consumed and nothing is pushed.
"#,
    },
    ErrorEntry {
        code: "FFL-R004",
        short: "invalid heap access",
        long: r#"## FFL-R004: invalid heap access

`retrieve` read an address that was never written. The heap is not
zero-filled; store a value first.
"#,
    },
    ErrorEntry {
        code: "FFL-R005",
        short: "label not found",
        long: r#"## FFL-R005: label not found

A `call` or jump was executed whose target label is never marked.
Labels are resolved when the instruction runs, so an untaken
conditional jump to a missing label is not an error. The verifier
reports these statically as FFL-W001.
"#,
    },
    ErrorEntry {
        code: "FFL-R006",
        short: "call stack is empty",
        long: r#"## FFL-R006: call stack is empty

`return` was executed without a matching `call`.
"#,
    },
    ErrorEntry {
        code: "FFL-R007",
        short: "malformed input",
        long: r#"## FFL-R007: malformed input

`getc` received an empty line, or `getn` received text that is not a
base-10 signed integer.
"#,
    },
    ErrorEntry {
        code: "FFL-R008",
        short: "output failed",
        long: r#"## FFL-R008: output failed

Writing program output failed, for example because stdout was closed.
"#,
    },
    // ── Verifier warnings ────────────────────────────────────────────────────
    ErrorEntry {
        code: "FFL-W001",
        short: "jump target never marked",
        long: r#"## FFL-W001: jump target never marked

A `call` or jump names a label that no `mark` defines. The program
still runs; it fails with FFL-R005 if the instruction executes.
"#,
    },
    ErrorEntry {
        code: "FFL-W002",
        short: "return without call",
        long: r#"## FFL-W002: return without call

The program contains `return` but no `call`, so the call stack is
always empty when it executes.
"#,
    },
];

/// Look up an error entry by code (e.g. `"FFL-R003"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::ErrorKind;

    #[test]
    fn lookup_known_code() {
        let e = lookup("FFL-R003").expect("FFL-R003 should be in registry");
        assert_eq!(e.code, "FFL-R003");
        assert_eq!(e.short, "integer divide by zero");
        assert!(e.long.contains("FFL-R003"));
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("FFL-X999").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn all_codes_unique() {
        let mut codes: Vec<&str> = REGISTRY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let len_before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), len_before, "duplicate codes in registry");
    }

    #[test]
    fn all_codes_have_content() {
        for entry in REGISTRY {
            assert!(!entry.short.is_empty(), "{} missing short description", entry.code);
            assert!(entry.long.contains(entry.code), "{} long text lacks its code", entry.code);
        }
    }

    #[test]
    fn every_runtime_kind_is_registered() {
        let kinds = [
            ErrorKind::StackUnderflow,
            ErrorKind::InvalidOperand(String::new()),
            ErrorKind::DivideByZero,
            ErrorKind::InvalidHeapAccess(0),
            ErrorKind::UnresolvedLabel("F".into()),
            ErrorKind::EmptyCallStack,
            ErrorKind::MalformedInput(String::new()),
            ErrorKind::OutputFailed(String::new()),
        ];
        for kind in kinds {
            assert!(lookup(kind.code()).is_some(), "{kind:?} not registered");
        }
    }
}
