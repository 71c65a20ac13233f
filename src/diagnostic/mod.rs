pub mod ansi;
pub mod json;
pub mod registry;

use crate::ast::{Position, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    /// Where the problem is when no byte span is known (runtime errors, warnings).
    pub position: Option<Position>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            position: None,
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, ..Diagnostic::error(message) }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into(), is_primary: true });
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// File, line and column for the `-->` line, from the position or the primary span.
    pub fn location(&self) -> Option<(String, usize, usize)> {
        if let Some(pos) = &self.position {
            return Some((pos.file.to_string(), pos.line, pos.column));
        }
        let label = self.labels.iter().find(|l| l.is_primary)?;
        let source = self.source.as_deref()?;
        let (line, col) = crate::ast::SourceMap::new(source).lookup(label.span.start);
        Some((String::new(), line, col))
    }
}

// ---- From impls for existing error types ----

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        Diagnostic::error(&e.message)
            .with_code(e.code)
            .with_span(e.span, "here")
            .with_position(e.position.clone())
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        let mut d = Diagnostic::error(&e.message)
            .with_code(e.code)
            .with_span(e.span, "here")
            .with_position(e.position.clone());
        if e.code == "FFL-P003" {
            d = d.with_suggestion("end the parameter with a \"T\"");
        }
        d
    }
}

impl From<&crate::verify::VerifyWarning> for Diagnostic {
    fn from(w: &crate::verify::VerifyWarning) -> Self {
        let mut d = Diagnostic::warning(&w.message).with_code(w.code);
        if let Some(pos) = &w.position {
            d = d.with_position(pos.clone());
        }
        if let Some(hint) = &w.hint {
            d = d.with_suggestion(hint.clone());
        }
        d
    }
}

impl From<&crate::vm::RuntimeError> for Diagnostic {
    fn from(e: &crate::vm::RuntimeError) -> Self {
        let mut d = Diagnostic::error(e.kind.to_string()).with_code(e.kind.code());
        if let Some(pos) = &e.position {
            d = d.with_position(pos.clone());
        }
        d
    }
}
