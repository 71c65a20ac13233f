use crate::ast::SourceMap;
use super::{Diagnostic, Severity};

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn bold(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold_red(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1;31m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold_yellow(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1;33m{s}\x1b[0m") } else { s.to_string() }
    }

    fn cyan(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[36m{s}\x1b[0m") } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[2m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[FFL-R003]: message"
        let mut severity_label = match d.severity {
            Severity::Error => "error".to_string(),
            Severity::Warning => "warning".to_string(),
        };
        if let Some(code) = d.code {
            severity_label.push_str(&format!("[{code}]"));
        }
        let severity_label = match d.severity {
            Severity::Error => self.bold_red(&severity_label),
            Severity::Warning => self.bold_yellow(&severity_label),
        };
        out.push_str(&format!("{}: {}\n", severity_label, self.bold(&d.message)));

        if let Some((file, line, col)) = d.location() {
            let place = if file.is_empty() { format!("{line}:{col}") } else { format!("{file}:{line}:{col}") };
            out.push_str(&format!("  {} {}\n", self.cyan("-->"), place));

            if let Some(source) = &d.source {
                let map = SourceMap::new(source);
                let line_text = map.line_text(source, line);

                // Gutter width based on line number digits
                let gutter = line.to_string().len();
                let pipe = self.cyan("|");
                let pad = " ".repeat(gutter);

                out.push_str(&format!("{pad} {pipe}\n"));
                let line_num = self.cyan(&format!("{line:>gutter$}"));
                out.push_str(&format!("{line_num} {pipe} {line_text}\n"));

                let primary = d.labels.iter().find(|l| l.is_primary);
                let span_len = primary
                    .map(|l| l.span.end.saturating_sub(l.span.start))
                    .unwrap_or(0)
                    .max(1);
                let carets = self.bold_red(&"^".repeat(span_len));
                let indent = " ".repeat(col.saturating_sub(1));
                match primary.filter(|l| !l.message.is_empty()) {
                    Some(label) => out.push_str(&format!(
                        "{pad} {pipe} {indent}{carets} {}\n",
                        self.bold_red(&label.message)
                    )),
                    None => out.push_str(&format!("{pad} {pipe} {indent}{carets}\n")),
                }
                out.push_str(&format!("{pad} {pipe}\n"));
            }
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }

        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} suggestion: {}\n", self.dim("="), suggestion));
        }

        out
    }
}
