use std::rc::Rc;

use super::Position;

/// Maps byte offsets to line/column positions within source text.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { line_starts }
    }

    /// Returns (line, col), both 1-based.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line + 1, col + 1)
    }

    /// Diagnostic tag for the byte at `offset` in `file`.
    pub fn position(&self, file: &Rc<str>, offset: usize) -> Position {
        let (line, column) = self.lookup(offset);
        Position { file: Rc::clone(file), line, column }
    }

    /// Returns the full text of the given 1-based line number.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        source[start..end].trim_end_matches('\n').trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_columns() {
        let sm = SourceMap::new("FF FLT TTT");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(3), (1, 4));
        assert_eq!(sm.lookup(9), (1, 10));
    }

    #[test]
    fn columns_restart_after_newline() {
        let sm = SourceMap::new("push one\nFFFLT\nTTT");
        assert_eq!(sm.lookup(8), (1, 9)); // the '\n' still belongs to line 1
        assert_eq!(sm.lookup(9), (2, 1));
        assert_eq!(sm.lookup(15), (3, 1));
    }

    #[test]
    fn position_carries_file() {
        let file: Rc<str> = Rc::from("hello.fflt");
        let sm = SourceMap::new("x\nFTF");
        let pos = sm.position(&file, 3);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.to_string(), "hello.fflt:2:2");
    }

    #[test]
    fn line_text_strips_terminators() {
        let src = "FF comment\r\nTTT\n";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "FF comment");
        assert_eq!(sm.line_text(src, 2), "TTT");
        assert_eq!(sm.line_text(src, 3), "");
    }

    #[test]
    fn line_text_out_of_bounds() {
        let src = "TTT";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 0), "");
        assert_eq!(sm.line_text(src, 42), "");
    }

    #[test]
    fn empty_source() {
        let sm = SourceMap::new("");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.line_text("", 1), "");
    }
}
