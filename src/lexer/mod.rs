use std::rc::Rc;

use logos::Logos;

use crate::ast::{Position, SourceMap, Span};

/// The three significant characters. Everything else in a source file is commentary.
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[^FfLlTt]+")]
pub enum Symbol {
    #[regex("[Ff]")]
    F,
    #[regex("[Ll]")]
    L,
    #[regex("[Tt]")]
    T,
}

impl Symbol {
    fn as_char(self) -> char {
        match self {
            Symbol::F => 'F',
            Symbol::L => 'L',
            Symbol::T => 'T',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Push,
    Duplicate,
    Copy,
    Swap,
    Discard,
    Slide,

    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,

    Store,
    Retrieve,

    OutputChar,
    OutputNum,
    InputChar,
    InputNum,

    MarkLabel,
    Call,
    Jump,
    JumpIfZero,
    JumpIfNegative,
    Return,
    EndProgram,

    /// Raw parameter symbols, terminator included when present.
    Number(String),
    Label(String),
}

impl TokenKind {
    /// Commands followed by a number parameter.
    fn takes_number(&self) -> bool {
        matches!(self, TokenKind::Push | TokenKind::Copy | TokenKind::Slide)
    }

    /// Commands followed by a label parameter.
    fn takes_label(&self) -> bool {
        matches!(
            self,
            TokenKind::MarkLabel
                | TokenKind::Call
                | TokenKind::Jump
                | TokenKind::JumpIfZero
                | TokenKind::JumpIfNegative
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub position: Position,
}

#[derive(Debug, thiserror::Error)]
#[error("Syntax error: {message} at {position}")]
pub struct LexError {
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub position: Position,
}

/// Lex source text into command and parameter tokens.
pub fn lex(source: &str, file: &str) -> Result<Vec<Token>, LexError> {
    let file: Rc<str> = Rc::from(file);
    let map = SourceMap::new(source);

    let mut symbols = Vec::new();
    let mut lexer = Symbol::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let span = Span { start: span.start, end: span.end };
        match result {
            Ok(symbol) => symbols.push((symbol, span)),
            Err(()) => {
                return Err(LexError {
                    code: "FFL-L001",
                    message: format!("unrecognised input '{}'", &source[span.start..span.end]),
                    position: map.position(&file, span.start),
                    span,
                });
            }
        }
    }

    Scanner { symbols, pos: 0, map, file, end: source.len() }.scan_all()
}

struct Scanner {
    symbols: Vec<(Symbol, Span)>,
    pos: usize,
    map: SourceMap,
    file: Rc<str>,
    end: usize,
}

impl Scanner {
    fn scan_all(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while self.pos < self.symbols.len() {
            let start = self.symbols[self.pos].1.start;
            let kind = self.scan_command()?;
            let span = Span { start, end: self.last_end() };
            let position = self.map.position(&self.file, start);

            tokens.push(Token { kind: kind.clone(), span, position });

            if kind.takes_number() || kind.takes_label() {
                let value_start = self.symbols.get(self.pos).map_or(span.end, |(_, s)| s.start);
                let literal = self.scan_value();
                let value = if kind.takes_number() {
                    TokenKind::Number(literal)
                } else {
                    TokenKind::Label(literal)
                };
                tokens.push(Token {
                    kind: value,
                    span: Span { start: value_start, end: self.last_end().max(value_start) },
                    position: self.map.position(&self.file, value_start),
                });
            }
        }
        Ok(tokens)
    }

    fn scan_command(&mut self) -> Result<TokenKind, LexError> {
        match self.expect("instruction")? {
            Symbol::F => self.scan_stack(),
            Symbol::L => match self.expect("instruction")? {
                Symbol::F => self.scan_arithmetic(),
                Symbol::L => self.scan_heap(),
                Symbol::T => self.scan_io(),
            },
            Symbol::T => self.scan_flow(),
        }
    }

    fn scan_stack(&mut self) -> Result<TokenKind, LexError> {
        const CONTEXT: &str = "stack manipulation";
        Ok(match self.expect(CONTEXT)? {
            Symbol::F => TokenKind::Push,
            Symbol::L => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::Copy,
                Symbol::T => TokenKind::Slide,
                Symbol::L => return Err(self.unexpected(CONTEXT)),
            },
            Symbol::T => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::Duplicate,
                Symbol::L => TokenKind::Swap,
                Symbol::T => TokenKind::Discard,
            },
        })
    }

    fn scan_arithmetic(&mut self) -> Result<TokenKind, LexError> {
        const CONTEXT: &str = "arithmetic";
        Ok(match self.expect(CONTEXT)? {
            Symbol::F => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::Addition,
                Symbol::L => TokenKind::Subtraction,
                Symbol::T => TokenKind::Multiplication,
            },
            Symbol::L => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::Division,
                Symbol::L => TokenKind::Modulo,
                Symbol::T => return Err(self.unexpected(CONTEXT)),
            },
            Symbol::T => return Err(self.unexpected(CONTEXT)),
        })
    }

    fn scan_heap(&mut self) -> Result<TokenKind, LexError> {
        const CONTEXT: &str = "heap access";
        Ok(match self.expect(CONTEXT)? {
            Symbol::F => TokenKind::Store,
            Symbol::L => TokenKind::Retrieve,
            Symbol::T => return Err(self.unexpected(CONTEXT)),
        })
    }

    fn scan_io(&mut self) -> Result<TokenKind, LexError> {
        const CONTEXT: &str = "I/O";
        Ok(match self.expect(CONTEXT)? {
            Symbol::F => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::OutputChar,
                Symbol::L => TokenKind::OutputNum,
                Symbol::T => return Err(self.unexpected(CONTEXT)),
            },
            Symbol::L => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::InputChar,
                Symbol::L => TokenKind::InputNum,
                Symbol::T => return Err(self.unexpected(CONTEXT)),
            },
            Symbol::T => return Err(self.unexpected(CONTEXT)),
        })
    }

    fn scan_flow(&mut self) -> Result<TokenKind, LexError> {
        const CONTEXT: &str = "flow control";
        Ok(match self.expect(CONTEXT)? {
            Symbol::F => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::MarkLabel,
                Symbol::L => TokenKind::Call,
                Symbol::T => TokenKind::Jump,
            },
            Symbol::L => match self.expect(CONTEXT)? {
                Symbol::F => TokenKind::JumpIfZero,
                Symbol::L => TokenKind::JumpIfNegative,
                Symbol::T => TokenKind::Return,
            },
            Symbol::T => match self.expect(CONTEXT)? {
                Symbol::T => TokenKind::EndProgram,
                _ => return Err(self.unexpected(CONTEXT)),
            },
        })
    }

    /// Symbols up to and including the terminating `T`, or to end of input.
    fn scan_value(&mut self) -> String {
        let mut literal = String::new();
        while let Some(&(symbol, _)) = self.symbols.get(self.pos) {
            self.pos += 1;
            literal.push(symbol.as_char());
            if symbol == Symbol::T {
                break;
            }
        }
        literal
    }

    fn expect(&mut self, context: &str) -> Result<Symbol, LexError> {
        match self.symbols.get(self.pos) {
            Some(&(symbol, _)) => {
                self.pos += 1;
                Ok(symbol)
            }
            None => Err(LexError {
                code: "FFL-L002",
                message: format!("unexpected end of input, expected {context} command"),
                span: Span { start: self.end, end: self.end },
                position: self.map.position(&self.file, self.end),
            }),
        }
    }

    /// Error for the symbol just consumed.
    fn unexpected(&self, context: &str) -> LexError {
        let span = self.symbols[self.pos - 1].1;
        LexError {
            code: "FFL-L001",
            message: format!("expected {context} command"),
            span,
            position: self.map.position(&self.file, span.start),
        }
    }

    fn last_end(&self) -> usize {
        self.pos.checked_sub(1).map(|i| self.symbols[i].1.end).unwrap_or(0)
    }
}
