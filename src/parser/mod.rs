use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ast::*;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, thiserror::Error)]
#[error("Syntax error: {message} at {position}")]
pub struct ParseError {
    pub code: &'static str,
    pub span: Span,
    pub position: Position,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    instructions: Vec<Instruction>,
    labels: BTreeMap<Label, usize>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, instructions: Vec::new(), labels: BTreeMap::new() }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn error(code: &'static str, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError {
            code,
            span: token.span,
            position: token.position.clone(),
            message: message.into(),
        }
    }

    /// Parameter token following `command`.
    fn parameter(&mut self, command: &Token) -> Result<Token> {
        self.advance()
            .ok_or_else(|| Self::error("FFL-P001", command, "expected parameter token"))
    }

    pub fn parse_program(mut self, file: &str) -> Result<Program> {
        while let Some(token) = self.advance() {
            self.parse_command(token)?;
        }
        Ok(Program::new(self.instructions, self.labels).with_file(file))
    }

    fn parse_command(&mut self, token: Token) -> Result<()> {
        let pos = token.position.clone();
        let instruction = match &token.kind {
            TokenKind::Push => Instruction::Push { value: self.number(&token)? },
            TokenKind::Copy => Instruction::Copy { n: self.number(&token)?, pos },
            TokenKind::Slide => Instruction::Slide { n: self.number(&token)?, pos },
            TokenKind::Duplicate => Instruction::Duplicate { pos },
            TokenKind::Swap => Instruction::Swap { pos },
            TokenKind::Discard => Instruction::Discard { pos },

            TokenKind::Addition => Instruction::Addition { pos },
            TokenKind::Subtraction => Instruction::Subtraction { pos },
            TokenKind::Multiplication => Instruction::Multiplication { pos },
            TokenKind::Division => Instruction::Division { pos },
            TokenKind::Modulo => Instruction::Modulo { pos },

            TokenKind::Store => Instruction::Store { pos },
            TokenKind::Retrieve => Instruction::Retrieve { pos },

            TokenKind::OutputChar => Instruction::OutputChar { pos },
            TokenKind::OutputNum => Instruction::OutputNum { pos },
            TokenKind::InputChar => Instruction::InputChar { pos },
            TokenKind::InputNum => Instruction::InputNum { pos },

            TokenKind::MarkLabel => {
                let (label, label_token) = self.label(&token)?;
                if self.labels.contains_key(&label) {
                    return Err(Self::error(
                        "FFL-P005",
                        &label_token,
                        format!("label \"{label}\" is already defined"),
                    ));
                }
                self.labels.insert(Rc::clone(&label), self.instructions.len());
                Instruction::MarkLabel { label }
            }
            TokenKind::Call => Instruction::Call { label: self.label(&token)?.0, pos },
            TokenKind::Jump => Instruction::Jump { label: self.label(&token)?.0, pos },
            TokenKind::JumpIfZero => Instruction::JumpIfZero { label: self.label(&token)?.0, pos },
            TokenKind::JumpIfNegative => {
                Instruction::JumpIfNegative { label: self.label(&token)?.0, pos }
            }
            TokenKind::Return => Instruction::Return { pos },
            TokenKind::EndProgram => Instruction::EndProgram,

            TokenKind::Number(_) | TokenKind::Label(_) => {
                return Err(Self::error("FFL-P001", &token, "parameter without a command"));
            }
        };
        self.instructions.push(instruction);
        Ok(())
    }

    fn number(&mut self, command: &Token) -> Result<i64> {
        let token = self.parameter(command)?;
        match &token.kind {
            TokenKind::Number(literal) => parse_number(literal)
                .map_err(|(code, message)| Self::error(code, &token, message)),
            other => Err(Self::error(
                "FFL-P001",
                &token,
                format!("expected number parameter, but found {other:?}"),
            )),
        }
    }

    fn label(&mut self, command: &Token) -> Result<(Label, Token)> {
        let token = self.parameter(command)?;
        let label = match &token.kind {
            TokenKind::Label(literal) => parse_label(literal)
                .map_err(|(code, message)| Self::error(code, &token, message))?,
            other => {
                return Err(Self::error(
                    "FFL-P001",
                    &token,
                    format!("expected label parameter, but found {other:?}"),
                ));
            }
        };
        Ok((Rc::from(label), token))
    }
}

/// Sign symbol, then binary digits (`F` = 0, `L` = 1), then `T`.
fn parse_number(literal: &str) -> std::result::Result<i64, (&'static str, String)> {
    let mut chars = literal.chars();
    let negative = match chars.next() {
        Some('F') => false,
        Some('L') => true,
        _ => return Err(("FFL-P002", "expected sign".to_string())),
    };

    let mut value: i64 = 0;
    let mut digits = 0usize;
    for c in chars {
        let bit = match c {
            'F' => 0,
            'L' => 1,
            _ => {
                if digits == 0 {
                    return Err(("FFL-P002", "expected number parameter".to_string()));
                }
                return Ok(value);
            }
        };
        // Negative literals accumulate downwards so i64::MIN stays representable.
        value = value
            .checked_mul(2)
            .and_then(|v| if negative { v.checked_sub(bit) } else { v.checked_add(bit) })
            .ok_or_else(|| ("FFL-P004", "number does not fit in 64 bits".to_string()))?;
        digits += 1;
    }
    Err(("FFL-P003", "expected numeric parameters end with a \"T\"".to_string()))
}

/// Label symbols followed by a terminating `T`; the terminator is not part of the name.
fn parse_label(literal: &str) -> std::result::Result<&str, (&'static str, String)> {
    match literal.strip_suffix('T') {
        Some(name) if !name.is_empty() => Ok(name),
        Some(_) => Err(("FFL-P002", "expected label parameters".to_string())),
        None => Err(("FFL-P003", "expected label parameters end with a \"T\"".to_string())),
    }
}

/// Parse a token stream into a program.
pub fn parse(tokens: Vec<Token>, file: &str) -> Result<Program> {
    Parser::new(tokens).parse_program(file)
}
