pub mod ast;
pub mod debugger;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod verify;
pub mod vm;
