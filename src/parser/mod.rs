//! A small s-expression reader shared by the pipeline source and input script formats.

use thiserror::Error;

mod lexer;
mod parser;

pub use lexer::{Lexeme, Token};
pub use parser::Parser;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{line}:{column}: expected {expected}, found `{found}`")]
    Unexpected {
        line: usize,
        column: usize,
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of input, expected {expected}")]
    EndOfInput { expected: &'static str },

    #[error("{line}:{column}: {message}")]
    Invalid {
        line: usize,
        column: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
