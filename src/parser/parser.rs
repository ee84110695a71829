use nalgebra::Vector3;
use std::iter::Peekable;
use std::str::FromStr;

use super::{
    lexer::{Lexeme, Lexer, Token},
    Error, Result,
};
use crate::canvas::Color;

/// Token-level helpers for reading forms of the shape `(head args...)`. The meaning of each form
/// is left to the caller.
pub struct Parser<'a> {
    input: &'a str,
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            lexer: Lexer::new(input).peekable(),
        }
    }

    /// The 1-based line and column of a byte offset.
    fn line_column(&self, offset: u32) -> (usize, usize) {
        let before = &self.input[..offset as usize];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.chars().count(), |ix| before[ix + 1..].chars().count())
            + 1;
        (line, column)
    }

    /// An error pointing at `lexeme`.
    pub fn invalid(&self, lexeme: &Lexeme, message: impl Into<String>) -> Error {
        let (line, column) = self.line_column(lexeme.start);
        Error::Invalid {
            line,
            column,
            message: message.into(),
        }
    }

    fn token(&mut self, expected: &'static str) -> Result<Lexeme> {
        self.lexer.next().ok_or(Error::EndOfInput { expected })
    }

    fn guard(&mut self, token: Token, expected: &'static str) -> Result<Lexeme> {
        let tok = self.token(expected)?;
        if tok.token != token {
            let (line, column) = self.line_column(tok.start);
            Err(Error::Unexpected {
                line,
                column,
                expected,
                found: tok.text,
            })
        } else {
            Ok(tok)
        }
    }

    pub fn lparen(&mut self) -> Result<()> {
        self.guard(Token::LParen, "`(`")?;
        Ok(())
    }

    pub fn rparen(&mut self) -> Result<()> {
        self.guard(Token::RParen, "`)`")?;
        Ok(())
    }

    pub fn ident(&mut self) -> Result<Lexeme> {
        self.guard(Token::Ident, "a name")
    }

    pub fn number(&mut self) -> Result<f32> {
        let tok = self.guard(Token::Number, "a number")?;
        f32::from_str(&tok.text).map_err(|_| self.invalid(&tok, "malformed number"))
    }

    /// A number that must be a whole, non-negative value.
    pub fn count(&mut self) -> Result<u32> {
        let tok = self.guard(Token::Number, "a number")?;
        u32::from_str(&tok.text).map_err(|_| self.invalid(&tok, "expected a whole number"))
    }

    pub fn vector(&mut self) -> Result<Vector3<f32>> {
        self.lparen()?;
        let x = self.number()?;
        let y = self.number()?;
        let z = self.number()?;
        self.rparen()?;
        Ok(Vector3::new(x, y, z))
    }

    pub fn color(&mut self) -> Result<Color> {
        let tok = self.guard(Token::Color, "a color")?;
        Color::from_hex(&tok.text).ok_or_else(|| self.invalid(&tok, "colors need six hex digits"))
    }

    fn peek_token(&mut self) -> Option<Token> {
        self.lexer.peek().map(|tok| tok.token)
    }

    /// Read every top-level form until the end of the input, handing the head of each to `form`,
    /// which must consume the rest of the arguments.
    pub fn forms<F>(&mut self, mut form: F) -> Result<()>
    where
        F: FnMut(&mut Self, &Lexeme) -> Result<()>,
    {
        while self.lexer.peek().is_some() {
            self.lparen()?;
            let head = self.ident()?;
            form(self, &head)?;
            self.rparen()?;
        }

        Ok(())
    }

    /// Read `:key value` pairs until the end of the enclosing form, handing each key to `pair`,
    /// which must consume the value.
    pub fn keywords<F>(&mut self, mut pair: F) -> Result<()>
    where
        F: FnMut(&mut Self, &Lexeme) -> Result<()>,
    {
        while self.peek_token() == Some(Token::Symbol) {
            let key = self.token("a keyword")?;
            pair(self, &key)?;
        }

        Ok(())
    }
}
