pub type Pos = u32;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Symbol,
    Number,
    Color,
    Ident,
    Error,
}

#[derive(Debug, Clone)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,

    /// The byte offset of the first character of the lexeme.
    pub start: Pos,
}

#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn consume(&mut self) {
        self.chars.next();
    }

    /// The byte offset of the next unconsumed character.
    fn pos(&mut self) -> Pos {
        self.chars
            .peek()
            .map_or(self.input.len(), |(ix, _)| *ix) as Pos
    }

    fn consume_while<P: FnMut(char) -> bool>(&mut self, mut pred: P) -> usize {
        let mut count = 0;
        while self.chars.next_if(|(_, c)| pred(*c)).is_some() {
            count += 1;
        }
        count
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                ';' => self.skip_line(),
                c if c.is_whitespace() => self.consume(),
                _ => break,
            }
        }
    }

    /// Skip to the next line.
    fn skip_line(&mut self) {
        self.consume_while(|c| c != '\n');
    }

    /// Consume the rest of an identifier whose first character has already been consumed.
    fn consume_ident_tail(&mut self) {
        self.consume_while(|c| c.is_ascii_alphanumeric() || "-_!?".contains(c));
    }

    fn consume_number(&mut self) -> bool {
        let mut dot = false;

        let digits = self.consume_while(|c| {
            if !dot && c == '.' {
                dot = true;
                return true;
            }

            c.is_ascii_digit()
        });

        if digits == 0 {
            return false;
        }

        self.consume_exponent();
        true
    }

    /// Consume an `e`, an optional sign and at least one digit, but only if all of them are there.
    fn consume_exponent(&mut self) {
        let input = self.input;
        let mut chars = input[self.pos() as usize..].chars();
        if !matches!(chars.next(), Some('e' | 'E')) {
            return;
        }

        let mut len = 1;
        let mut next = chars.next();
        if matches!(next, Some('+' | '-')) {
            len += 1;
            next = chars.next();
        }

        if next.map_or(false, |c| c.is_ascii_digit()) {
            for _ in 0..len {
                self.consume();
            }
            self.consume_while(|c| c.is_ascii_digit());
        }
    }

    fn consume_color(&mut self) -> bool {
        self.consume_while(|c| c.is_ascii_hexdigit()) > 0
    }

    /// Construct a lexeme.
    fn lexeme(&mut self, start: Pos, token: Token) -> Lexeme {
        let end = self.pos();
        Lexeme {
            token,
            text: String::from(&self.input[start as usize..end as usize]),
            start,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace_and_comments();

        let start = self.pos();
        let (_, c) = self.chars.next()?;

        let tok = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ':' => {
                if self.peek_char().map_or(false, |c| c.is_ascii_alphabetic()) {
                    self.consume_ident_tail();
                    Token::Symbol
                } else {
                    Token::Error
                }
            }
            '#' => {
                if self.consume_color() {
                    Token::Color
                } else {
                    Token::Error
                }
            }

            '-' => {
                if self.consume_number() {
                    Token::Number
                } else {
                    Token::Error
                }
            }

            _ if c.is_ascii_digit() || c == '.' => {
                self.consume_number();
                Token::Number
            }

            _ if c.is_ascii_alphabetic() => {
                self.consume_ident_tail();
                Token::Ident
            }

            _ => Token::Error,
        };

        Some(self.lexeme(start, tok))
    }
}

#[cfg(test)]
macro_rules! lexer_next {
    ($lexer:ident, $token:expr, $text:expr) => {
        let result = $lexer.next();
        assert!(result.is_some());

        let result = result.unwrap();
        assert_eq!($token, result.token);
        assert_eq!($text, result.text);
    };
}

#[test]
fn test_lex_basic() {
    let input = "(:max-steps 20 0.001 -4 #6600ff lambert))";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, Token::LParen, "(");
    lexer_next!(lexer, Token::Symbol, ":max-steps");
    lexer_next!(lexer, Token::Number, "20");
    lexer_next!(lexer, Token::Number, "0.001");
    lexer_next!(lexer, Token::Number, "-4");
    lexer_next!(lexer, Token::Color, "#6600ff");
    lexer_next!(lexer, Token::Ident, "lambert");
    lexer_next!(lexer, Token::RParen, ")");
    lexer_next!(lexer, Token::RParen, ")");
    assert!(lexer.next().is_none());
}

#[test]
fn test_lex_leading_space() {
    let input = "         :symbol1 :symbol-2";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, Token::Symbol, ":symbol1");
    lexer_next!(lexer, Token::Symbol, ":symbol-2");
}

#[test]
fn test_lex_trailing_space() {
    let input = ":symbol   ";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, Token::Symbol, ":symbol");
    assert!(lexer.next().is_none());
}

#[test]
fn test_lex_leading_comment() {
    let input = "    ;; foo comment\n     :symbol";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, Token::Symbol, ":symbol");
}

#[test]
fn test_lex_offsets() {
    let mut lexer = Lexer::new("(move\n  10)");
    assert_eq!(0, lexer.next().unwrap().start);
    assert_eq!(1, lexer.next().unwrap().start);
    assert_eq!(8, lexer.next().unwrap().start);
    assert_eq!(10, lexer.next().unwrap().start);
}

#[test]
fn test_lex_exponents() {
    let mut lexer = Lexer::new("1e-4 2.5E3 3e+2 4e 5each");
    lexer_next!(lexer, Token::Number, "1e-4");
    lexer_next!(lexer, Token::Number, "2.5E3");
    lexer_next!(lexer, Token::Number, "3e+2");
    lexer_next!(lexer, Token::Number, "4");
    lexer_next!(lexer, Token::Ident, "e");
    lexer_next!(lexer, Token::Number, "5");
    lexer_next!(lexer, Token::Ident, "each");
    assert!(lexer.next().is_none());
}

#[test]
fn test_lex_errors() {
    let mut lexer = Lexer::new(": # - @");
    lexer_next!(lexer, Token::Error, ":");
    lexer_next!(lexer, Token::Error, "#");
    lexer_next!(lexer, Token::Error, "-");
    lexer_next!(lexer, Token::Error, "@");
}
