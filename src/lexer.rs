use std::iter::Peekable;
use std::str::Chars;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::token::{Literal, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    eof_reached: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            eof_reached: false,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        loop {
            match self.chars.peek() {
                Some(&c) if c.is_whitespace() => {
                    self.advance_char();
                }
                Some(&'[') => self.skip_comment(),
                _ => break,
            }
        }

        let line = self.line;
        let column = self.column;
        let Some(&ch) = self.chars.peek() else {
            self.eof_reached = true;
            return Ok(Token::new(TokenKind::Eof, line, column));
        };

        if ch.is_alphabetic() {
            return Ok(self.read_identifier(line, column));
        }
        if ch.is_ascii_digit() {
            return self.read_number(line, column);
        }
        if ch == '"' {
            return self.read_string(line, column);
        }
        if ch == ':' {
            self.advance_char();
            if let Some(&'=') = self.chars.peek() {
                self.advance_char();
                return Ok(Token::new(TokenKind::Assign, line, column));
            }
            return Ok(Token::new(TokenKind::Colon, line, column));
        }

        match TokenKind::from_punct(ch) {
            Some(kind) => {
                self.advance_char();
                Ok(Token::new(kind, line, column))
            }
            None => Err(LexError::UnexpectedCharacter {
                character: ch,
                line,
                column,
            }),
        }
    }

    fn skip_comment(&mut self) {
        self.advance_char(); // Consume '['
        while let Some(c) = self.advance_char() {
            if c == ']' {
                break;
            }
        }
    }

    fn read_identifier(&mut self, line: usize, column: usize) -> Token {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() {
                word.push(c);
                self.advance_char();
            } else {
                break;
            }
        }

        match TokenKind::keyword(&word) {
            Some(kind) => Token::new(kind, line, column),
            None => Token::with_literal(TokenKind::Id, Literal::Str(word), line, column),
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> LexResult<Token> {
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance_char();
            } else {
                break;
            }
        }

        if let Some(&'.') = self.chars.peek() {
            self.advance_char();
            let mut scale = 0i64;
            while let Some(&c) = self.chars.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    scale += 1;
                    self.advance_char();
                } else {
                    break;
                }
            }
            let unscaled = self.parse_digits(&digits, line, column)?;
            let value = BigDecimal::new(unscaled, scale);
            return Ok(Token::with_literal(
                TokenKind::RealConst,
                Literal::Decimal(value),
                line,
                column,
            ));
        }

        let value = self.parse_digits(&digits, line, column)?;
        Ok(Token::with_literal(
            TokenKind::IntegerConst,
            Literal::Integer(value),
            line,
            column,
        ))
    }

    fn parse_digits(&self, digits: &str, line: usize, column: usize) -> LexResult<BigInt> {
        BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| LexError::InvalidNumber {
            literal: digits.to_string(),
            line,
            column,
        })
    }

    fn read_string(&mut self, line: usize, column: usize) -> LexResult<Token> {
        self.advance_char(); // Consume opening quote
        let mut value = String::new();
        loop {
            match self.chars.peek() {
                None => return Err(LexError::UnterminatedString { line, column }),
                Some(&'"') => {
                    self.advance_char();
                    break;
                }
                Some(&'\\') => {
                    let escape_line = self.line;
                    let escape_column = self.column;
                    self.advance_char();
                    value.push(self.read_escape(escape_line, escape_column)?);
                }
                Some(&c) => {
                    value.push(c);
                    self.advance_char();
                }
            }
        }
        Ok(Token::with_literal(
            TokenKind::StringConst,
            Literal::Str(value),
            line,
            column,
        ))
    }

    fn read_escape(&mut self, line: usize, column: usize) -> LexResult<char> {
        let Some(c) = self.advance_char() else {
            return Err(LexError::InvalidEscape {
                sequence: String::new(),
                line,
                column,
            });
        };
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'b' => Ok('\u{0008}'),
            '0' => Ok('\0'),
            'x' => self.read_hex_escape('x', 2, line, column),
            'u' => self.read_hex_escape('u', 4, line, column),
            // Unknown escapes yield the escaped character itself
            other => Ok(other),
        }
    }

    fn read_hex_escape(
        &mut self,
        prefix: char,
        length: usize,
        line: usize,
        column: usize,
    ) -> LexResult<char> {
        let mut digits = String::new();
        for _ in 0..length {
            match self.advance_char() {
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                Some(c) => {
                    digits.push(c);
                    return Err(self.invalid_escape(prefix, &digits, line, column));
                }
                None => return Err(self.invalid_escape(prefix, &digits, line, column)),
            }
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.invalid_escape(prefix, &digits, line, column))
    }

    fn invalid_escape(&self, prefix: char, digits: &str, line: usize, column: usize) -> LexError {
        LexError::InvalidEscape {
            sequence: format!("{prefix}{digits}"),
            line,
            column,
        }
    }

    fn advance_char(&mut self) -> Option<char> {
        let next = self.chars.next();
        if let Some(c) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
            // Column points at the character under the cursor, so it only
            // moves when another character exists.
            if self.chars.peek().is_some() {
                self.column += 1;
            }
        }
        next
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_reached {
            return None;
        }
        Some(self.next_token())
    }
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}
