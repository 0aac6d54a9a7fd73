use std::fmt;
use std::sync::OnceLock;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Operators
    Plus,     // +
    Minus,    // -
    Mul,      // *
    FloatDiv, // /

    // Delimiters
    LParen, // (
    RParen, // )
    LCurl,  // {
    RCurl,  // }
    Semi,   // ;
    Dot,    // .
    Colon,  // :
    Comma,  // ,

    // Reserved words. Keyword recognition is driven by the contiguous
    // Program..=Return range below; a word outside it is not reserved.
    Program,
    Integer,
    Real,
    String,
    Boolean,
    True,
    False,
    IntegerDiv, // DIV
    Var,
    Function,
    Begin,
    End,
    Return,

    Id,
    IntegerConst,
    RealConst,
    StringConst,
    Assign, // :=
    Eof,
}

impl TokenKind {
    /// Reserved-word kinds, in declaration order.
    pub const RESERVED: [TokenKind; 13] = [
        TokenKind::Program,
        TokenKind::Integer,
        TokenKind::Real,
        TokenKind::String,
        TokenKind::Boolean,
        TokenKind::True,
        TokenKind::False,
        TokenKind::IntegerDiv,
        TokenKind::Var,
        TokenKind::Function,
        TokenKind::Begin,
        TokenKind::End,
        TokenKind::Return,
    ];

    /// Source spelling of a reserved word or punctuation kind.
    pub fn spelling(self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Mul => "*",
            TokenKind::FloatDiv => "/",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LCurl => "{",
            TokenKind::RCurl => "}",
            TokenKind::Semi => ";",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Program => "PROGRAM",
            TokenKind::Integer => "INTEGER",
            TokenKind::Real => "REAL",
            TokenKind::String => "STRING",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::IntegerDiv => "DIV",
            TokenKind::Var => "VAR",
            TokenKind::Function => "FUNCTION",
            TokenKind::Begin => "BEGIN",
            TokenKind::End => "END",
            TokenKind::Return => "RETURN",
            TokenKind::Id => "identifier",
            TokenKind::IntegerConst => "integer literal",
            TokenKind::RealConst => "real literal",
            TokenKind::StringConst => "string literal",
            TokenKind::Assign => ":=",
            TokenKind::Eof => "end of input",
        }
    }

    /// Looks up a word in the reserved table, case-insensitively.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        static RESERVED_WORDS: OnceLock<FxHashMap<&'static str, TokenKind>> = OnceLock::new();
        let table = RESERVED_WORDS.get_or_init(|| {
            TokenKind::RESERVED
                .iter()
                .map(|kind| (kind.spelling(), *kind))
                .collect()
        });
        table.get(word.to_uppercase().as_str()).copied()
    }

    /// Maps a single punctuation character to its kind. `:` is excluded;
    /// the lexer resolves it against `:=` itself.
    pub fn from_punct(ch: char) -> Option<TokenKind> {
        match ch {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Mul),
            '/' => Some(TokenKind::FloatDiv),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LCurl),
            '}' => Some(TokenKind::RCurl),
            ';' => Some(TokenKind::Semi),
            '.' => Some(TokenKind::Dot),
            ',' => Some(TokenKind::Comma),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// Literal payload carried by `Id` and the constant token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(BigInt),
    Decimal(BigDecimal),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{value}"),
            Literal::Decimal(value) => write!(f, "{value}"),
            Literal::Str(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<Literal>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: None,
            line,
            column,
        }
    }

    pub fn with_literal(kind: TokenKind, literal: Literal, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: Some(literal),
            line,
            column,
        }
    }

    /// The identifier spelling, for `Id` tokens.
    pub fn identifier(&self) -> Option<&str> {
        match (&self.kind, &self.literal) {
            (TokenKind::Id, Some(Literal::Str(name))) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(
                f,
                "{} '{}' at {}:{}",
                self.kind, literal, self.line, self.column
            ),
            None => write!(f, "{} at {}:{}", self.kind, self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_range_is_contiguous() {
        let base = TokenKind::Program as u8;
        for (offset, kind) in TokenKind::RESERVED.iter().enumerate() {
            assert_eq!(
                *kind as u8,
                base + offset as u8,
                "{kind:?} is outside the reserved range"
            );
        }
        assert_eq!(
            TokenKind::RESERVED[TokenKind::RESERVED.len() - 1],
            TokenKind::Return
        );
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(TokenKind::keyword("program"), Some(TokenKind::Program));
        assert_eq!(TokenKind::keyword("Program"), Some(TokenKind::Program));
        assert_eq!(TokenKind::keyword("div"), Some(TokenKind::IntegerDiv));
        assert_eq!(TokenKind::keyword("RETURN"), Some(TokenKind::Return));
        assert_eq!(TokenKind::keyword("notakeyword"), None);
    }

    #[test]
    fn punctuation_set_is_closed() {
        assert_eq!(TokenKind::from_punct('+'), Some(TokenKind::Plus));
        assert_eq!(TokenKind::from_punct('{'), Some(TokenKind::LCurl));
        assert_eq!(TokenKind::from_punct(','), Some(TokenKind::Comma));
        assert_eq!(TokenKind::from_punct('='), None);
        assert_eq!(TokenKind::from_punct('@'), None);
    }

    #[test]
    fn tokens_display_with_position() {
        let token = Token::with_literal(
            TokenKind::Id,
            Literal::Str("radius".to_string()),
            3,
            7,
        );
        assert_eq!(token.to_string(), "identifier 'radius' at 3:7");
        assert_eq!(token.identifier(), Some("radius"));

        let eof = Token::new(TokenKind::Eof, 1, 1);
        assert_eq!(eof.to_string(), "end of input at 1:1");
    }
}
