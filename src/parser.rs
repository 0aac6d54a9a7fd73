use std::mem;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Ast, Number};
use crate::lexer::{LexError, Lexer};
use crate::runner::LogOptions;
use crate::token::{Literal, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Expected {expected}, got {got}")]
pub struct ParseError {
    pub expected: String,
    pub got: String,
    pub line: usize,
    pub column: usize,
}

/// Anything that can stop the frontend: a malformed token or a token in the
/// wrong place.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Recursive-descent parser with one token of lookahead.
///
/// `current` is always a real token; `peeked` is filled only when a
/// statement has to decide between a call and an assignment.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
    options: LogOptions,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, options: LogOptions) -> SyntaxResult<Parser<'a>> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        if options.tokens {
            eprintln!("{current}");
        }
        Ok(Parser {
            lexer,
            current,
            peeked: None,
            options,
        })
    }

    pub fn parse(mut self) -> SyntaxResult<Ast> {
        let program = self.program()?;
        self.eat(TokenKind::Eof)?;
        Ok(program)
    }

    /// program := PROGRAM ID SEMI statement_list
    fn program(&mut self) -> SyntaxResult<Ast> {
        self.eat(TokenKind::Program)?;
        let (name, _, _) = self.identifier()?;
        self.eat(TokenKind::Semi)?;
        let statements = self.statement_list()?;
        Ok(Ast::Program { name, statements })
    }

    /// statement_list := statement (SEMI statement)*
    ///
    /// A semicolon separates statements rather than terminating them, so a
    /// trailing semicolon produces a final empty statement.
    fn statement_list(&mut self) -> SyntaxResult<Vec<Ast>> {
        let mut statements = vec![self.statement()?];
        while self.current.kind == TokenKind::Semi {
            self.eat(TokenKind::Semi)?;
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> SyntaxResult<Ast> {
        match self.current.kind {
            TokenKind::Id => {
                if self.peek()?.kind == TokenKind::LParen {
                    self.func_call()
                } else {
                    self.assignment_statement()
                }
            }
            TokenKind::Var => self.var_decl_statement(),
            TokenKind::Function => self.func_decl_statement(),
            TokenKind::LCurl => self.compound_statement(),
            _ => Ok(Ast::NoOp),
        }
    }

    /// compound := LCURL statement_list RCURL
    fn compound_statement(&mut self) -> SyntaxResult<Ast> {
        self.eat(TokenKind::LCurl)?;
        let statements = self.statement_list()?;
        self.eat(TokenKind::RCurl)?;
        Ok(Ast::Compound { statements })
    }

    /// assignment := variable ASSIGN expr
    fn assignment_statement(&mut self) -> SyntaxResult<Ast> {
        let target = self.variable()?;
        self.eat(TokenKind::Assign)?;
        let value = self.expr()?;
        Ok(Ast::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// var_decl := VAR ID (COMMA ID)* COLON type_spec
    ///
    /// Each name gets its own declaration node; several are carried in a
    /// compound so the whole declaration stays one statement.
    fn var_decl_statement(&mut self) -> SyntaxResult<Ast> {
        self.eat(TokenKind::Var)?;
        let mut vars = vec![self.variable()?];
        while self.current.kind == TokenKind::Comma {
            self.eat(TokenKind::Comma)?;
            vars.push(self.variable()?);
        }
        self.eat(TokenKind::Colon)?;
        let type_ref = self.type_spec()?;

        let mut decls = vars
            .into_iter()
            .map(|var| Ast::VarDecl {
                var: Box::new(var),
                type_ref: Box::new(type_ref.clone()),
            })
            .collect::<Vec<_>>();
        Ok(if decls.len() == 1 {
            decls.remove(0)
        } else {
            Ast::Compound { statements: decls }
        })
    }

    /// type_spec := INTEGER | REAL | STRING | BOOLEAN
    fn type_spec(&mut self) -> SyntaxResult<Ast> {
        match self.current.kind {
            TokenKind::Integer | TokenKind::Real | TokenKind::String | TokenKind::Boolean => {
                let token = self.advance()?;
                Ok(Ast::TypeRef {
                    kind: token.kind,
                    line: token.line,
                    column: token.column,
                })
            }
            _ => Err(self.error("a type name")),
        }
    }

    /// func_decl := FUNCTION ID (LPAREN formal_parameter_list RPAREN)?
    ///              LCURL statement_list RCURL
    fn func_decl_statement(&mut self) -> SyntaxResult<Ast> {
        self.eat(TokenKind::Function)?;
        let (name, _, _) = self.identifier()?;

        let mut params = Vec::new();
        if self.current.kind == TokenKind::LParen {
            self.eat(TokenKind::LParen)?;
            if self.current.kind == TokenKind::Id {
                params = self.formal_parameter_list()?;
            }
            self.eat(TokenKind::RParen)?;
        }

        self.eat(TokenKind::LCurl)?;
        let body = self.statement_list()?;
        self.eat(TokenKind::RCurl)?;
        Ok(Ast::FuncDecl {
            name,
            params,
            body: Rc::new(body),
        })
    }

    /// formal_parameter_list := formal_parameters (SEMI formal_parameters)*
    fn formal_parameter_list(&mut self) -> SyntaxResult<Vec<Ast>> {
        let mut params = self.formal_parameters()?;
        while self.current.kind == TokenKind::Semi {
            self.eat(TokenKind::Semi)?;
            params.extend(self.formal_parameters()?);
        }
        Ok(params)
    }

    /// formal_parameters := ID (COMMA ID)* COLON type_spec
    fn formal_parameters(&mut self) -> SyntaxResult<Vec<Ast>> {
        let mut vars = vec![self.variable()?];
        while self.current.kind == TokenKind::Comma {
            self.eat(TokenKind::Comma)?;
            vars.push(self.variable()?);
        }
        self.eat(TokenKind::Colon)?;
        let type_ref = self.type_spec()?;
        Ok(vars
            .into_iter()
            .map(|var| Ast::Param {
                var: Box::new(var),
                type_ref: Box::new(type_ref.clone()),
            })
            .collect())
    }

    /// func_call := ID LPAREN (expr (COMMA expr)*)? RPAREN
    fn func_call(&mut self) -> SyntaxResult<Ast> {
        let (name, line, column) = self.identifier()?;
        self.eat(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            args.push(self.expr()?);
            while self.current.kind == TokenKind::Comma {
                self.eat(TokenKind::Comma)?;
                args.push(self.expr()?);
            }
        }
        self.eat(TokenKind::RParen)?;
        Ok(Ast::call(name, args, line, column))
    }

    /// expr := term ((PLUS | MINUS) term)*
    fn expr(&mut self) -> SyntaxResult<Ast> {
        let mut node = self.term()?;
        while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.advance()?.kind;
            let right = self.term()?;
            node = Ast::BinOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    /// term := factor ((MUL | DIV | FLOAT_DIV) factor)*
    fn term(&mut self) -> SyntaxResult<Ast> {
        let mut node = self.factor()?;
        while matches!(
            self.current.kind,
            TokenKind::Mul | TokenKind::IntegerDiv | TokenKind::FloatDiv
        ) {
            let op = self.advance()?.kind;
            let right = self.factor()?;
            node = Ast::BinOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    /// factor := (PLUS | MINUS) factor | INTEGER_CONST | REAL_CONST
    ///         | STRING_CONST | TRUE | FALSE | LPAREN expr RPAREN
    ///         | func_call | variable
    fn factor(&mut self) -> SyntaxResult<Ast> {
        match self.current.kind {
            TokenKind::Plus | TokenKind::Minus => {
                let op = self.advance()?.kind;
                let operand = self.factor()?;
                Ok(Ast::UnaryOp {
                    op,
                    operand: Box::new(operand),
                })
            }
            TokenKind::IntegerConst | TokenKind::RealConst => {
                let token = self.advance()?;
                match token.literal {
                    Some(Literal::Integer(value)) => Ok(Ast::NumberLiteral(Number::Integer(value))),
                    Some(Literal::Decimal(value)) => Ok(Ast::NumberLiteral(Number::Decimal(value))),
                    _ => Err(self.error("a number")),
                }
            }
            TokenKind::StringConst => {
                let token = self.advance()?;
                match token.literal {
                    Some(Literal::Str(value)) => Ok(Ast::StringLiteral(value)),
                    _ => Err(self.error("a string")),
                }
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Ast::BoolLiteral(true))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Ast::BoolLiteral(false))
            }
            TokenKind::LParen => {
                self.eat(TokenKind::LParen)?;
                let node = self.expr()?;
                self.eat(TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::Id => {
                if self.peek()?.kind == TokenKind::LParen {
                    self.func_call()
                } else {
                    self.variable()
                }
            }
            _ => Err(self.error("an expression")),
        }
    }

    /// variable := ID
    fn variable(&mut self) -> SyntaxResult<Ast> {
        let (name, line, column) = self.identifier()?;
        Ok(Ast::VarRef { name, line, column })
    }

    /// Consumes an ID token and returns its spelling and position.
    fn identifier(&mut self) -> SyntaxResult<(String, usize, usize)> {
        let token = self.eat(TokenKind::Id)?;
        match token.identifier() {
            Some(name) => Ok((name.to_string(), token.line, token.column)),
            None => Err(self.error("identifier")),
        }
    }

    fn eat(&mut self, kind: TokenKind) -> SyntaxResult<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.error(kind.spelling()))
        }
    }

    fn advance(&mut self) -> SyntaxResult<Token> {
        let next = self.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn next_token(&mut self) -> SyntaxResult<Token> {
        if let Some(token) = self.peeked.take() {
            Ok(token)
        } else {
            self.fetch()
        }
    }

    fn peek(&mut self) -> SyntaxResult<&Token> {
        if self.peeked.is_none() {
            let token = self.fetch()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().expect("peeked token missing"))
    }

    fn fetch(&mut self) -> SyntaxResult<Token> {
        let token = self.lexer.next_token()?;
        if self.options.tokens {
            eprintln!("{token}");
        }
        Ok(token)
    }

    fn error(&self, expected: &str) -> SyntaxError {
        ParseError {
            expected: expected.to_string(),
            got: self.current.to_string(),
            line: self.current.line,
            column: self.current.column,
        }
        .into()
    }
}

pub fn parse(input: &str, options: LogOptions) -> SyntaxResult<Ast> {
    Parser::new(input, options)?.parse()
}
