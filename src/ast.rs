use std::cell::RefCell;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::symbol::FuncSymbol;
use crate::token::TokenKind;

#[derive(Debug, PartialEq, Clone)]
pub enum Number {
    Integer(BigInt),
    Decimal(BigDecimal),
}

/// One closed node type for the whole tree. Walkers match exhaustively, so a
/// new variant fails to compile until every walker handles it.
#[derive(Debug, PartialEq, Clone)]
pub enum Ast {
    Program {
        name: String,
        statements: Vec<Ast>,
    },
    /// Declarations followed by a compound body. No grammar rule produces
    /// one today; hosts that assemble trees directly still can.
    Block {
        declarations: Vec<Ast>,
        body: Box<Ast>,
    },
    VarDecl {
        var: Box<Ast>,
        type_ref: Box<Ast>,
    },
    TypeRef {
        kind: TokenKind,
        line: usize,
        column: usize,
    },
    BinOp {
        op: TokenKind,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    UnaryOp {
        op: TokenKind,
        operand: Box<Ast>,
    },
    NumberLiteral(Number),
    StringLiteral(String),
    BoolLiteral(bool),
    Compound {
        statements: Vec<Ast>,
    },
    Assign {
        target: Box<Ast>,
        value: Box<Ast>,
    },
    VarRef {
        name: String,
        line: usize,
        column: usize,
    },
    NoOp,
    FuncDecl {
        name: String,
        params: Vec<Ast>,
        body: Rc<Vec<Ast>>,
    },
    FuncCall {
        name: String,
        args: Vec<Ast>,
        line: usize,
        column: usize,
        /// Filled in by semantic analysis; the only mutation after parsing.
        resolved: RefCell<Option<Rc<FuncSymbol>>>,
    },
    Param {
        var: Box<Ast>,
        type_ref: Box<Ast>,
    },
}

impl Ast {
    /// A call node with an empty resolution slot, as the parser produces it.
    pub fn call(name: String, args: Vec<Ast>, line: usize, column: usize) -> Ast {
        Ast::FuncCall {
            name,
            args,
            line,
            column,
            resolved: RefCell::new(None),
        }
    }
}
