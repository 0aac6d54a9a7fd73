pub mod ast;
pub mod fixtures;
pub mod interpreter;
pub mod lexer;
pub mod natives;
pub mod parser;
pub mod runner;
pub mod scope;
pub mod semantics;
pub mod symbol;
pub mod token;
