use std::rc::Rc;

use thiserror::Error;

use crate::ast::Ast;
use crate::natives::NativeRegistry;
use crate::runner::LogOptions;
use crate::scope::ScopedSymbolTable;
use crate::symbol::{FuncSymbol, Symbol, VarSymbol};
use crate::token::TokenKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("Duplicate identifier '{name}' at {line}:{column}")]
    DuplicateIdentifier {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Identifier not found '{name}' at {line}:{column}")]
    IdentifierNotFound {
        name: String,
        line: usize,
        column: usize,
    },
}

/// One walk over the tree that builds the scope chain, checks every name,
/// and leaves two things behind for the interpreter: a resolved symbol on
/// each call node and a statement list on each function symbol.
pub struct SemanticAnalyzer {
    current_scope: Option<Rc<ScopedSymbolTable>>,
    natives: Rc<NativeRegistry>,
    options: LogOptions,
}

impl SemanticAnalyzer {
    pub fn new(natives: Rc<NativeRegistry>, options: LogOptions) -> SemanticAnalyzer {
        SemanticAnalyzer {
            current_scope: None,
            natives,
            options,
        }
    }

    pub fn analyze(&mut self, program: &Ast) -> Result<(), SemanticError> {
        self.visit(program)
    }

    fn visit(&mut self, node: &Ast) -> Result<(), SemanticError> {
        match node {
            Ast::Program { statements, .. } => {
                self.log("ENTER scope: global");
                let scope = ScopedSymbolTable::new(
                    "global",
                    1,
                    self.current_scope.take(),
                    Rc::clone(&self.natives),
                    self.options,
                );
                scope.seed_builtins();
                self.current_scope = Some(scope);

                for statement in statements {
                    self.visit(statement)?;
                }

                self.dump_scope();
                self.leave_scope();
                self.log("LEAVE scope: global");
                Ok(())
            }
            Ast::Block { declarations, body } => {
                for declaration in declarations {
                    self.visit(declaration)?;
                }
                self.visit(body)
            }
            Ast::VarDecl { var, type_ref } => {
                let (
                    Ast::VarRef { name, line, column },
                    Ast::TypeRef {
                        kind,
                        line: type_line,
                        column: type_column,
                    },
                ) = (var.as_ref(), type_ref.as_ref())
                else {
                    return Ok(());
                };
                let declared_type = self.resolve_type(*kind, *type_line, *type_column)?;
                if self.scope().lookup_current(name).is_some() {
                    return Err(SemanticError::DuplicateIdentifier {
                        name: name.clone(),
                        line: *line,
                        column: *column,
                    });
                }
                self.scope()
                    .insert(Symbol::Var(VarSymbol::new(name.clone(), Some(declared_type))));
                Ok(())
            }
            Ast::FuncDecl { name, params, body } => self.declare_function(name, params, body),
            Ast::FuncCall {
                name,
                args,
                line,
                column,
                resolved,
            } => {
                for arg in args {
                    self.visit(arg)?;
                }
                match self.scope().lookup(name) {
                    Some(Symbol::Func(symbol)) => {
                        *resolved.borrow_mut() = Some(symbol);
                        Ok(())
                    }
                    _ => Err(SemanticError::IdentifierNotFound {
                        name: name.clone(),
                        line: *line,
                        column: *column,
                    }),
                }
            }
            Ast::VarRef { name, line, column } => match self.scope().lookup(name) {
                Some(_) => Ok(()),
                None => Err(SemanticError::IdentifierNotFound {
                    name: name.clone(),
                    line: *line,
                    column: *column,
                }),
            },
            Ast::Assign { target, value } => {
                self.visit(value)?;
                self.visit(target)
            }
            Ast::Compound { statements } => {
                for statement in statements {
                    self.visit(statement)?;
                }
                Ok(())
            }
            Ast::BinOp { left, right, .. } => {
                self.visit(left)?;
                self.visit(right)
            }
            Ast::UnaryOp { operand, .. } => self.visit(operand),
            Ast::NumberLiteral(_)
            | Ast::StringLiteral(_)
            | Ast::BoolLiteral(_)
            | Ast::TypeRef { .. }
            | Ast::Param { .. }
            | Ast::NoOp => Ok(()),
        }
    }

    /// The symbol goes into the enclosing scope before the body is walked,
    /// so the body can call the function it belongs to.
    fn declare_function(
        &mut self,
        name: &str,
        params: &[Ast],
        body: &Rc<Vec<Ast>>,
    ) -> Result<(), SemanticError> {
        let func_symbol = FuncSymbol::new(name.to_string());
        let enclosing = Rc::clone(self.scope());
        enclosing.insert(Symbol::Func(Rc::clone(&func_symbol)));

        self.log(&format!("ENTER scope: {name}"));
        let function_scope = ScopedSymbolTable::new(
            name,
            enclosing.scope_level + 1,
            Some(enclosing),
            Rc::clone(&self.natives),
            self.options,
        );
        self.current_scope = Some(Rc::clone(&function_scope));

        for param in params {
            let Ast::Param { var, type_ref } = param else {
                continue;
            };
            let Ast::TypeRef {
                kind,
                line,
                column,
            } = type_ref.as_ref()
            else {
                continue;
            };
            let declared_type = self.resolve_type(*kind, *line, *column)?;
            let Ast::VarRef {
                name: param_name, ..
            } = var.as_ref()
            else {
                continue;
            };
            let var_symbol = VarSymbol::new(param_name.clone(), Some(declared_type));
            function_scope.insert(Symbol::Var(Rc::clone(&var_symbol)));
            func_symbol.formal_params.borrow_mut().push(var_symbol);
        }

        for statement in body.iter() {
            self.visit(statement)?;
        }

        self.dump_scope();
        self.leave_scope();
        self.log(&format!("LEAVE scope: {name}"));

        *func_symbol.body.borrow_mut() = Some(Rc::clone(body));
        Ok(())
    }

    fn resolve_type(
        &self,
        kind: TokenKind,
        line: usize,
        column: usize,
    ) -> Result<Symbol, SemanticError> {
        let name = kind.spelling();
        self.scope()
            .lookup(name)
            .ok_or(SemanticError::IdentifierNotFound {
                name: name.to_string(),
                line,
                column,
            })
    }

    fn scope(&self) -> &Rc<ScopedSymbolTable> {
        self.current_scope.as_ref().expect("no active scope")
    }

    fn leave_scope(&mut self) {
        self.current_scope = self
            .current_scope
            .take()
            .and_then(|scope| scope.enclosing.clone());
    }

    fn dump_scope(&self) {
        if self.options.scope {
            if let Some(scope) = &self.current_scope {
                eprintln!("{scope}");
            }
        }
    }

    fn log(&self, message: &str) {
        if self.options.scope {
            eprintln!("{message}");
        }
    }
}
