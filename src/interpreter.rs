pub mod error;
pub mod frame;
pub mod value;

pub use error::RuntimeError;
pub use frame::{ActivationRecord, CallStack, FrameKind};
pub use value::Value;

use std::rc::Rc;

use crate::ast::{Ast, Number};
use crate::natives::NativeRegistry;
use crate::runner::LogOptions;
use crate::token::TokenKind;

/// Frames the runtime will stack before refusing to go deeper.
pub const DEFAULT_CALL_DEPTH: usize = 512;

/// Executes an analyzed tree against a stack of activation records.
///
/// Name resolution at runtime is flat: reads and writes touch only the
/// record on top of the stack. A function body therefore sees its own
/// parameters and assignments and nothing from its caller, no matter what
/// the scope chain said during analysis.
pub struct Interpreter {
    call_stack: CallStack,
    natives: Rc<NativeRegistry>,
    options: LogOptions,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new(natives: Rc<NativeRegistry>, options: LogOptions) -> Interpreter {
        Interpreter {
            call_stack: CallStack::new(DEFAULT_CALL_DEPTH),
            natives,
            options,
            output: Vec::new(),
        }
    }

    /// Runs a program and returns everything it printed, one line per call.
    pub fn interpret(&mut self, program: &Ast) -> Result<String, RuntimeError> {
        self.visit(program)?;
        Ok(self.output.join("\n"))
    }

    fn visit(&mut self, node: &Ast) -> Result<Value, RuntimeError> {
        match node {
            Ast::Program { name, statements } => {
                self.trace(&format!("ENTER: PROGRAM {name}"));
                self.call_stack
                    .push(ActivationRecord::new(name, FrameKind::Program, 1))?;
                self.trace_stack();

                let result = self.exec_all(statements);

                self.trace(&format!("LEAVE: PROGRAM {name}"));
                self.trace_stack();
                self.call_stack.pop();
                result?;
                Ok(Value::Empty)
            }
            Ast::Block { declarations, body } => {
                self.exec_all(declarations)?;
                self.visit(body)
            }
            Ast::Compound { statements } => {
                self.exec_all(statements)?;
                Ok(Value::Empty)
            }
            Ast::Assign { target, value } => {
                let value = self.visit(value)?;
                let Ast::VarRef { name, .. } = target.as_ref() else {
                    return Err(RuntimeError::InvalidAssignTarget);
                };
                self.frame_mut().set(name, value);
                Ok(Value::Empty)
            }
            Ast::VarRef { name, .. } => self.frame().get(name),
            Ast::NumberLiteral(number) => Ok(match number {
                Number::Integer(value) => Value::Integer(value.clone()),
                Number::Decimal(value) => Value::Decimal(value.clone()),
            }),
            Ast::StringLiteral(text) => Ok(Value::Str(text.clone())),
            Ast::BoolLiteral(_) => Err(RuntimeError::BooleanValue),
            Ast::BinOp { op, left, right } => {
                let left = self.visit(left)?;
                let right = self.visit(right)?;
                apply(*op, &left, &right)
            }
            Ast::UnaryOp { op, operand } => {
                let operand = self.visit(operand)?;
                match op {
                    TokenKind::Plus => operand.abs(),
                    TokenKind::Minus => operand.negate(),
                    other => Err(RuntimeError::UnsupportedUnary {
                        op: other.spelling(),
                        operand: operand.type_name(),
                    }),
                }
            }
            Ast::FuncCall { .. } => self.call(node),
            Ast::VarDecl { .. }
            | Ast::FuncDecl { .. }
            | Ast::TypeRef { .. }
            | Ast::Param { .. }
            | Ast::NoOp => Ok(Value::Empty),
        }
    }

    fn exec_all(&mut self, statements: &[Ast]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.visit(statement)?;
        }
        Ok(())
    }

    fn call(&mut self, node: &Ast) -> Result<Value, RuntimeError> {
        let Ast::FuncCall {
            name,
            args,
            resolved,
            ..
        } = node
        else {
            return Err(RuntimeError::UnresolvedCall {
                name: String::new(),
            });
        };
        let symbol = resolved
            .borrow()
            .clone()
            .ok_or_else(|| RuntimeError::UnresolvedCall { name: name.clone() })?;

        // Actuals are evaluated in the caller's frame, pairwise against the
        // formals. A surplus actual is never evaluated; a missing one leaves
        // its formal unbound.
        let mut record =
            ActivationRecord::new(name, FrameKind::Function, symbol.scope_level.get() + 1);
        let formals = symbol.formal_params.borrow().clone();
        for (formal, actual) in formals.iter().zip(args) {
            let value = self.visit(actual)?;
            record.set(&formal.name, value);
        }

        self.call_stack.push(record)?;
        self.trace(&format!("ENTER: FUNCTION {name}"));
        self.trace_stack();

        let result = if symbol.is_native {
            self.natives
                .call(
                    name,
                    self.call_stack.peek().expect("call stack is empty"),
                    &mut self.output,
                )
                .map(|value| value.unwrap_or(Value::Empty))
        } else {
            let body = symbol.body.borrow().clone();
            match body {
                Some(statements) => self.exec_all(&statements).map(|()| Value::Empty),
                None => Ok(Value::Empty),
            }
        };

        self.trace(&format!("LEAVE: FUNCTION {name}"));
        self.trace_stack();
        self.call_stack.pop();
        result
    }

    fn frame(&self) -> &ActivationRecord {
        self.call_stack.peek().expect("call stack is empty")
    }

    fn frame_mut(&mut self) -> &mut ActivationRecord {
        self.call_stack.peek_mut().expect("call stack is empty")
    }

    fn trace(&self, message: &str) {
        if self.options.stack {
            eprintln!("{message}");
        }
    }

    fn trace_stack(&self) {
        if self.options.stack {
            eprintln!("{}", self.call_stack);
        }
    }
}

fn apply(op: TokenKind, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        TokenKind::Plus => left.add(right),
        TokenKind::Minus => left.sub(right),
        TokenKind::Mul => left.mul(right),
        TokenKind::IntegerDiv | TokenKind::FloatDiv => left.div(right, op.spelling()),
        other => Err(RuntimeError::UnsupportedOperands {
            op: other.spelling(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}
