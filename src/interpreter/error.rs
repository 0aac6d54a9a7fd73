use thiserror::Error;

/// Typed errors raised while a program executes.
///
/// `UnresolvedCall` means the tree reached execution without analysis
/// filling in the call's symbol; everything else is a fault in the running
/// program itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Cannot apply '{op}' to {left} and {right}")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("Cannot apply unary '{op}' to {operand}")]
    UnsupportedUnary {
        op: &'static str,
        operand: &'static str,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("BOOLEAN is not a runtime value")]
    BooleanValue,

    #[error("Variable '{name}' is not bound in the current frame")]
    NotBound { name: String },

    #[error("Assignment target must be a variable")]
    InvalidAssignTarget,

    #[error("Call to '{name}' was never resolved")]
    UnresolvedCall { name: String },

    #[error("Maximum call depth of {limit} exceeded")]
    StackOverflow { limit: usize },

    #[error("{message}")]
    NativeCall { message: String },
}
