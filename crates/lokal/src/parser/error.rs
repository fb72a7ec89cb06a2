//! Expression error types.

use thiserror::Error;

/// An error raised while parsing or evaluating a `{...}` expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// A syntax error with location information.
    #[error("syntax error at column {column}: {message}")]
    Syntax { column: usize, message: String },

    /// Parentheses nest deeper than the parser allows.
    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// No variable, parameter, or source value matched the name.
    #[error("unresolved variable '{name}'")]
    UnresolvedVariable { name: String },

    /// The operand types do not support the operator.
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    InvalidOperands {
        op: char,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Right operand of `/` was zero.
    #[error("division by zero")]
    DivisionByZero,

    /// `string * n` with a negative, non-finite, or oversized count.
    #[error("cannot repeat a string {count} times")]
    InvalidRepeat { count: f64 },

    /// A variable source or format handler panicked.
    #[error("panic while resolving '{name}': {message}")]
    Panicked { name: String, message: String },
}
