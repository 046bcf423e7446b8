//! Evaluation errors.
//!
//! Display output is the exact text shown to users (prefixed with
//! `error: ` by the session), so every message leads with its kind tag.

use thiserror::Error;

/// Evaluation errors.
///
/// `Clone` because a failed thunk memoizes its error and replays it on
/// every later force.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("UnboundVariable: {name}")]
    UnboundVariable { name: String },

    #[error("TypeMismatch: `{operation}` expects {expected}, got {actual}")]
    TypeMismatch {
        operation: String,
        expected: String,
        actual: String,
    },

    #[error("DivisionByZero: division by zero")]
    DivisionByZero,

    #[error("IntegerOverflow: `{operation}` exceeded the integer range")]
    IntegerOverflow { operation: String },

    #[error("NotAFunction: cannot call a value of type {actual}")]
    NotAFunction { actual: &'static str },

    #[error("WrongArity: function takes {expected} argument(s), got {actual}")]
    WrongArity { expected: usize, actual: usize },

    #[error("NoSuchField: record has no field `{field}`")]
    NoSuchField { field: String },

    #[error("EmptyList: {operation} of an empty list")]
    EmptyList { operation: &'static str },

    #[error("IndexOutOfBounds: index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("InfiniteRecursion: value depends on itself while being computed")]
    InfiniteRecursion,

    #[error("StackDepthExceeded: evaluation exceeded the recursion depth bound")]
    StackDepthExceeded,

    #[error("EvaluationTimeout: evaluation exceeded its step or time budget")]
    EvaluationTimeout,

    #[error("Cancelled: evaluation superseded by a newer submission")]
    Cancelled,

    #[error("InternalError: {0}")]
    Internal(String),
}
