//! Lazy interpreter/evaluator for Rill.
//!
//! This crate implements a tree-walking, call-by-need interpreter:
//! let-bindings, function arguments, and list/record elements are bound
//! as thunks and forced only when observed. Every evaluation runs under
//! configurable depth, step, and wall-clock bounds so control always
//! returns to the caller.

mod builtin;
mod env;
mod error;
mod eval;
mod print;
mod value;

pub use builtin::prelude;
pub use env::Environment;
pub use error::EvalError;
pub use eval::{Evaluator, Limits};
pub use value::{BuiltinFn, Closure, Thunk, ThunkState, Value};
