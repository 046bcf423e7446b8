//! AST and syntax definitions for Rill.

mod expr;

pub use expr::*;
