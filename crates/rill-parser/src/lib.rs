//! Parser for Rill.
//!
//! This crate provides a recursive descent parser that converts tokens
//! into an abstract syntax tree. A Rill input is a single expression;
//! parsing stops at the first error and reports it with the offending
//! byte offset, so the caller always gets either a complete AST or one
//! diagnostic.

mod parser;

pub use parser::Parser;

use rill_diagnostic::Diagnostic;
use rill_lexer::Lexer;
use rill_syntax::Expr;

/// Parse source code into an expression AST.
///
/// Total over all inputs: returns `Ok` with the AST or `Err` with the
/// first diagnostic encountered, never hangs.
pub fn parse(source: &str) -> Result<Expr, Diagnostic> {
    let lexer = Lexer::new(source);
    let (tokens, diagnostics) = lexer.tokenize();

    if let Some(first) = diagnostics.into_iter().next() {
        return Err(first);
    }

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(expr)
}
