//! The `rill eval` command.

use crate::output;
use rill_diagnostic::emit;
use rill_eval::{prelude, Environment, Evaluator, Limits};
use std::rc::Rc;

pub fn run(expr: &str, verbose: bool) -> Result<(), String> {
    let ast = match rill_parser::parse(expr) {
        Ok(ast) => ast,
        Err(diagnostic) => {
            emit(expr, "<eval>", &diagnostic);
            return Err("parse error".to_string());
        }
    };

    if verbose {
        output::info(&format!("AST: {ast:?}"));
    }

    let evaluator = Evaluator::new(Limits::default());
    let env = Rc::new(Environment::child(Rc::new(prelude())));

    let rendered = evaluator
        .eval(&ast, &env)
        .and_then(|value| evaluator.display(&value))
        .map_err(|e| e.to_string())?;

    output::success(&rendered);
    Ok(())
}
