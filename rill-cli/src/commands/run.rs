//! The `rill run` command.

use crate::output;
use rill_diagnostic::emit;
use rill_eval::{prelude, Environment, Evaluator, Limits};
use std::fs;
use std::rc::Rc;

pub fn run(file: &str, verbose: bool) -> Result<(), String> {
    let source =
        fs::read_to_string(file).map_err(|e| format!("cannot read file '{file}': {e}"))?;

    let ast = match rill_parser::parse(&source) {
        Ok(ast) => ast,
        Err(diagnostic) => {
            emit(&source, file, &diagnostic);
            return Err("parse error".to_string());
        }
    };

    if verbose {
        output::info(&format!("parsed {file}"));
    }

    let evaluator = Evaluator::new(Limits::default());
    let env = Rc::new(Environment::child(Rc::new(prelude())));

    let rendered = evaluator
        .eval(&ast, &env)
        .and_then(|value| evaluator.display(&value))
        .map_err(|e| e.to_string())?;

    println!("{rendered}");
    Ok(())
}
