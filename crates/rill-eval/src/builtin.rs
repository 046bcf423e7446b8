//! Built-in functions.

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::value::{BuiltinFn, Value};
use std::rc::Rc;

/// The root environment every evaluation starts from.
///
/// User bindings go into child scopes, so the prelude can be shared
/// between evaluations without ever being written to again.
pub fn prelude() -> Environment {
    let env = Environment::new();
    for (name, value) in builtins() {
        env.define(name, value);
    }
    env
}

fn mismatch(name: &'static str, expected: &str, actual: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operation: name.to_string(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// Get all built-in functions.
pub fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        // === Introspection ===
        ("typeOf", Value::Builtin(BuiltinFn {
            name: "typeOf",
            arity: 1,
            func: |ev, args| {
                let v = ev.force(args[0].clone())?;
                Ok(Value::String(Rc::new(v.type_name().to_string())))
            },
        })),
        ("toString", Value::Builtin(BuiltinFn {
            name: "toString",
            arity: 1,
            func: |ev, args| {
                let rendered = ev.display(&args[0])?;
                Ok(Value::String(Rc::new(rendered)))
            },
        })),

        // === Lists and strings ===
        ("len", Value::Builtin(BuiltinFn {
            name: "len",
            arity: 1,
            func: |ev, args| {
                match ev.force(args[0].clone())? {
                    Value::List(items) => Ok(Value::Int(items.len() as i64)),
                    Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
                    Value::Record(fields) => Ok(Value::Int(fields.len() as i64)),
                    other => Err(mismatch("len", "List, String, or Record", &other)),
                }
            },
        })),
        ("head", Value::Builtin(BuiltinFn {
            name: "head",
            arity: 1,
            func: |ev, args| {
                match ev.force(args[0].clone())? {
                    Value::List(items) => items
                        .first()
                        .cloned()
                        .ok_or(EvalError::EmptyList { operation: "head" }),
                    other => Err(mismatch("head", "List", &other)),
                }
            },
        })),
        ("tail", Value::Builtin(BuiltinFn {
            name: "tail",
            arity: 1,
            func: |ev, args| {
                match ev.force(args[0].clone())? {
                    Value::List(items) => {
                        if items.is_empty() {
                            return Err(EvalError::EmptyList { operation: "tail" });
                        }
                        Ok(Value::List(Rc::new(items[1..].to_vec())))
                    }
                    other => Err(mismatch("tail", "List", &other)),
                }
            },
        })),
        ("elemAt", Value::Builtin(BuiltinFn {
            name: "elemAt",
            arity: 2,
            func: |ev, args| {
                let list = match ev.force(args[0].clone())? {
                    Value::List(items) => items,
                    other => return Err(mismatch("elemAt", "List", &other)),
                };
                let index = match ev.force(args[1].clone())? {
                    Value::Int(n) => n,
                    other => return Err(mismatch("elemAt", "Int", &other)),
                };
                usize::try_from(index)
                    .ok()
                    .and_then(|i| list.get(i).cloned())
                    .ok_or(EvalError::IndexOutOfBounds {
                        index,
                        len: list.len(),
                    })
            },
        })),

        // === Numbers ===
        ("abs", Value::Builtin(BuiltinFn {
            name: "abs",
            arity: 1,
            func: |ev, args| {
                match ev.force(args[0].clone())? {
                    Value::Int(n) => {
                        n.checked_abs()
                            .map(Value::Int)
                            .ok_or(EvalError::IntegerOverflow {
                                operation: "abs".to_string(),
                            })
                    }
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => Err(mismatch("abs", "Int or Float", &other)),
                }
            },
        })),
        ("min", Value::Builtin(BuiltinFn {
            name: "min",
            arity: 2,
            func: |ev, args| pick("min", ev, args, |ord| ord.is_le()),
        })),
        ("max", Value::Builtin(BuiltinFn {
            name: "max",
            arity: 2,
            func: |ev, args| pick("max", ev, args, |ord| ord.is_ge()),
        })),
        ("floor", Value::Builtin(BuiltinFn {
            name: "floor",
            arity: 1,
            func: |ev, args| {
                match ev.force(args[0].clone())? {
                    Value::Int(n) => Ok(Value::Int(n)),
                    Value::Float(f) => Ok(Value::Int(f.floor() as i64)),
                    other => Err(mismatch("floor", "Int or Float", &other)),
                }
            },
        })),
        ("ceil", Value::Builtin(BuiltinFn {
            name: "ceil",
            arity: 1,
            func: |ev, args| {
                match ev.force(args[0].clone())? {
                    Value::Int(n) => Ok(Value::Int(n)),
                    Value::Float(f) => Ok(Value::Int(f.ceil() as i64)),
                    other => Err(mismatch("ceil", "Int or Float", &other)),
                }
            },
        })),
    ]
}

/// Shared body of `min`/`max`: force both numbers, keep whichever side
/// the ordering test selects, preserving its original representation.
fn pick(
    name: &'static str,
    ev: &Evaluator,
    args: &[Value],
    keep_left: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, EvalError> {
    let a = ev.force(args[0].clone())?;
    let b = ev.force(args[1].clone())?;
    let (x, y) = match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            let offender = if a.as_float().is_none() { &a } else { &b };
            return Err(mismatch(name, "Int or Float", offender));
        }
    };
    match x.partial_cmp(&y) {
        Some(ord) if keep_left(ord) => Ok(a),
        Some(_) => Ok(b),
        None => Err(EvalError::TypeMismatch {
            operation: name.to_string(),
            expected: "comparable numbers".to_string(),
            actual: "NaN".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Limits;

    fn run(source: &str) -> Result<Value, EvalError> {
        let expr = rill_parser::parse(source).expect("parse error");
        let evaluator = Evaluator::new(Limits::default());
        let env = Rc::new(Environment::child(Rc::new(prelude())));
        let value = evaluator.eval(&expr, &env)?;
        evaluator.force(value)
    }

    #[test]
    fn type_of() {
        assert_eq!(run("typeOf(1)"), Ok(Value::String(Rc::new("Int".into()))));
        assert_eq!(
            run("typeOf(fn(x) x)"),
            Ok(Value::String(Rc::new("Function".into())))
        );
    }

    #[test]
    fn list_accessors() {
        assert_eq!(run("head([1, 2, 3])"), Ok(Value::Int(1)));
        assert_eq!(run("len(tail([1, 2, 3]))"), Ok(Value::Int(2)));
        assert_eq!(run("elemAt([1, 2, 3], 2)"), Ok(Value::Int(3)));
        assert_eq!(
            run("head([])"),
            Err(EvalError::EmptyList { operation: "head" })
        );
        assert_eq!(
            run("elemAt([1], 5)"),
            Err(EvalError::IndexOutOfBounds { index: 5, len: 1 })
        );
    }

    #[test]
    fn head_forces_only_the_head() {
        assert_eq!(run("head([1, undefinedVar])"), Ok(Value::Int(1)));
    }

    #[test]
    fn abs_of_int_min_overflows_cleanly() {
        assert_eq!(
            run("abs(0 - 9223372036854775807 - 1)"),
            Err(EvalError::IntegerOverflow {
                operation: "abs".to_string()
            })
        );
    }

    #[test]
    fn numeric_helpers() {
        assert_eq!(run("abs(0 - 5)"), Ok(Value::Int(5)));
        assert_eq!(run("min(3, 2)"), Ok(Value::Int(2)));
        assert_eq!(run("max(3, 2.5)"), Ok(Value::Int(3)));
        assert_eq!(run("floor(1.9)"), Ok(Value::Int(1)));
        assert_eq!(run("ceil(1.1)"), Ok(Value::Int(2)));
    }

    #[test]
    fn wrong_arity_is_reported() {
        assert_eq!(
            run("len([1], [2])"),
            Err(EvalError::WrongArity {
                expected: 1,
                actual: 2
            })
        );
    }
}
