//! Deterministic value rendering.
//!
//! Printing forces the value deep: every list element and record field
//! is forced before it is rendered, so a successfully printed value
//! contains no remaining thunks. Rendering the same value twice yields
//! byte-identical output; record fields come out in key order because
//! records are stored sorted.

use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::value::Value;
use std::fmt::Write;

impl Evaluator {
    /// Render a value to its canonical display form, forcing as needed.
    ///
    /// Aggregates reachable through themselves render as `<cycle>`
    /// instead of recursing forever.
    pub fn display(&self, value: &Value) -> Result<String, EvalError> {
        let mut out = String::new();
        let mut printer = Printer {
            evaluator: self,
            visiting: Vec::new(),
        };
        printer.write(&mut out, value.clone())?;
        Ok(out)
    }
}

struct Printer<'a> {
    evaluator: &'a Evaluator,
    // Aggregates currently being rendered, by allocation identity.
    visiting: Vec<*const ()>,
}

impl Printer<'_> {
    fn write(&mut self, out: &mut String, value: Value) -> Result<(), EvalError> {
        let value = self.evaluator.force(value)?;
        match value {
            Value::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Float(f) => {
                // Keep floats visibly floats: a fractional part of zero
                // still prints one decimal place.
                if f.fract() == 0.0 && f.is_finite() {
                    let _ = write!(out, "{f:.1}");
                } else {
                    let _ = write!(out, "{f}");
                }
            }
            Value::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Value::Null => out.push_str("null"),
            Value::String(s) => self.write_string(out, &s),
            Value::List(items) => {
                let id = rc_addr(&items);
                if self.visiting.contains(&id) {
                    out.push_str("<cycle>");
                    return Ok(());
                }
                self.visiting.push(id);
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(out, item.clone())?;
                }
                out.push(']');
                self.visiting.pop();
            }
            Value::Record(fields) => {
                let id = rc_addr(&fields);
                if self.visiting.contains(&id) {
                    out.push_str("<cycle>");
                    return Ok(());
                }
                if fields.is_empty() {
                    out.push_str("#{}");
                    return Ok(());
                }
                self.visiting.push(id);
                out.push_str("#{ ");
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{name} = ");
                    self.write(out, field.clone())?;
                }
                out.push_str(" }");
                self.visiting.pop();
            }
            Value::Closure(_) => out.push_str("<function>"),
            Value::Builtin(b) => {
                let _ = write!(out, "<builtin:{}>", b.name);
            }
            // force() never returns a thunk
            Value::Thunk(_) => {
                return Err(EvalError::Internal("unforced thunk in printer".to_string()))
            }
        }
        Ok(())
    }

    fn write_string(&self, out: &mut String, s: &str) {
        out.push('"');
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                _ => out.push(c),
            }
        }
        out.push('"');
    }
}

fn rc_addr<T: ?Sized>(rc: &std::rc::Rc<T>) -> *const () {
    std::rc::Rc::as_ptr(rc) as *const ()
}

#[cfg(test)]
mod tests {
    use crate::builtin::prelude;
    use crate::env::Environment;
    use crate::eval::{Evaluator, Limits};
    use std::rc::Rc;

    fn render(source: &str) -> String {
        let expr = rill_parser::parse(source).expect("parse error");
        let evaluator = Evaluator::new(Limits::default());
        let env = Rc::new(Environment::child(Rc::new(prelude())));
        let value = evaluator.eval(&expr, &env).expect("eval error");
        evaluator.display(&value).expect("display error")
    }

    #[test]
    fn scalars() {
        assert_eq!(render("1 + 1"), "2");
        assert_eq!(render("true"), "true");
        assert_eq!(render("null"), "null");
        assert_eq!(render("\"he said \\\"hi\\\"\""), "\"he said \\\"hi\\\"\"");
    }

    #[test]
    fn whole_floats_keep_a_decimal() {
        assert_eq!(render("1.0 + 1.0"), "2.0");
        assert_eq!(render("0.5 + 0.25"), "0.75");
    }

    #[test]
    fn lists_and_records() {
        assert_eq!(render("[1, 1 + 1, [3]]"), "[1, 2, [3]]");
        assert_eq!(render("#{}"), "#{}");
        // Key order is sorted regardless of source order
        assert_eq!(
            render("#{ z = 1, a = 2 }"),
            "#{ a = 2, z = 1 }"
        );
    }

    #[test]
    fn functions_render_opaquely() {
        assert_eq!(render("fn(x) x"), "<function>");
        assert_eq!(render("len"), "<builtin:len>");
    }

    #[test]
    fn printing_forces_nested_thunks() {
        assert_eq!(
            render("let xs = [1 + 1, 2 + 2]; in xs"),
            "[2, 4]"
        );
    }

    #[test]
    fn self_referential_list_renders_cycle() {
        // tail(xs) shares the list's elements but builds a new spine,
        // so true spine cycles need a self-referential record.
        assert_eq!(
            render("let r = #{ self = r }; in r"),
            "#{ self = <cycle> }"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let source = "#{ b = [1, 2.0], a = \"x\", c = #{ n = null } }";
        assert_eq!(render(source), render(source));
        assert_eq!(
            render(source),
            "#{ a = \"x\", b = [1, 2.0], c = #{ n = null } }"
        );
    }
}
