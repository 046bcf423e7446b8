//! Runtime values.

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::Evaluator;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A runtime value.
///
/// Records use `BTreeMap` so that printing is deterministic with stable
/// key ordering.
#[derive(Clone)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value
    String(Rc<String>),
    /// Null value
    Null,
    /// List value
    List(Rc<Vec<Value>>),
    /// Record value
    Record(Rc<BTreeMap<String, Value>>),
    /// Closure
    Closure(Rc<Closure>),
    /// Built-in function
    Builtin(BuiltinFn),
    /// Deferred computation
    Thunk(Rc<Thunk>),
}

impl Value {
    /// The kind name used in error messages and `typeOf`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::String(_) => "String",
            Value::Null => "Null",
            Value::List(_) => "List",
            Value::Record(_) => "Record",
            Value::Closure(_) | Value::Builtin(_) => "Function",
            Value::Thunk(_) => "Thunk",
        }
    }

    /// Try to get as float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Null => write!(f, "null"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "#{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} = {value:?}")?;
                }
                write!(f, "}}")
            }
            Value::Closure(_) => write!(f, "<function>"),
            Value::Builtin(b) => write!(f, "<builtin:{}>", b.name),
            Value::Thunk(thunk) => match &*thunk.state() {
                ThunkState::Forced(v) => write!(f, "{v:?}"),
                ThunkState::InProgress => write!(f, "<thunk:forcing>"),
                ThunkState::Suspended { .. } => write!(f, "<thunk>"),
                ThunkState::Failed(_) => write!(f, "<thunk:failed>"),
            },
        }
    }
}

// Scalar-only equality for test assertions; real structural equality
// lives in the evaluator because it has to force thunks.
#[cfg(test)]
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// A user-defined function with its captured environment.
pub struct Closure {
    pub params: Vec<rill_syntax::Ident>,
    pub body: Rc<rill_syntax::Expr>,
    pub env: Rc<Environment>,
}

/// A built-in function.
#[derive(Clone)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&Evaluator, &[Value]) -> Result<Value, EvalError>,
}

/// A deferred computation plus its defining environment.
///
/// The state transitions at most once from `Suspended` through
/// `InProgress` to `Forced` or `Failed`; forcing an already-forced thunk
/// replays the memoized outcome without recomputation. Observing
/// `InProgress` from within a force is a black hole: the value depends
/// on itself.
pub struct Thunk {
    state: RefCell<ThunkState>,
}

/// State of a thunk.
pub enum ThunkState {
    /// Not yet forced
    Suspended {
        expr: Rc<rill_syntax::Expr>,
        env: Rc<Environment>,
    },
    /// Currently being forced
    InProgress,
    /// Forced to a value (which may itself be another thunk)
    Forced(Value),
    /// Forcing failed; the error replays on every later force
    Failed(EvalError),
}

/// Outcome of starting to force a thunk.
pub(crate) enum BeginForce {
    /// Already forced; here is the memoized value.
    Memoized(Value),
    /// Already failed; here is the memoized error.
    Failed(EvalError),
    /// The thunk is being forced further up the stack (black hole).
    InProgress,
    /// State moved to `InProgress`; the caller must evaluate this
    /// expression in this environment and report back via `finish`.
    Started(Rc<rill_syntax::Expr>, Rc<Environment>),
}

impl Thunk {
    pub fn new(expr: Rc<rill_syntax::Expr>, env: Rc<Environment>) -> Self {
        Self {
            state: RefCell::new(ThunkState::Suspended { expr, env }),
        }
    }

    /// Wrap an expression and environment into a thunk value.
    pub fn suspend(expr: Rc<rill_syntax::Expr>, env: Rc<Environment>) -> Value {
        Value::Thunk(Rc::new(Thunk::new(expr, env)))
    }

    pub fn state(&self) -> Ref<'_, ThunkState> {
        self.state.borrow()
    }

    pub(crate) fn begin_force(&self) -> BeginForce {
        let mut state = self.state.borrow_mut();
        match &*state {
            ThunkState::Forced(v) => BeginForce::Memoized(v.clone()),
            ThunkState::Failed(e) => BeginForce::Failed(e.clone()),
            ThunkState::InProgress => BeginForce::InProgress,
            ThunkState::Suspended { .. } => {
                let old = std::mem::replace(&mut *state, ThunkState::InProgress);
                match old {
                    ThunkState::Suspended { expr, env } => BeginForce::Started(expr, env),
                    // Just matched Suspended above
                    _ => BeginForce::InProgress,
                }
            }
        }
    }

    pub(crate) fn finish(&self, result: &Result<Value, EvalError>) {
        let mut state = self.state.borrow_mut();
        *state = match result {
            Ok(v) => ThunkState::Forced(v.clone()),
            Err(e) => ThunkState::Failed(e.clone()),
        };
    }
}
