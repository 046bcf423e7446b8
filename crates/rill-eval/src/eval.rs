//! Expression evaluation.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::{BeginForce, Closure, Thunk, Value};
use rill_syntax::{BinOp, Expr, ExprKind, UnaryOp};
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Resource bounds for a single evaluation call.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum recursion depth before `StackDepthExceeded`.
    pub max_depth: usize,
    /// Maximum evaluation steps before `EvaluationTimeout`.
    pub max_steps: u64,
    /// Optional wall-clock bound; checked at step checkpoints.
    pub timeout: Option<Duration>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_steps: 1_000_000,
            timeout: None,
        }
    }
}

/// The Rill evaluator.
///
/// One evaluator drives one evaluation call; it owns the step counter,
/// the depth counter, and the deadline. The environment chain and the
/// value graph it builds are private to the call, so nothing leaks into
/// later evaluations.
pub struct Evaluator {
    limits: Limits,
    steps: Cell<u64>,
    depth: Cell<usize>,
    started: Instant,
    cancel: Option<Rc<Cell<bool>>>,
}

impl Evaluator {
    /// Create a new evaluator with the given bounds.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            steps: Cell::new(0),
            depth: Cell::new(0),
            started: Instant::now(),
            cancel: None,
        }
    }

    /// Attach a cooperative cancellation flag, checked at step
    /// checkpoints and thunk-forcing boundaries.
    pub fn with_cancel(mut self, flag: Rc<Cell<bool>>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Steps consumed so far. Forcing a memoized thunk consumes none.
    pub fn steps(&self) -> u64 {
        self.steps.get()
    }

    /// Evaluate an expression in an environment.
    ///
    /// The result may be a thunk; callers that need a concrete value
    /// follow up with [`Evaluator::force`].
    pub fn eval(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, EvalError> {
        self.tick()?;

        let depth = self.depth.get() + 1;
        if depth > self.limits.max_depth {
            return Err(EvalError::StackDepthExceeded);
        }
        self.depth.set(depth);
        let result = self.eval_inner(expr, env);
        self.depth.set(depth - 1);
        result
    }

    fn eval_inner(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::String(s) => Ok(Value::String(Rc::new(s.clone()))),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),

            ExprKind::Var(ident) => env.get(&ident.name).ok_or_else(|| {
                EvalError::UnboundVariable {
                    name: ident.name.clone(),
                }
            }),

            // Elements stay unevaluated until observed
            ExprKind::List(items) => {
                let values = items
                    .iter()
                    .map(|item| Thunk::suspend(Rc::new(item.clone()), env.clone()))
                    .collect();
                Ok(Value::List(Rc::new(values)))
            }

            ExprKind::Record(fields) => {
                let mut map = BTreeMap::new();
                for field in fields {
                    map.insert(
                        field.name.name.clone(),
                        Thunk::suspend(Rc::new(field.value.clone()), env.clone()),
                    );
                }
                Ok(Value::Record(Rc::new(map)))
            }

            ExprKind::Lambda { params, body } => Ok(Value::Closure(Rc::new(Closure {
                params: params.clone(),
                body: Rc::new((**body).clone()),
                env: env.clone(),
            }))),

            // Call-by-need: arguments are suspended, not evaluated
            ExprKind::Call { func, args } => {
                let func_val = self.eval(func, env)?;
                let arg_vals = args
                    .iter()
                    .map(|arg| Thunk::suspend(Rc::new(arg.clone()), env.clone()))
                    .collect();
                self.apply(func_val, arg_vals)
            }

            ExprKind::Field { base, field } => {
                let base_val = self.eval(base, env)?;
                match self.force(base_val)? {
                    Value::Record(fields) => {
                        fields
                            .get(&field.name)
                            .cloned()
                            .ok_or_else(|| EvalError::NoSuchField {
                                field: field.name.clone(),
                            })
                    }
                    other => Err(EvalError::TypeMismatch {
                        operation: format!(".{}", field.name),
                        expected: "Record".to_string(),
                        actual: other.type_name().to_string(),
                    }),
                }
            }

            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env),

            ExprKind::Unary { op, operand } => {
                let val = self.eval(operand, env)?;
                self.eval_unary(*op, self.force(val)?)
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.eval(condition, env)?;
                match self.force(cond)? {
                    Value::Bool(true) => self.eval(then_branch, env),
                    Value::Bool(false) => self.eval(else_branch, env),
                    other => Err(EvalError::TypeMismatch {
                        operation: "if".to_string(),
                        expected: "Bool".to_string(),
                        actual: other.type_name().to_string(),
                    }),
                }
            }

            ExprKind::Let { bindings, body } => {
                // All bindings are thunks over the scope that contains
                // them, so they see each other; a binding that observes
                // itself hits the black-hole check in force_thunk.
                let scope = Rc::new(Environment::child(env.clone()));
                for binding in bindings {
                    scope.define(
                        binding.name.name.clone(),
                        Thunk::suspend(Rc::new(binding.value.clone()), scope.clone()),
                    );
                }
                self.eval(body, &scope)
            }
        }
    }

    /// Force a value until it is no longer a thunk.
    pub fn force(&self, value: Value) -> Result<Value, EvalError> {
        let mut current = value;
        while let Value::Thunk(thunk) = current {
            current = self.force_thunk(&thunk)?;
        }
        Ok(current)
    }

    fn force_thunk(&self, thunk: &Rc<Thunk>) -> Result<Value, EvalError> {
        self.tick()?;

        let (expr, env) = match thunk.begin_force() {
            BeginForce::Memoized(v) => return Ok(v),
            BeginForce::Failed(e) => return Err(e),
            BeginForce::InProgress => return Err(EvalError::InfiniteRecursion),
            BeginForce::Started(expr, env) => (expr, env),
        };

        let result = self.eval(&expr, &env);
        thunk.finish(&result);
        result
    }

    /// Apply a function value to arguments.
    pub fn apply(&self, func: Value, args: Vec<Value>) -> Result<Value, EvalError> {
        match self.force(func)? {
            Value::Closure(closure) => {
                if args.len() != closure.params.len() {
                    return Err(EvalError::WrongArity {
                        expected: closure.params.len(),
                        actual: args.len(),
                    });
                }

                let scope = Rc::new(Environment::child(closure.env.clone()));
                for (param, arg) in closure.params.iter().zip(args) {
                    scope.define(param.name.clone(), arg);
                }
                self.eval(&closure.body, &scope)
            }
            Value::Builtin(builtin) => {
                if args.len() != builtin.arity {
                    return Err(EvalError::WrongArity {
                        expected: builtin.arity,
                        actual: args.len(),
                    });
                }
                (builtin.func)(self, &args)
            }
            other => Err(EvalError::NotAFunction {
                actual: other.type_name(),
            }),
        }
    }

    fn eval_binary(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        env: &Rc<Environment>,
    ) -> Result<Value, EvalError> {
        // Short-circuit operators force only as much as they need
        if matches!(op, BinOp::And | BinOp::Or) {
            let lhs = self.eval(left, env)?;
            let lhs = self.expect_bool(op, self.force(lhs)?)?;
            return match (op, lhs) {
                (BinOp::And, false) => Ok(Value::Bool(false)),
                (BinOp::Or, true) => Ok(Value::Bool(true)),
                _ => {
                    let rhs = self.eval(right, env)?;
                    let rhs = self.expect_bool(op, self.force(rhs)?)?;
                    Ok(Value::Bool(rhs))
                }
            };
        }

        let lhs = self.eval(left, env)?;
        let lhs = self.force(lhs)?;
        let rhs = self.eval(right, env)?;
        let rhs = self.force(rhs)?;

        match op {
            BinOp::Add => self.arith(op, lhs, rhs, i64::checked_add, |a, b| a + b),
            BinOp::Sub => self.arith(op, lhs, rhs, i64::checked_sub, |a, b| a - b),
            BinOp::Mul => self.arith(op, lhs, rhs, i64::checked_mul, |a, b| a * b),

            BinOp::Div => match (&lhs, &rhs) {
                (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
                _ => match (lhs.as_float(), rhs.as_float()) {
                    (Some(a), Some(b)) => Ok(Value::Float(a / b)),
                    _ => Err(self.mismatch(op, &lhs, &rhs)),
                },
            },

            BinOp::Mod => match (&lhs, &rhs) {
                (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a % b)),
                _ => Err(self.mismatch(op, &lhs, &rhs)),
            },

            BinOp::Eq => Ok(Value::Bool(self.values_equal(&lhs, &rhs)?)),
            BinOp::Ne => Ok(Value::Bool(!self.values_equal(&lhs, &rhs)?)),

            BinOp::Lt => self.compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_lt())),
            BinOp::Le => self.compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_le())),
            BinOp::Gt => self.compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_gt())),
            BinOp::Ge => self.compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_ge())),

            BinOp::Concat => match (&lhs, &rhs) {
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::String(Rc::new(format!("{a}{b}"))))
                }
                (Value::List(a), Value::List(b)) => {
                    let mut items: Vec<Value> = (**a).clone();
                    items.extend(b.iter().cloned());
                    Ok(Value::List(Rc::new(items)))
                }
                _ => Err(self.mismatch(op, &lhs, &rhs)),
            },

            BinOp::And | BinOp::Or => Err(EvalError::Internal(
                "short-circuit operator fell through".to_string(),
            )),
        }
    }

    /// Numeric arithmetic with widening as the only implicit coercion:
    /// Int op Int stays Int, any Float operand widens to Float.
    fn arith(
        &self,
        op: BinOp,
        lhs: Value,
        rhs: Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, EvalError> {
        match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => {
                int_op(*a, *b)
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::IntegerOverflow {
                        operation: op.symbol().to_string(),
                    })
            }
            _ => match (lhs.as_float(), rhs.as_float()) {
                (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
                _ => Err(self.mismatch(op, &lhs, &rhs)),
            },
        }
    }

    /// Structural equality over forced values. Forces nested list and
    /// record elements as needed; functions never compare equal.
    ///
    /// Pointer-identical aggregates are equal without looking inside, and
    /// a pair that is already being compared further up is a value that
    /// depends on its own comparison: a black hole, like a thunk that
    /// observes itself.
    fn values_equal(&self, a: &Value, b: &Value) -> Result<bool, EvalError> {
        let mut comparing = Vec::new();
        self.values_equal_inner(a, b, &mut comparing)
    }

    fn values_equal_inner(
        &self,
        a: &Value,
        b: &Value,
        comparing: &mut Vec<(*const (), *const ())>,
    ) -> Result<bool, EvalError> {
        Ok(match (a, b) {
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
                (*x as f64) == *y
            }
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Null, Value::Null) => true,
            (Value::List(x), Value::List(y)) => {
                if Rc::ptr_eq(x, y) {
                    return Ok(true);
                }
                let pair = (Rc::as_ptr(x) as *const (), Rc::as_ptr(y) as *const ());
                if comparing.contains(&pair) {
                    return Err(EvalError::InfiniteRecursion);
                }
                comparing.push(pair);
                let equal = self.lists_equal(x, y, comparing);
                comparing.pop();
                return equal;
            }
            (Value::Record(x), Value::Record(y)) => {
                if Rc::ptr_eq(x, y) {
                    return Ok(true);
                }
                let pair = (Rc::as_ptr(x) as *const (), Rc::as_ptr(y) as *const ());
                if comparing.contains(&pair) {
                    return Err(EvalError::InfiniteRecursion);
                }
                comparing.push(pair);
                let equal = self.records_equal(x, y, comparing);
                comparing.pop();
                return equal;
            }
            _ => false,
        })
    }

    fn lists_equal(
        &self,
        x: &[Value],
        y: &[Value],
        comparing: &mut Vec<(*const (), *const ())>,
    ) -> Result<bool, EvalError> {
        if x.len() != y.len() {
            return Ok(false);
        }
        for (a, b) in x.iter().zip(y.iter()) {
            let a = self.force(a.clone())?;
            let b = self.force(b.clone())?;
            if !self.values_equal_inner(&a, &b, comparing)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn records_equal(
        &self,
        x: &BTreeMap<String, Value>,
        y: &BTreeMap<String, Value>,
        comparing: &mut Vec<(*const (), *const ())>,
    ) -> Result<bool, EvalError> {
        if x.len() != y.len() {
            return Ok(false);
        }
        for ((ka, va), (kb, vb)) in x.iter().zip(y.iter()) {
            if ka != kb {
                return Ok(false);
            }
            let va = self.force(va.clone())?;
            let vb = self.force(vb.clone())?;
            if !self.values_equal_inner(&va, &vb, comparing)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn compare(&self, op: BinOp, a: &Value, b: &Value) -> Result<Ordering, EvalError> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
            _ => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| EvalError::TypeMismatch {
                    operation: op.symbol().to_string(),
                    expected: "comparable numbers".to_string(),
                    actual: "NaN".to_string(),
                }),
                _ => Err(self.mismatch(op, a, b)),
            },
        }
    }

    fn eval_unary(&self, op: UnaryOp, val: Value) -> Result<Value, EvalError> {
        match (op, &val) {
            // i64::MIN has no positive counterpart
            (UnaryOp::Neg, Value::Int(n)) => {
                n.checked_neg()
                    .map(Value::Int)
                    .ok_or(EvalError::IntegerOverflow {
                        operation: "-".to_string(),
                    })
            }
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            _ => Err(EvalError::TypeMismatch {
                operation: op.symbol().to_string(),
                expected: match op {
                    UnaryOp::Neg => "Int or Float",
                    UnaryOp::Not => "Bool",
                }
                .to_string(),
                actual: val.type_name().to_string(),
            }),
        }
    }

    fn expect_bool(&self, op: BinOp, val: Value) -> Result<bool, EvalError> {
        match val {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeMismatch {
                operation: op.symbol().to_string(),
                expected: "Bool".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    fn mismatch(&self, op: BinOp, lhs: &Value, rhs: &Value) -> EvalError {
        EvalError::TypeMismatch {
            operation: op.symbol().to_string(),
            expected: match op {
                BinOp::Concat => "two Strings or two Lists",
                _ => "numbers",
            }
            .to_string(),
            actual: format!("{} and {}", lhs.type_name(), rhs.type_name()),
        }
    }

    /// One step: count it and check every bound that can expire.
    fn tick(&self) -> Result<(), EvalError> {
        if let Some(flag) = &self.cancel {
            if flag.get() {
                return Err(EvalError::Cancelled);
            }
        }

        let steps = self.steps.get() + 1;
        self.steps.set(steps);
        if steps > self.limits.max_steps {
            return Err(EvalError::EvaluationTimeout);
        }

        // Checking the clock every step would dominate small
        // evaluations; every 1024 steps is plenty fine-grained.
        if steps % 1024 == 0 {
            if let Some(timeout) = self.limits.timeout {
                if self.started.elapsed() > timeout {
                    return Err(EvalError::EvaluationTimeout);
                }
            }
        }

        Ok(())
    }
}
