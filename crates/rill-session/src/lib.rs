//! Interactive evaluation sessions.
//!
//! A [`Session`] turns source text into a rendered result string, one
//! submission at a time. Submissions are ordered: each `begin` hands out
//! a ticket and supersedes everything before it, so when evaluations
//! overlap (a long-running one still finishing while the user has
//! already typed something new), only the latest submission's result is
//! ever delivered. Superseded evaluations are also cancelled
//! cooperatively so they stop burning cycles.
//!
//! Every outcome is a plain `String`: either the printed value, or an
//! `error: <Kind>: <detail>` line. Submitting never panics and never
//! returns control to the caller without a renderable answer.

use rill_diagnostic::Diagnostic;
use rill_eval::{prelude, Environment, EvalError, Evaluator, Limits, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// An in-flight submission, created by [`Session::begin`].
///
/// Holds the ticket that decides whether its result is still wanted and
/// the cancellation flag a later submission will trip.
pub struct Pending {
    ticket: u64,
    source: String,
    cancel: Rc<Cell<bool>>,
}

impl Pending {
    /// The submission's position in the session's order.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// An interactive evaluation session.
///
/// The prelude environment is built once and shared across submissions;
/// each evaluation gets a fresh child scope, so no user state leaks
/// from one submission into the next.
pub struct Session {
    prelude: Rc<Environment>,
    limits: Limits,
    latest: Cell<u64>,
    next_ticket: Cell<u64>,
    current_cancel: RefCell<Option<Rc<Cell<bool>>>>,
}

impl Session {
    /// Create a session with default evaluation bounds.
    pub fn initialize() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create a session with explicit evaluation bounds.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            prelude: Rc::new(prelude()),
            limits,
            latest: Cell::new(0),
            next_ticket: Cell::new(0),
            current_cancel: RefCell::new(None),
        }
    }

    /// Submit source text and evaluate it to completion.
    ///
    /// The all-in-one path for callers that never overlap submissions;
    /// it still supersedes any evaluation left in flight.
    pub fn submit(&self, source: &str) -> String {
        let pending = self.begin(source);
        self.evaluate(&pending)
    }

    /// Register a submission, superseding all earlier ones.
    ///
    /// The previous in-flight evaluation (if any) has its cancellation
    /// flag tripped; its `complete` call will return `None`.
    pub fn begin(&self, source: &str) -> Pending {
        let ticket = self.next_ticket.get() + 1;
        self.next_ticket.set(ticket);
        self.latest.set(ticket);

        let cancel = Rc::new(Cell::new(false));
        if let Some(old) = self.current_cancel.replace(Some(cancel.clone())) {
            old.set(true);
        }

        Pending {
            ticket,
            source: source.to_string(),
            cancel,
        }
    }

    /// Evaluate a pending submission and deliver its result, or `None`
    /// if a newer submission has superseded it.
    ///
    /// Stale results are dropped no matter which order evaluations
    /// finish in; the ticket comparison is the only arbiter.
    pub fn complete(&self, pending: Pending) -> Option<String> {
        let rendered = self.evaluate(&pending);
        (self.latest.get() == pending.ticket).then_some(rendered)
    }

    /// Whether a pending submission is still the latest one.
    pub fn is_current(&self, pending: &Pending) -> bool {
        self.latest.get() == pending.ticket
    }

    fn evaluate(&self, pending: &Pending) -> String {
        let expr = match rill_parser::parse(&pending.source) {
            Ok(expr) => expr,
            Err(diagnostic) => return render_syntax_error(&diagnostic),
        };

        let evaluator =
            Evaluator::new(self.limits.clone()).with_cancel(pending.cancel.clone());
        let env = Rc::new(Environment::child(self.prelude.clone()));

        let result = evaluator
            .eval(&expr, &env)
            .and_then(|value| evaluator.display(&value));
        match result {
            Ok(rendered) => rendered,
            Err(err) => render_eval_error(&err),
        }
    }
}

fn render_syntax_error(diagnostic: &Diagnostic) -> String {
    format!(
        "error: SyntaxError: {} (at byte {})",
        diagnostic.message,
        diagnostic.offset()
    )
}

fn render_eval_error(err: &EvalError) -> String {
    format!("error: {err}")
}

/// Parse and evaluate a single expression outside any session.
///
/// Used by one-shot callers that want a [`Value`] rather than rendered
/// text.
pub fn eval_str(source: &str) -> Result<Value, String> {
    let expr = rill_parser::parse(source).map_err(|d| render_syntax_error(&d))?;
    let evaluator = Evaluator::new(Limits::default());
    let env = Rc::new(Environment::child(Rc::new(prelude())));
    evaluator
        .eval(&expr, &env)
        .and_then(|v| evaluator.force(v))
        .map_err(|e| render_eval_error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_arithmetic() {
        let session = Session::initialize();
        assert_eq!(session.submit("1 + 1"), "2");
    }

    #[test]
    fn let_sharing() {
        let session = Session::initialize();
        assert_eq!(session.submit("let x = 1; in x + x"), "2");
    }

    #[test]
    fn unbound_variable_renders_as_error_line() {
        let session = Session::initialize();
        assert_eq!(
            session.submit("undefinedVar"),
            "error: UnboundVariable: undefinedVar"
        );
    }

    #[test]
    fn syntax_errors_carry_a_byte_offset() {
        let session = Session::initialize();
        let rendered = session.submit("((");
        assert!(
            rendered.starts_with("error: SyntaxError: "),
            "unexpected rendering: {rendered}"
        );
        assert!(
            rendered.ends_with("(at byte 2)"),
            "unexpected rendering: {rendered}"
        );
    }

    #[test]
    fn bindings_do_not_leak_between_submissions() {
        let session = Session::initialize();
        assert_eq!(session.submit("let x = 7; in x"), "7");
        assert_eq!(
            session.submit("x"),
            "error: UnboundVariable: x"
        );
    }

    #[test]
    fn newer_submission_supersedes_older() {
        let session = Session::initialize();
        let first = session.begin("1 + 1");
        let second = session.begin("2 + 2");

        // Out-of-order completion: the stale ticket is dropped either way
        assert_eq!(session.complete(second), Some("4".to_string()));
        assert_eq!(session.complete(first), None);
    }

    #[test]
    fn superseded_submission_is_cancelled() {
        let session = Session::initialize();
        let first = session.begin("1 + 1");
        let _second = session.begin("2 + 2");

        assert!(first.cancel.get());
        assert!(!session.is_current(&first));
        // Evaluating anyway hits the tripped flag before producing 2
        assert_eq!(session.complete(first), None);
    }

    #[test]
    fn results_are_deterministic_across_submissions() {
        let session = Session::initialize();
        let source = "#{ b = 2, a = 1, c = [1.0, \"x\"] }";
        let first = session.submit(source);
        let second = session.submit(source);
        assert_eq!(first, second);
        assert_eq!(first, "#{ a = 1, b = 2, c = [1.0, \"x\"] }");
    }

    #[test]
    fn runaway_evaluation_comes_back_as_an_error_line() {
        let session = Session::with_limits(Limits {
            max_depth: 64,
            ..Limits::default()
        });
        assert_eq!(
            session.submit("let f = fn(n) f(n + 1); in f(0)"),
            "error: StackDepthExceeded: evaluation exceeded the recursion depth bound"
        );
    }

    #[test]
    fn eval_str_returns_values() {
        match eval_str("40 + 2") {
            Ok(Value::Int(n)) => assert_eq!(n, 42),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
