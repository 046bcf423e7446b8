//! Integration tests for rill-session crate.
//!
//! Covers the interactive contract: every submission produces a
//! renderable string, errors come back as `error:` lines rather than
//! panics, and overlapping submissions resolve last-writer-wins.

use rill_eval::Limits;
use rill_session::Session;

// ============================================================================
// Basic Submissions
// ============================================================================

#[test]
fn test_submission_round_trip() {
    let session = Session::initialize();
    assert_eq!(session.submit("1 + 1"), "2");
    assert_eq!(session.submit("let x = 1; in x + x"), "2");
    assert_eq!(session.submit("\"a\" ++ \"b\""), "\"ab\"");
}

#[test]
fn test_error_rendering_contract() {
    let session = Session::initialize();
    assert_eq!(
        session.submit("undefinedVar"),
        "error: UnboundVariable: undefinedVar"
    );
    assert_eq!(
        session.submit("1 / 0"),
        "error: DivisionByZero: division by zero"
    );
    assert!(session
        .submit("1 + \"a\"")
        .starts_with("error: TypeMismatch: "));
}

#[test]
fn test_cyclic_comparison_comes_back_as_a_result_line() {
    let session = Session::initialize();
    // Same cyclic value on both sides: equal by identity, no recursion
    assert_eq!(session.submit("let r = #{ me = r }; in r == r"), "true");
    // Two distinct mutually referential values: the comparison depends
    // on itself, reported like any other self-dependent value
    assert_eq!(
        session.submit("let a = #{ me = b }; b = #{ me = a }; in a == b"),
        "error: InfiniteRecursion: value depends on itself while being computed"
    );
}

#[test]
fn test_integer_overflow_renders_as_error_line() {
    let session = Session::initialize();
    assert_eq!(
        session.submit("-(0 - 9223372036854775807 - 1)"),
        "error: IntegerOverflow: `-` exceeded the integer range"
    );
    assert_eq!(
        session.submit("9223372036854775807 + 1"),
        "error: IntegerOverflow: `+` exceeded the integer range"
    );
}

#[test]
fn test_syntax_error_names_a_byte_offset() {
    let session = Session::initialize();
    let rendered = session.submit("1 + ");
    assert!(rendered.starts_with("error: SyntaxError: "), "{rendered}");
    assert!(rendered.ends_with("(at byte 4)"), "{rendered}");
}

#[test]
fn test_empty_ish_inputs_do_not_panic() {
    let session = Session::initialize();
    for source in ["", "   ", "\n", "-- just a comment"] {
        let rendered = session.submit(source);
        assert!(rendered.starts_with("error: SyntaxError: "), "{rendered}");
    }
}

// ============================================================================
// Isolation and Determinism
// ============================================================================

#[test]
fn test_submissions_are_isolated() {
    let session = Session::initialize();
    assert_eq!(session.submit("let x = 41; in x + 1"), "42");
    // `x` must not leak out of the previous submission
    assert_eq!(session.submit("x"), "error: UnboundVariable: x");
}

#[test]
fn test_same_input_same_output() {
    let session = Session::initialize();
    let source = "#{ c = [1, 2.5], a = \"s\", b = #{ inner = null } }";
    let outputs: Vec<String> = (0..3).map(|_| session.submit(source)).collect();
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
    assert_eq!(
        outputs[0],
        "#{ a = \"s\", b = #{ inner = null }, c = [1, 2.5] }"
    );
}

// ============================================================================
// Supersession
// ============================================================================

#[test]
fn test_last_submission_wins() {
    let session = Session::initialize();
    let first = session.begin("1 + 1");
    let second = session.begin("2 + 2");

    assert!(session.is_current(&second));
    assert!(!session.is_current(&first));

    // Complete in submission order
    assert_eq!(session.complete(first), None);
    assert_eq!(session.complete(second), Some("4".to_string()));
}

#[test]
fn test_last_submission_wins_out_of_order() {
    let session = Session::initialize();
    let first = session.begin("1 + 1");
    let second = session.begin("2 + 2");

    // Complete in reverse order; the stale result is still dropped
    assert_eq!(session.complete(second), Some("4".to_string()));
    assert_eq!(session.complete(first), None);
}

#[test]
fn test_superseded_work_is_cancelled_not_just_dropped() {
    let session = Session::with_limits(Limits {
        max_steps: u64::MAX,
        ..Limits::default()
    });
    // A submission that would spin for a very long time
    let slow = session.begin("let f = fn(n) if n == 0 then 0 else f(n - 1); in f(100000000)");
    let fast = session.begin("2 + 2");

    // The superseding submission tripped the old flag, so completing the
    // slow one returns promptly instead of spinning
    assert_eq!(session.complete(slow), None);
    assert_eq!(session.complete(fast), Some("4".to_string()));
}

#[test]
fn test_bounded_runaway_still_yields_a_result_line() {
    let session = Session::with_limits(Limits {
        max_depth: usize::MAX,
        max_steps: 10_000,
        timeout: None,
    });
    assert_eq!(
        session.submit("let f = fn(n) f(n + 1); in f(0)"),
        "error: EvaluationTimeout: evaluation exceeded its step or time budget"
    );
}
