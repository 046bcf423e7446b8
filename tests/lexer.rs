//! Integration tests for rill-lexer crate.

use rill_lexer::{Lexer, TokenKind};

fn lex(source: &str) -> Vec<TokenKind> {
    let lexer = Lexer::new(source);
    let (tokens, _) = lexer.tokenize();
    tokens.into_iter().map(|t| t.kind).collect()
}

fn lex_with_errors(source: &str) -> (Vec<TokenKind>, usize) {
    let lexer = Lexer::new(source);
    let (tokens, errors) = lexer.tokenize();
    (tokens.into_iter().map(|t| t.kind).collect(), errors.len())
}

// ============================================================================
// Basic Token Tests
// ============================================================================

#[test]
fn test_keywords() {
    assert_eq!(
        lex("let in if then else fn"),
        vec![
            TokenKind::Let,
            TokenKind::In,
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::Fn,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_literals() {
    assert_eq!(
        lex("42 2.5 \"hi\" true false null"),
        vec![
            TokenKind::Int(42),
            TokenKind::Float(2.5),
            TokenKind::String("hi".to_string()),
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_operators() {
    assert_eq!(
        lex("+ - * / % == != <= >= && || ++ !"),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::PlusPlus,
            TokenKind::Bang,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_record_opener() {
    assert_eq!(
        lex("#{ x = 1 }"),
        vec![
            TokenKind::HashLBrace,
            TokenKind::Ident("x".to_string()),
            TokenKind::Eq,
            TokenKind::Int(1),
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Trivia
// ============================================================================

#[test]
fn test_line_comments_are_skipped() {
    assert_eq!(
        lex("1 -- the rest of this line vanishes\n+ 2"),
        vec![
            TokenKind::Int(1),
            TokenKind::Plus,
            TokenKind::Int(2),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_spaced_minuses_are_not_a_comment() {
    // `--` with no space starts a comment; `- -` is two operators
    assert_eq!(
        lex("a - - b"),
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Minus,
            TokenKind::Minus,
            TokenKind::Ident("b".to_string()),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_float_with_exponent() {
    assert_eq!(
        lex("1.5e3 2e-2"),
        vec![
            TokenKind::Float(1500.0),
            TokenKind::Float(0.02),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_field_access_does_not_eat_the_dot() {
    assert_eq!(
        lex("r.x"),
        vec![
            TokenKind::Ident("r".to_string()),
            TokenKind::Dot,
            TokenKind::Ident("x".to_string()),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Error Recovery
// ============================================================================

#[test]
fn test_unterminated_string_reports_and_continues() {
    let (tokens, errors) = lex_with_errors("\"oops");
    assert_eq!(errors, 1);
    assert_eq!(*tokens.last().unwrap(), TokenKind::Eof);
}

#[test]
fn test_unexpected_character_reports_and_continues() {
    let (tokens, errors) = lex_with_errors("1 @ 2");
    assert_eq!(errors, 1);
    assert!(tokens.contains(&TokenKind::Int(1)));
    assert!(tokens.contains(&TokenKind::Int(2)));
}
