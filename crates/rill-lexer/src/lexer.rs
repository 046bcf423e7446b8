//! The Rill lexer.

use crate::token::{Token, TokenKind};
use rill_common::Span;
use rill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};

/// The Rill lexer.
///
/// Converts source code into a sequence of tokens. The token stream always
/// ends with `Eof`, and lexing terminates on every input; malformed pieces
/// become `Error` tokens with an attached diagnostic.
pub struct Lexer<'src> {
    /// Character iterator with position info
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    /// Current position in source
    pos: usize,
    /// Collected diagnostics (errors/warnings)
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source and return tokens and diagnostics.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    /// Get the next token.
    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::from_usize(start, start));
        };

        let kind = match ch {
            // Single character tokens
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '-' => TokenKind::Minus,

            // Record literal #{
            '#' => {
                if self.peek_char() == Some('{') {
                    self.advance();
                    TokenKind::HashLBrace
                } else {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            }

            // Plus or PlusPlus
            '+' => {
                if self.peek_char() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }

            // Eq or EqEq
            '=' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }

            // Bang or BangEq
            '!' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }

            // Lt or LtEq
            '<' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }

            // Gt or GtEq
            '>' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }

            // AndAnd
            '&' => {
                if self.peek_char() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            }

            // OrOr
            '|' => {
                if self.peek_char() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    self.error_unexpected_char(ch, start);
                    TokenKind::Error
                }
            }

            '"' => self.scan_string(start),

            c if c.is_ascii_digit() => self.scan_number(c, start),

            c if c.is_alphabetic() || c == '_' => self.scan_ident(c),

            _ => {
                self.error_unexpected_char(ch, start);
                TokenKind::Error
            }
        };

        Token::new(kind, Span::from_usize(start, self.pos))
    }

    /// Skip whitespace and `--` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some((_, c)) if c.is_whitespace() => {
                    self.advance();
                }
                Some((pos, '-')) => {
                    // Only a comment if followed by another `-`
                    let rest_is_comment = {
                        let mut lookahead = self.chars.clone();
                        lookahead.next();
                        matches!(lookahead.peek(), Some((_, '-')))
                    };
                    if !rest_is_comment {
                        break;
                    }
                    let _ = pos;
                    while let Some((_, c)) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Scan a string literal. The opening quote has been consumed.
    fn scan_string(&mut self, start: usize) -> TokenKind {
        let mut value = String::new();

        loop {
            let Some((pos, ch)) = self.advance() else {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Lexer,
                        Span::from_usize(start, self.pos),
                        "unterminated string literal",
                    )
                    .with_code(ErrorCode::UnterminatedString)
                    .with_label(Label::new(
                        Span::from_usize(start, start + 1),
                        "string starts here",
                    )),
                );
                return TokenKind::Error;
            };

            match ch {
                '"' => return TokenKind::String(value),
                '\\' => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '"')) => value.push('"'),
                    Some((esc_pos, other)) => {
                        self.diagnostics.push(
                            Diagnostic::error(
                                DiagnosticKind::Lexer,
                                Span::from_usize(pos, esc_pos + other.len_utf8()),
                                format!("invalid escape sequence `\\{other}`"),
                            )
                            .with_code(ErrorCode::InvalidEscape),
                        );
                        // Keep scanning so later errors are still reported
                        value.push(other);
                    }
                    None => {
                        self.diagnostics.push(
                            Diagnostic::error(
                                DiagnosticKind::Lexer,
                                Span::from_usize(start, self.pos),
                                "unterminated string literal",
                            )
                            .with_code(ErrorCode::UnterminatedString),
                        );
                        return TokenKind::Error;
                    }
                },
                _ => value.push(ch),
            }
        }
    }

    /// Scan an integer or float literal. The first digit has been consumed.
    fn scan_number(&mut self, first: char, start: usize) -> TokenKind {
        let mut text = String::from(first);

        while let Some((_, c)) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // Fractional part: `.` must be followed by a digit, otherwise it is
        // a field-access dot
        let mut is_float = false;
        if self.peek_char() == Some('.') {
            let digit_follows = {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                matches!(lookahead.peek(), Some((_, c)) if c.is_ascii_digit())
            };
            if digit_follows {
                is_float = true;
                text.push('.');
                self.advance();
                while let Some((_, c)) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        // Exponent
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let mut valid = matches!(lookahead.peek(), Some((_, c)) if c.is_ascii_digit());
            if matches!(lookahead.peek(), Some((_, '+')) | Some((_, '-'))) {
                lookahead.next();
                valid = matches!(lookahead.peek(), Some((_, c)) if c.is_ascii_digit());
            }
            if valid {
                is_float = true;
                if let Some((_, e)) = self.advance() {
                    text.push(e);
                }
                if matches!(self.peek_char(), Some('+') | Some('-')) {
                    if let Some((_, sign)) = self.advance() {
                        text.push(sign);
                    }
                }
                while let Some((_, c)) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(f) => TokenKind::Float(f),
                Err(_) => {
                    self.error_invalid_number(&text, start);
                    TokenKind::Error
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => {
                    self.error_invalid_number(&text, start);
                    TokenKind::Error
                }
            }
        }
    }

    /// Scan an identifier or keyword. The first character has been consumed.
    fn scan_ident(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while let Some((_, c)) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::keyword_from_str(&name).unwrap_or(TokenKind::Ident(name))
    }

    fn error_unexpected_char(&mut self, ch: char, start: usize) {
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Lexer,
                Span::from_usize(start, start + ch.len_utf8()),
                format!("unexpected character `{ch}`"),
            )
            .with_code(ErrorCode::UnexpectedCharacter),
        );
    }

    fn error_invalid_number(&mut self, text: &str, start: usize) {
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Lexer,
                Span::from_usize(start, self.pos),
                format!("invalid number literal `{text}`"),
            )
            .with_code(ErrorCode::InvalidNumber),
        );
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((pos, ch)) = next {
            self.pos = pos + ch.len_utf8();
        }
        next
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.peek().map(|(_, c)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn addition() {
        assert_eq!(
            kinds("1 + 1"),
            vec![
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(1),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("let x in xs"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("x".into()),
                TokenKind::In,
                TokenKind::Ident("xs".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn float_versus_field_access() {
        assert_eq!(
            kinds("1.5"),
            vec![TokenKind::Float(1.5), TokenKind::Eof]
        );
        assert_eq!(
            kinds("r.x"),
            vec![
                TokenKind::Ident("r".into()),
                TokenKind::Dot,
                TokenKind::Ident("x".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comment_or_minus() {
        assert_eq!(
            kinds("1 - 2 -- trailing comment"),
            vec![
                TokenKind::Int(1),
                TokenKind::Minus,
                TokenKind::Int(2),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_reports() {
        let (tokens, diagnostics) = Lexer::new("\"abc").tokenize();
        assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].offset(), 0);
    }

    #[test]
    fn garbage_terminates() {
        let (tokens, diagnostics) = Lexer::new("\u{0}\u{1}@@@\u{fffd}").tokenize();
        assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
        assert!(!diagnostics.is_empty());
    }
}
