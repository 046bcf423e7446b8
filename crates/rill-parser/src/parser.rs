//! The Rill parser.

use rill_common::Span;
use rill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use rill_lexer::{Token, TokenKind};
use rill_syntax::*;

/// Bound on expression nesting so pathological inputs fail with a
/// diagnostic instead of exhausting the parser's call stack.
const MAX_NESTING: usize = 500;

/// The Rill parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a complete expression.
    pub fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.enter()?;
        let expr = match self.current_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::Fn => self.parse_lambda(),
            _ => self.parse_binary(0),
        };
        self.depth -= 1;
        expr
    }

    /// Fail unless the whole token stream has been consumed.
    pub fn expect_eof(&mut self) -> Result<(), Diagnostic> {
        if self.at_end() {
            return Ok(());
        }
        Err(Diagnostic::error(
            DiagnosticKind::Parser,
            self.current_span(),
            format!(
                "unexpected {} after the expression",
                self.current_kind().describe()
            ),
        )
        .with_code(ErrorCode::TrailingInput))
    }

    /// `let name = expr; ... in body`
    fn parse_let(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.current_span();
        self.advance(); // let

        let mut bindings = Vec::new();
        loop {
            let name = self.parse_ident()?;
            self.expect(TokenKind::Eq)?;
            let value = self.parse_expr()?;
            let end = self.expect(TokenKind::Semicolon)?;
            bindings.push(LetBinding {
                span: name.span.merge(end),
                name,
                value,
            });

            if self.eat(TokenKind::In) {
                break;
            }
            if self.at_end() {
                return Err(Diagnostic::error(
                    DiagnosticKind::Parser,
                    self.current_span(),
                    "expected another binding or `in` in let expression",
                )
                .with_code(ErrorCode::UnexpectedToken)
                .with_label(Label::new(start, "let expression starts here")));
            }
        }

        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Let {
                bindings,
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `if cond then a else b`
    fn parse_if(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.current_span();
        self.advance(); // if

        let condition = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = self.parse_expr()?;
        self.expect(TokenKind::Else)?;
        let else_branch = self.parse_expr()?;

        let span = start.merge(else_branch.span);
        Ok(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }

    /// `fn(a, b) body`
    fn parse_lambda(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.current_span();
        self.advance(); // fn

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_ident()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    /// Precedence climbing over binary operators.
    ///
    /// Levels, lowest first: `||`, `&&`, `== !=`, `< <= > >=`, `++`,
    /// `+ -`, `* / %`. All are left-associative.
    fn parse_binary(&mut self, min_level: u8) -> Result<Expr, Diagnostic> {
        const TOP_LEVEL: u8 = 7;
        if min_level >= TOP_LEVEL {
            return self.parse_unary();
        }

        let mut left = self.parse_binary(min_level + 1)?;

        while let Some(op) = self.binary_op_at(min_level) {
            self.advance();
            let right = self.parse_binary(min_level + 1)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// The binary operator the current token denotes, if it sits at the
    /// given precedence level.
    fn binary_op_at(&self, level: u8) -> Option<BinOp> {
        let op = match self.current_kind() {
            TokenKind::OrOr => BinOp::Or,
            TokenKind::AndAnd => BinOp::And,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::PlusPlus => BinOp::Concat,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            _ => return None,
        };
        let op_level = match op {
            BinOp::Or => 0,
            BinOp::And => 1,
            BinOp::Eq | BinOp::Ne => 2,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
            BinOp::Concat => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        };
        (op_level == level).then_some(op)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };

        if let Some(op) = op {
            self.enter()?;
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            self.depth -= 1;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        self.parse_postfix()
    }

    /// Calls `f(a, b)` and field accesses `r.x`, tightest-binding.
    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RParen)?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.parse_ident()?;
                    let span = expr.span.merge(field.span);
                    expr = Expr::new(
                        ExprKind::Field {
                            base: Box::new(expr),
                            field,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.current_span();
        let kind = match self.current_kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            TokenKind::Float(f) => {
                self.advance();
                ExprKind::Float(f)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::String(s)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Var(Ident::new(name, span))
            }

            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_closing(TokenKind::RParen, span)?;
                return Ok(inner);
            }

            TokenKind::LBracket => return self.parse_list(),
            TokenKind::HashLBrace => return self.parse_record(),

            // `let`, `if` and `fn` are valid in any expression position
            TokenKind::Let => return self.parse_let(),
            TokenKind::If => return self.parse_if(),
            TokenKind::Fn => return self.parse_lambda(),

            other => {
                return Err(Diagnostic::error(
                    DiagnosticKind::Parser,
                    span,
                    format!("expected an expression, found {}", other.describe()),
                )
                .with_code(ErrorCode::ExpectedExpression));
            }
        };

        Ok(Expr::new(kind, span))
    }

    fn parse_list(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.current_span();
        self.advance(); // [

        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            items.push(self.parse_expr()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect_closing(TokenKind::RBracket, start)?;

        Ok(Expr::new(ExprKind::List(items), start.merge(end)))
    }

    fn parse_record(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.current_span();
        self.advance(); // #{

        let mut fields: Vec<RecordField> = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let name = self.parse_ident()?;
            if let Some(existing) = fields.iter().find(|f| f.name.name == name.name) {
                return Err(Diagnostic::error(
                    DiagnosticKind::Parser,
                    name.span,
                    format!("field `{}` is defined more than once", name.name),
                )
                .with_code(ErrorCode::DuplicateField)
                .with_label(Label::new(existing.name.span, "first defined here")));
            }
            self.expect(TokenKind::Eq)?;
            let value = self.parse_expr()?;
            fields.push(RecordField {
                span: name.span.merge(value.span),
                name,
                value,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect_closing(TokenKind::RBrace, start)?;

        Ok(Expr::new(ExprKind::Record(fields), start.merge(end)))
    }

    fn parse_ident(&mut self) -> Result<Ident, Diagnostic> {
        let span = self.current_span();
        if let TokenKind::Ident(name) = self.current_kind().clone() {
            self.advance();
            Ok(Ident::new(name, span))
        } else {
            Err(Diagnostic::error(
                DiagnosticKind::Parser,
                span,
                format!(
                    "expected an identifier, found {}",
                    self.current_kind().describe()
                ),
            )
            .with_code(ErrorCode::UnexpectedToken))
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Span, Diagnostic> {
        let span = self.current_span();
        if self.check(&kind) {
            self.advance();
            Ok(span)
        } else {
            Err(Diagnostic::error(
                DiagnosticKind::Parser,
                span,
                format!(
                    "expected {}, found {}",
                    kind.describe(),
                    self.current_kind().describe()
                ),
            )
            .with_code(ErrorCode::UnexpectedToken))
        }
    }

    /// Like `expect` for closing delimiters, pointing back at the opener
    /// when the input ran out.
    fn expect_closing(&mut self, kind: TokenKind, open: Span) -> Result<Span, Diagnostic> {
        let span = self.current_span();
        if self.check(&kind) {
            self.advance();
            return Ok(span);
        }
        let mut diag = Diagnostic::error(
            DiagnosticKind::Parser,
            span,
            format!(
                "expected {}, found {}",
                kind.describe(),
                self.current_kind().describe()
            ),
        )
        .with_label(Label::new(open, "delimiter opened here"));
        diag = if self.at_end() {
            diag.with_code(ErrorCode::UnclosedDelimiter)
        } else {
            diag.with_code(ErrorCode::UnexpectedToken)
        };
        Err(diag)
    }

    fn enter(&mut self) -> Result<(), Diagnostic> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(Diagnostic::error(
                DiagnosticKind::Parser,
                self.current_span(),
                "expression is nested too deeply",
            )
            .with_code(ErrorCode::NestingTooDeep));
        }
        Ok(())
    }

    fn current(&self) -> &Token {
        // The lexer guarantees a trailing Eof token
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn at_end(&self) -> bool {
        *self.current_kind() == TokenKind::Eof
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn precedence_mul_over_add() {
        let expr = parse("1 + 2 * 3").unwrap();
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn left_associative_subtraction() {
        // (10 - 4) - 3
        let expr = parse("10 - 4 - 3").unwrap();
        let ExprKind::Binary { op, left, .. } = expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinOp::Sub);
        assert!(matches!(
            left.kind,
            ExprKind::Binary { op: BinOp::Sub, .. }
        ));
    }

    #[test]
    fn call_binds_tighter_than_unary_minus() {
        let expr = parse("-f(1)").unwrap();
        let ExprKind::Unary { op, operand } = expr.kind else {
            panic!("expected unary expression");
        };
        assert_eq!(op, UnaryOp::Neg);
        assert!(matches!(operand.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn unbalanced_paren_reports_offset() {
        let err = parse("((").unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::ExpectedExpression));
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn trailing_tokens_rejected() {
        let err = parse("1 1").unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::TrailingInput));
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn deep_nesting_fails_cleanly() {
        let source = "(".repeat(100_000);
        let err = parse(&source).unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::NestingTooDeep));
    }

    #[test]
    fn duplicate_record_field_rejected() {
        let err = parse("#{ x = 1, x = 2 }").unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::DuplicateField));
        assert_eq!(err.offset(), 10);
    }

    #[test]
    fn let_with_multiple_bindings() {
        let expr = parse("let x = 1; y = x; in y").unwrap();
        let ExprKind::Let { bindings, .. } = expr.kind else {
            panic!("expected let expression");
        };
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name.name, "x");
        assert_eq!(bindings[1].name.name, "y");
    }
}
