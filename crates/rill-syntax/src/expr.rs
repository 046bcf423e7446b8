//! Expression AST nodes.
//!
//! A Rill input is a single expression; there are no top-level items.
//! Every node carries the span of the source text it was parsed from.

use rill_common::Span;

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An expression.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression kind.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Bool(bool),
    /// Null literal
    Null,

    /// Variable reference
    Var(Ident),

    /// List literal `[1, 2, 3]`
    List(Vec<Expr>),

    /// Record literal `#{ x = 1, y = 2 }`
    Record(Vec<RecordField>),

    /// Lambda `fn(x, y) x + y`
    Lambda {
        params: Vec<Ident>,
        body: Box<Expr>,
    },

    /// Function call `f(x, y)`
    Call { func: Box<Expr>, args: Vec<Expr> },

    /// Field access `x.field`
    Field { base: Box<Expr>, field: Ident },

    /// Binary operation `a + b`
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation `!a` or `-a`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// If expression `if cond then a else b`
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Let expression `let x = 1; y = 2; in x + y`
    ///
    /// All bindings are in scope in every binding's value (mutual
    /// visibility), so `let x = x; in x` is well-formed syntax whose
    /// evaluation is a black hole.
    Let {
        bindings: Vec<LetBinding>,
        body: Box<Expr>,
    },
}

/// A record field `name = value`.
#[derive(Debug, Clone)]
pub struct RecordField {
    pub name: Ident,
    pub value: Expr,
    pub span: Span,
}

/// A single binding in a `let` expression.
#[derive(Debug, Clone)]
pub struct LetBinding {
    pub name: Ident,
    pub value: Expr,
    pub span: Span,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %

    // Comparison
    Eq, // ==
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Logical
    And, // &&
    Or,  // ||

    // Other
    Concat, // ++
}

impl BinOp {
    /// The operator as it appears in source, used in error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Concat => "++",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -
    Not, // !
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}
