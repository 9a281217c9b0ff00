//! AST for the restricted expression language embedded in documents.
//!
//! Every node carries a [`Span`] into the expression source. The set of
//! kinds is closed: anything the grammar does not list is rejected by the
//! parser and can never reach the evaluator.

use crate::Span;

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
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

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Depth of the deepest nested sub-expression, counting this one.
    pub fn depth(&self) -> usize {
        let child = match &self.kind {
            ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Identifier(_) => 0,
            ExprKind::Array(items) => items
                .iter()
                .flatten()
                .map(Expr::depth)
                .max()
                .unwrap_or(0),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => test.depth().max(consequent.depth()).max(alternate.depth()),
            ExprKind::Unary { operand, .. } => operand.depth(),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                left.depth().max(right.depth())
            }
            ExprKind::Member {
                object, property, ..
            } => match property {
                MemberProperty::Static(_) => object.depth(),
                MemberProperty::Computed(key) => object.depth().max(key.depth()),
            },
            ExprKind::Call { callee, args } => args
                .iter()
                .map(Expr::depth)
                .max()
                .unwrap_or(0)
                .max(callee.depth()),
        };
        child + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `42`, `3.5e2`
    Number(f64),
    /// `"hello"`, `'hello'`
    String(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
    /// `[a, , b]`: `None` marks a hole.
    Array(Vec<Option<Expr>>),

    // ── Names ──
    Identifier(String),

    // ── Operators ──
    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// `&&`, `||`, `??`: the right side is evaluated lazily.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    // ── Access & Calls ──
    /// `a.b`, `a[b]`, `a?.b`, `a?.[b]`
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        optional: bool,
    },
    /// `f(a, b)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
}

/// The property side of a member access.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name`
    Static(Ident),
    /// `[expr]`
    Computed(Box<Expr>),
}

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!x`
    Not,
    /// `+x`
    Plus,
    /// `-x`
    Neg,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::LooseEq => "==",
            BinaryOp::LooseNe => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::Nullish => "??",
        }
    }
}
