//! Expression AST nodes for glang.
//!
//! # Expression Precedence
//!
//! From loosest to tightest:
//! 1. Assignment (`=`, `+=`, ...) - right associative
//! 2. Logical OR (`||`)
//! 3. Logical AND (`&&`)
//! 4. Comparison (`<`, `==`, `===`, ...)
//! 5. Bitwise OR (`|`)
//! 6. Bitwise XOR (`^`)
//! 7. Bitwise AND (`&`)
//! 8. Shift (`<<`, `>>`)
//! 9. Additive (`+`, `-`)
//! 10. Multiplicative (`*`, `/`, `%`)
//! 11. Prefix unary (`!`, `+`, `-`, `~`)
//! 12. Postfix (call, member access)

use glang_core::Span;

use crate::ast::{AccessKind, AssignOp, BinaryOp, Ident, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Identifier reference
    Ident(Ident<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Unary prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Assignment
    Assign(&'ast AssignExpr<'ast>),
    /// Call
    Call(&'ast CallExpr<'ast>),
    /// Member access
    Access(&'ast AccessExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Call(e) => e.span,
            Self::Access(e) => e.span,
        }
    }

    /// Whether this expression may appear on the left of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Ident(_) | Self::Access(_))
    }

    /// Short human readable name of the node kind.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Literal(lit) => match lit.kind {
                LiteralKind::Bool(_) => "Boolean literal",
                LiteralKind::Null => "Null literal",
                LiteralKind::String(_) => "String literal",
                LiteralKind::Number(_) => "Number literal",
            },
            Self::Ident(_) => "Identifier",
            Self::Binary(_) => "Binary expression",
            Self::Unary(_) => "Unary expression",
            Self::Assign(_) => "Assignment",
            Self::Call(_) => "Call",
            Self::Access(_) => "Member access",
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    /// The literal kind
    pub kind: LiteralKind<'ast>,
    /// Source location
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Bool(bool),
    Null,
    /// Unescaped string contents
    String(&'ast str),
    Number(NumberLiteral<'ast>),
}

/// A numeric literal in one of its four representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral<'ast> {
    Int(i32),
    Long(i64),
    Double(f64),
    /// Decimal digits of an arbitrary precision integer, optionally signed
    BigInt(&'ast str),
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: Expr<'ast>,
    pub op: BinaryOp,
    pub right: Expr<'ast>,
    pub span: Span,
}

/// A unary prefix operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: Expr<'ast>,
    pub span: Span,
}

/// An assignment. The parser guarantees `target` is assignable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: Expr<'ast>,
    pub op: AssignOp,
    pub value: Expr<'ast>,
    pub span: Span,
}

/// A call expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Expr<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// A member access: `object.member`, `object.!member`, `object::member`, `object::!member`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessExpr<'ast> {
    pub object: Expr<'ast>,
    pub member: Ident<'ast>,
    pub kind: AccessKind,
    pub span: Span,
}
