//! Statement AST nodes for glang.

use glang_core::Span;

use crate::ast::Ident;
use crate::ast::expr::Expr;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Expression evaluated for its side effects
    Expr(ExprStmt<'ast>),
    /// `{ ... }`
    Block(Block<'ast>),
    /// `var name = init`
    VarDecl(VarDeclStmt<'ast>),
    /// `import a.b.c` or `import a.b.*`
    Import(ImportStmt<'ast>),
    /// `if cond body else body`
    If(&'ast IfStmt<'ast>),
    /// `while cond body else body`
    While(&'ast WhileStmt<'ast>),
    Break(BreakStmt),
    Continue(ContinueStmt),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::VarDecl(s) => s.span,
            Stmt::Import(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Break(s) => s.span,
            Stmt::Continue(s) => s.span,
        }
    }

    /// Declarations and imports have no well-defined scope as a bare
    /// conditional or loop body.
    pub fn is_blocked_body(&self) -> bool {
        matches!(self, Stmt::VarDecl(_) | Stmt::Import(_))
    }
}

/// An expression statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: Expr<'ast>,
    pub span: Span,
}

/// A block of statements with its own scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// A local or global variable declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclStmt<'ast> {
    pub name: Ident<'ast>,
    /// Missing initializers bind null
    pub init: Option<Expr<'ast>>,
    pub span: Span,
}

/// An import statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportStmt<'ast> {
    /// Every segment before the last one
    pub path: &'ast [Ident<'ast>],
    /// The last segment, `None` for a star import
    pub target: Option<Ident<'ast>>,
    pub span: Span,
}

impl ImportStmt<'_> {
    pub fn is_star(&self) -> bool {
        self.target.is_none()
    }
}

/// An if statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: Expr<'ast>,
    pub then_stmt: Stmt<'ast>,
    pub else_stmt: Option<Stmt<'ast>>,
    pub span: Span,
}

/// A while loop. The else branch runs when the condition turns false,
/// not when the loop is left with `break`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub condition: Expr<'ast>,
    pub body: Stmt<'ast>,
    pub else_stmt: Option<Stmt<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinueStmt {
    pub span: Span,
}
