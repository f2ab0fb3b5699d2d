//! Abstract Syntax Tree (AST) for glang.
//!
//! This module provides:
//! - AST node definitions for statements and expressions
//! - The parser transforming tokens into the AST
//!
//! All nodes are allocated in a [`bumpalo::Bump`] arena and borrow from it.

pub mod expr;
pub mod ops;
pub mod stmt;

mod expr_parser;
mod parser;
mod stmt_parser;

pub use glang_core::{ParseError, ParseErrorKind, ParseErrors};

pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;

use glang_core::Span;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// A parsed source unit: its top-level statements.
#[derive(Debug)]
pub struct Script<'ast> {
    statements: &'ast [Stmt<'ast>],
    span: Span,
}

impl<'ast> Script<'ast> {
    pub(crate) fn new(statements: &'ast [Stmt<'ast>], span: Span) -> Self {
        Self { statements, span }
    }

    /// Get the top-level statements of this script.
    pub fn statements(&self) -> &'ast [Stmt<'ast>] {
        self.statements
    }

    /// Get the source location span of this script.
    pub fn span(&self) -> Span {
        self.span
    }
}
