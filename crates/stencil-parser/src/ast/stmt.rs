//! Statement AST nodes.

use stencil_core::Span;

use crate::ast::Ident;
use crate::ast::expr::Expr;

/// A block of statements: `{ stmt* }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

impl Block<'_> {
    /// Whether the block contains a `return`. Statements after the first
    /// one never run.
    pub fn returns(&self) -> bool {
        self.stmts.iter().any(|stmt| matches!(stmt, Stmt::Return(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `let name = expr;`
    Let(LetStmt<'ast>),
    /// `return expr;`
    Return(ReturnStmt<'ast>),
}

impl Stmt<'_> {
    pub fn span(&self) -> Span {
        match self {
            Self::Let(s) => s.span,
            Self::Return(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetStmt<'ast> {
    pub name: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}
