//! Expression AST nodes.
//!
//! # Expression Precedence
//!
//! The parser uses Pratt parsing with the following precedence levels,
//! lowest first:
//! 1. Ternary (`?:`) - right associative
//! 2. Null coalescing (`??`)
//! 3. Equality (`==`, `!=`)
//! 4. Additive (`+`, `-`)
//! 5. Multiplicative (`*`)
//! 6. Prefix unary (`!`, `-`)
//! 7. Postfix (member access, method call)

use std::fmt;

use stencil_core::Span;

use crate::ast::{BinaryOp, Ident, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    Literal(LiteralExpr<'ast>),
    /// A local variable or parameter.
    Ident(Ident<'ast>),
    /// `expr.field`
    Member(&'ast MemberExpr<'ast>),
    /// `expr.method(args)`
    MethodCall(&'ast MethodCallExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Ternary(&'ast TernaryExpr<'ast>),
    /// `$"text {hole} text"`
    Interpolated(InterpolatedExpr<'ast>),
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Member(e) => e.span,
            Self::MethodCall(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Ternary(e) => e.span,
            Self::Interpolated(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr<'ast> {
        match self {
            Self::Paren(p) => p.expr.unparenthesized(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// String contents with escapes already resolved.
    String(&'ast str),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub member: Ident<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodCallExpr<'ast> {
    pub receiver: &'ast Expr<'ast>,
    pub method: Ident<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TernaryExpr<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_expr: &'ast Expr<'ast>,
    pub else_expr: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// An interpolated string split into literal text and holes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedExpr<'ast> {
    pub segments: &'ast [Segment<'ast>],
    pub span: Span,
}

impl InterpolatedExpr<'_> {
    pub fn has_holes(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Hole(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment<'ast> {
    /// Literal text, with escapes and doubled braces resolved.
    Text(&'ast str),
    Hole(Hole<'ast>),
}

/// `{expr}` or `{expr:FORMAT}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hole<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub format: Option<FormatSpec>,
    pub span: Span,
}

/// A format specifier applied to a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub kind: FormatKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// `F<n>`: fixed number of decimals (default 2).
    Fixed(u8),
    /// `D<n>`: integer zero-padded to at least `n` digits.
    Decimal(u8),
    /// `X<n>` / `x<n>`: hexadecimal, zero-padded to at least `n` digits.
    Hex { upper: bool, width: u8 },
    /// `U`
    Upper,
    /// `L`
    Lower,
}

impl FormatKind {
    /// Largest width or precision a specifier may request.
    pub const MAX_WIDTH: u8 = 32;

    /// Parse specifier text such as `F2` or `x8`.
    pub fn parse(text: &str) -> Option<FormatKind> {
        let mut chars = text.chars();
        let letter = chars.next()?;
        let digits = chars.as_str();
        let width = if digits.is_empty() {
            None
        } else if digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(digits.parse::<u8>().ok().filter(|w| *w <= Self::MAX_WIDTH)?)
        } else {
            return None;
        };

        match (letter, width) {
            ('F' | 'f', w) => Some(FormatKind::Fixed(w.unwrap_or(2))),
            ('D' | 'd', w) => Some(FormatKind::Decimal(w.unwrap_or(0))),
            ('X', w) => Some(FormatKind::Hex { upper: true, width: w.unwrap_or(0) }),
            ('x', w) => Some(FormatKind::Hex { upper: false, width: w.unwrap_or(0) }),
            ('U' | 'u', None) => Some(FormatKind::Upper),
            ('L' | 'l', None) => Some(FormatKind::Lower),
            _ => None,
        }
    }

    /// Whether the specifier formats numbers (as opposed to text).
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FormatKind::Upper | FormatKind::Lower)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Fixed(n) => write!(f, "F{n}"),
            FormatKind::Decimal(n) => write!(f, "D{n}"),
            FormatKind::Hex { upper: true, width } => write!(f, "X{width}"),
            FormatKind::Hex { upper: false, width } => write!(f, "x{width}"),
            FormatKind::Upper => f.write_str("U"),
            FormatKind::Lower => f.write_str("L"),
        }
    }
}
