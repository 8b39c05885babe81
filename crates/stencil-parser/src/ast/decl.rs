//! Declaration AST nodes.
//!
//! A unit is a fixed nesting of declarations:
//! - an optional edition header (`#![edition = 1]`)
//! - `use` directives naming namespaces from the reference set
//! - modules, each holding types, each holding functions

use std::fmt;

use stencil_core::Span;

use crate::ast::stmt::Block;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    #[inline]
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A `::`-separated path such as `std` or `app::models::Order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path<'ast> {
    pub segments: &'ast [Ident<'ast>],
    pub span: Span,
}

impl<'ast> Path<'ast> {
    /// The last segment.
    pub fn last(&self) -> Option<&Ident<'ast>> {
        self.segments.last()
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            f.write_str(segment.name)?;
        }
        Ok(())
    }
}

/// A type reference: a path with optional type arguments.
///
/// `Display` produces the canonical spelling (`a::B<c::D,e::F>`), which is
/// what the type registry keys model shapes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef<'ast> {
    pub path: Path<'ast>,
    pub args: &'ast [TypeRef<'ast>],
    pub span: Span,
}

impl fmt::Display for TypeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// `#![edition = N]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditionHeader {
    pub version: u32,
    pub span: Span,
}

/// `use path;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseDecl<'ast> {
    pub path: Path<'ast>,
    pub span: Span,
}

/// `module Name { type ... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleDecl<'ast> {
    pub name: Ident<'ast>,
    pub types: &'ast [TypeDecl<'ast>],
    pub span: Span,
}

/// `type Name { fn ... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeDecl<'ast> {
    pub name: Ident<'ast>,
    pub functions: &'ast [FunctionDecl<'ast>],
    pub span: Span,
}

/// A function declaration.
///
/// Example: `fn Interpolate(model: app::Order) -> string { return $"..."; }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub return_type: TypeRef<'ast>,
    pub body: Block<'ast>,
    pub span: Span,
}

/// `name: type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeRef<'ast>,
    pub span: Span,
}
