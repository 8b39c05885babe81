//! Abstract syntax tree for units.
//!
//! All nodes are allocated in a [`bumpalo::Bump`] arena and borrow from it.
//!
//! # Example
//!
//! ```
//! use stencil_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     use std;
//!     module Stencil_hello {
//!         type Stencil_helloTemplateGenerator {
//!             fn Interpolate(model: app::Person) -> string {
//!                 return $"Hello {model.Name}";
//!             }
//!         }
//!     }
//! "#;
//!
//! let unit = Parser::parse(source, &arena).unwrap();
//! assert_eq!(unit.modules().len(), 1);
//! ```

pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;

mod decl_parser;
mod expr_parser;
mod parser;
mod stmt_parser;

pub use stencil_core::{ParseError, ParseErrorKind, ParseErrors, Span};

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;

/// A parsed unit.
#[derive(Debug, Clone, Copy)]
pub struct Unit<'ast> {
    edition: Option<EditionHeader>,
    uses: &'ast [UseDecl<'ast>],
    modules: &'ast [ModuleDecl<'ast>],
    span: Span,
}

impl<'ast> Unit<'ast> {
    pub(crate) fn new(
        edition: Option<EditionHeader>,
        uses: &'ast [UseDecl<'ast>],
        modules: &'ast [ModuleDecl<'ast>],
        span: Span,
    ) -> Self {
        Self {
            edition,
            uses,
            modules,
            span,
        }
    }

    /// The `#![edition = N]` header, if present.
    pub fn edition(&self) -> Option<&EditionHeader> {
        self.edition.as_ref()
    }

    pub fn uses(&self) -> &'ast [UseDecl<'ast>] {
        self.uses
    }

    pub fn modules(&self) -> &'ast [ModuleDecl<'ast>] {
        self.modules
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
