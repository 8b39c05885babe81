//! Lexer and parser for stencil units.
//!
//! A unit is the source text the template engine synthesizes for each
//! template: an edition header, `use` directives, and a module holding one
//! generator type with an `Interpolate` entry point. This crate turns that
//! text into an arena-allocated AST:
//! - Lexical analysis ([`Lexer`]), including whole-token interpolated strings
//! - AST definitions ([`ast`])
//! - [`Parser`], which also splits interpolation holes and format specifiers
//!
//! ```
//! use stencil_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! match Parser::parse("module M { }", &arena) {
//!     Ok(unit) => assert_eq!(unit.modules()[0].name.name, "M"),
//!     Err(errors) => panic!("{errors}"),
//! }
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{Parser, Unit};
pub use lexer::{Lexer, Token, TokenKind};
