//! Core types shared by the stencil toolchain.
//!
//! - [`Span`] and the per-phase error types ([`LexError`], [`ParseError`],
//!   [`CompilationError`], [`RuntimeError`])
//! - [`Diagnostics`], the structured output of a failed compilation
//! - [`Model`], [`ModelShape`] and [`FieldValue`], the host side of a template's data
//! - [`Value`], what compiled code computes with
//! - [`TypeHash`] and [`QualifiedName`] for type identity

mod diagnostics;
mod error;
mod model;
mod qualified_name;
mod span;
mod type_hash;
mod value;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CompilationError, LexError, ParseError, ParseErrorKind, ParseErrors, RuntimeError};
pub use model::{FieldKind, FieldShape, FieldValue, Model, ModelShape};
pub use qualified_name::{QualifiedName, normalize_type_name};
pub use span::Span;
pub use type_hash::TypeHash;
pub use value::Value;
