//! Compiler passes.
//!
//! - [`registration`]: Pass 1 - check the header and declarations, resolve signatures
//! - [`compilation`]: Pass 2 - type check function bodies and generate bytecode

pub mod compilation;
pub mod registration;

pub use compilation::{CompilationOutput, CompilationPass};
pub use registration::{FunctionSignature, RegisteredType, RegistrationOutput, RegistrationPass};
