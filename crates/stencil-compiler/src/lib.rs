//! Stencil compiler and VM.
//!
//! Compiles a unit's source text into an [`Artifact`] that can be looked up
//! by name and called.
//!
//! ## Architecture
//!
//! - **Pass 1 (Registration)**: check the header, `use` directives and
//!   declarations, and resolve every function signature against the
//!   [`TypeRegistry`]
//! - **Pass 2 (Compilation)**: type check function bodies and generate bytecode
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, BytecodeChunk, ConstantPool)
//! - [`context`]: Compilation context with `use`-aware type resolution
//! - [`emit`]: High-level bytecode emitter
//! - [`expr`]: Expression compiler
//! - [`registry`]: The model types and namespaces a unit can reference
//! - [`scope`]: Local slots of one function
//!
//! # Example
//!
//! ```
//! use stencil_compiler::{CompileOptions, Compiler, LoadedModule, TypeRegistry};
//! use stencil_core::Value;
//!
//! let registry = TypeRegistry::new();
//! let source = r#"
//!     #![edition = 1]
//!     use std;
//!     module Greeting {
//!         type Generator {
//!             fn Interpolate(name: string) -> string {
//!                 return $"Hello {name.upper()}!";
//!             }
//!         }
//!     }
//! "#;
//!
//! let artifact = Compiler::new(&registry, CompileOptions::default())
//!     .compile(source)
//!     .unwrap();
//! let entry = artifact
//!     .resolve_type("Greeting::Generator")
//!     .and_then(|ty| ty.entry_point("Interpolate"))
//!     .unwrap();
//! let result = entry.call(&[Value::from("ada")]).unwrap();
//! assert_eq!(result.as_str(), Some("Hello ADA!"));
//! ```

pub mod bytecode;
pub mod context;
pub mod emit;
pub mod expr;
pub mod passes;
pub mod registry;
pub mod scope;

mod artifact;
mod eval;
mod fold;
mod function_compiler;
mod options;
mod types;
mod vm;

pub use artifact::{
    Artifact, CompiledFunction, CompiledType, EntryPoint, LoadedModule, TypeHandle, ValueType,
};
pub use context::CompilationContext;
pub use emit::{BytecodeEmitter, JumpLabel};
pub use expr::ExprCompiler;
pub use function_compiler::FunctionCompiler;
pub use options::{CompileOptions, LanguageVersion, OptLevel};
pub use passes::{CompilationPass, RegistrationPass};
pub use registry::{RegisteredShape, RegistryError, ShapeId, TypeRegistry};
pub use scope::{LocalScope, LocalVar};
pub use types::{Ty, TyKind};

// Re-export CompilationError from core for convenience
pub use stencil_core::{CompilationError, Diagnostics};

use bumpalo::Bump;
use stencil_parser::{Parser, Unit};

/// The compiler entry point: a registry to resolve types against and fixed options.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'reg> {
    registry: &'reg TypeRegistry,
    options: CompileOptions,
}

impl<'reg> Compiler<'reg> {
    pub fn new(registry: &'reg TypeRegistry, options: CompileOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Parse and compile a unit.
    ///
    /// On failure every lexer, parser or semantic error found is returned,
    /// not just the first. Warnings of a successful compilation stay on the
    /// artifact.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, source: &str) -> Result<Artifact, Diagnostics> {
        let arena = Bump::new();
        let unit = Parser::parse(source, &arena).map_err(|errors| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.extend(errors.into_vec());
            diagnostics
        })?;
        self.compile_unit(&unit)
    }

    /// Compile an already parsed unit.
    pub fn compile_unit(&self, unit: &Unit<'_>) -> Result<Artifact, Diagnostics> {
        let mut ctx = CompilationContext::new(self.registry, self.options);

        let registration = RegistrationPass::new(&mut ctx).run(unit);
        let output = CompilationPass::new(&mut ctx).run(registration);

        let diagnostics = ctx.into_diagnostics();
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        tracing::debug!(
            types = output.types.len(),
            functions = output.functions_compiled,
            constants = output.constants.len(),
            warnings = diagnostics.len(),
            "unit compiled"
        );
        Ok(Artifact::new(output.constants, output.types, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use stencil_core::{
        FieldKind, FieldShape, FieldValue, Model, ModelShape, RuntimeError, Severity, Value,
    };

    use super::*;

    struct Address {
        city: String,
    }

    impl Model for Address {
        fn shape() -> ModelShape {
            ModelShape::new("app::Address", vec![FieldShape::new("City", FieldKind::Str)])
        }
        fn type_name(&self) -> &'static str {
            "app::Address"
        }
        fn field(&self, index: usize) -> Option<Value<'_>> {
            match index {
                0 => Some(self.city.to_value()),
                _ => None,
            }
        }
    }

    struct Order {
        id: u64,
        total: f64,
        customer: Option<String>,
        ship_to: Address,
    }

    impl Model for Order {
        fn shape() -> ModelShape {
            ModelShape::new(
                "app::Order",
                vec![
                    FieldShape::new("Id", FieldKind::Int),
                    FieldShape::new("Total", FieldKind::Float),
                    FieldShape::new("Customer", FieldKind::Optional(Box::new(FieldKind::Str))),
                    FieldShape::new("ShipTo", FieldKind::Object(Address::shape)),
                ],
            )
        }
        fn type_name(&self) -> &'static str {
            "app::Order"
        }
        fn field(&self, index: usize) -> Option<Value<'_>> {
            match index {
                0 => Some(Value::from_unsigned(self.id)),
                1 => Some(Value::Float(self.total)),
                2 => Some(match &self.customer {
                    Some(name) => Value::Str(Cow::Borrowed(name)),
                    None => Value::Null,
                }),
                3 => Some(Value::Object(&self.ship_to)),
                _ => None,
            }
        }
    }

    fn order() -> Order {
        Order {
            id: 42,
            total: 9.5,
            customer: None,
            ship_to: Address {
                city: "Oslo".into(),
            },
        }
    }

    fn unit(body: &str) -> String {
        format!(
            "#![edition = 1]\nuse std;\nuse app;\nmodule M {{\n    type G {{\n        fn Interpolate(model: Order) -> string {{\n{body}\n        }}\n    }}\n}}\n"
        )
    }

    fn compile(source: &str, options: CompileOptions) -> Result<Artifact, Diagnostics> {
        let mut registry = TypeRegistry::new();
        registry.register_model::<Order>().unwrap();
        Compiler::new(&registry, options).compile(source)
    }

    fn render(source: &str, options: CompileOptions) -> Result<String, RuntimeError> {
        let artifact = compile(source, options).unwrap_or_else(|d| panic!("{d}"));
        let entry = artifact
            .resolve_type("M::G")
            .and_then(|ty| ty.entry_point("Interpolate"))
            .unwrap();
        let model = order();
        let value = entry.call(&[Value::Object(&model)])?;
        Ok(value.as_str().unwrap().to_string())
    }

    #[test]
    fn renders_the_same_in_debug_and_release() {
        let source = unit(
            r##"            let who = model.Customer ?? "guest";
            return $"#{model.Id:D5} for {who.upper()}: {model.Total:F2} to {model.ShipTo.City} ({1 + 2} items)";"##,
        );
        let expected = "#00042 for GUEST: 9.50 to Oslo (3 items)";
        assert_eq!(render(&source, CompileOptions::default()).unwrap(), expected);
        assert_eq!(render(&source, CompileOptions::debug()).unwrap(), expected);
    }

    #[test]
    fn collects_every_error() {
        let source = unit(
            r#"            let a = model.Nmae;
            let b = a.upper();
            return $"{model.Total:X4} {model.Missing}";"#,
        );
        let diagnostics = compile(&source, CompileOptions::default()).unwrap_err();
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "type 'app::Order' has no field 'Nmae'",
                "format specifier 'X4' cannot be applied to float",
            ]
        );
    }

    #[test]
    fn parse_errors_become_diagnostics() {
        let diagnostics = compile("module M { type G { fn F( -> string {} } }", CompileOptions::default())
            .unwrap_err();
        assert!(diagnostics.has_errors());
        assert!(diagnostics.to_string().starts_with("unit:1:"));
    }

    #[test]
    fn missing_return_is_an_error() {
        let source = unit("            let x = 1;");
        let diagnostics = compile(&source, CompileOptions::default()).unwrap_err();
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message == "function 'Interpolate' does not return a value")
        );
    }

    #[test]
    fn unreachable_code_is_a_warning() {
        let source = unit("            return \"a\";\n            return \"b\";");
        let artifact = compile(&source, CompileOptions::default()).unwrap();
        let warnings: Vec<_> = artifact.warnings().iter().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn overflow_is_reported_at_render_time() {
        let source = unit("            return $\"{model.Id * 9223372036854775807}\";");
        assert!(matches!(
            render(&source, CompileOptions::default()),
            Err(RuntimeError::IntegerOverflow { op: "*", .. })
        ));
        let unchecked = CompileOptions::default().with_overflow_checks(false);
        assert!(render(&source, unchecked).is_ok());
    }

    #[test]
    fn rejects_arguments_of_another_type() {
        let source = unit("            return \"\";");
        let artifact = compile(&source, CompileOptions::default()).unwrap();
        let entry = artifact
            .resolve_type("M::G")
            .and_then(|ty| ty.entry_point("Interpolate"))
            .unwrap();
        let address = Address { city: "x".into() };
        assert!(matches!(
            entry.call(&[Value::Object(&address)]),
            Err(RuntimeError::ArgumentMismatch { index: 0, .. })
        ));
        assert!(matches!(
            entry.call(&[]),
            Err(RuntimeError::ArgumentCount { expected: 1, actual: 0 })
        ));
    }
}
