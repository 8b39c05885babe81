//! Registration Pass (Pass 1) - check declarations and resolve signatures.
//!
//! This pass walks the unit's header and declarations without looking at
//! function bodies.
//!
//! ## Responsibilities
//!
//! - Check the `#![edition = N]` header against the pinned language version
//! - Check every `use` against the registry's namespaces
//! - Reject duplicate modules, types and functions
//! - Resolve parameter and return types
//!
//! Errors are recorded in the context and the pass carries on, so one
//! unknown type does not hide a duplicate function further down.

use rustc_hash::FxHashSet;
use stencil_core::{CompilationError, Span};
use stencil_parser::Unit;
use stencil_parser::ast::{FunctionDecl, ModuleDecl, TypeDecl, TypeRef, UseDecl};

use crate::artifact::ValueType;
use crate::context::CompilationContext;
use crate::types::Ty;

/// A function whose signature resolved.
#[derive(Debug)]
pub struct FunctionSignature<'ast> {
    pub decl: &'ast FunctionDecl<'ast>,
    pub params: Vec<(Ty, ValueType)>,
    pub return_type: (Ty, ValueType),
}

/// A declared type and its resolved functions.
#[derive(Debug)]
pub struct RegisteredType<'ast> {
    /// `module::Type`
    pub qualified_name: String,
    pub functions: Vec<FunctionSignature<'ast>>,
}

/// Output of the registration pass.
#[derive(Debug, Default)]
pub struct RegistrationOutput<'ast> {
    pub types: Vec<RegisteredType<'ast>>,
    /// Number of functions whose signatures resolved.
    pub functions_registered: usize,
}

/// Pass 1: check declarations and resolve every function signature.
pub struct RegistrationPass<'a, 'reg> {
    ctx: &'a mut CompilationContext<'reg>,
}

impl<'a, 'reg> RegistrationPass<'a, 'reg> {
    pub fn new(ctx: &'a mut CompilationContext<'reg>) -> Self {
        Self { ctx }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run<'ast>(mut self, unit: &Unit<'ast>) -> RegistrationOutput<'ast> {
        self.check_edition(unit);
        for use_decl in unit.uses() {
            self.visit_use(use_decl);
        }

        let mut output = RegistrationOutput::default();
        let mut modules = FxHashSet::default();
        for module in unit.modules() {
            if !modules.insert(module.name.name) {
                self.duplicate(module.name.name, module.name.span);
                continue;
            }
            self.visit_module(module, &mut output);
        }
        output
    }

    fn check_edition(&mut self, unit: &Unit<'_>) {
        let Some(header) = unit.edition() else {
            return;
        };
        let expected = self.ctx.options().language_version.number();
        if header.version != expected {
            self.ctx.error(CompilationError::EditionMismatch {
                expected,
                found: header.version,
                span: header.span,
            });
        }
    }

    fn visit_use(&mut self, use_decl: &UseDecl<'_>) {
        let name = use_decl.path.to_string();
        if self.ctx.registry().has_namespace(&name) {
            self.ctx.add_use(name);
        } else {
            self.ctx.error(CompilationError::UnknownNamespace {
                name,
                span: use_decl.path.span,
            });
        }
    }

    fn visit_module<'ast>(&mut self, module: &'ast ModuleDecl<'ast>, output: &mut RegistrationOutput<'ast>) {
        let mut types = FxHashSet::default();
        for ty in module.types {
            if !types.insert(ty.name.name) {
                self.duplicate(ty.name.name, ty.name.span);
                continue;
            }
            let registered = self.visit_type(module, ty);
            output.functions_registered += registered.functions.len();
            output.types.push(registered);
        }
    }

    fn visit_type<'ast>(&mut self, module: &ModuleDecl<'ast>, ty: &'ast TypeDecl<'ast>) -> RegisteredType<'ast> {
        let mut names = FxHashSet::default();
        let mut functions = Vec::with_capacity(ty.functions.len());
        for decl in ty.functions {
            if !names.insert(decl.name.name) {
                self.duplicate(decl.name.name, decl.name.span);
                continue;
            }
            if let Some(signature) = self.resolve_signature(decl) {
                functions.push(signature);
            }
        }
        RegisteredType {
            qualified_name: format!("{}::{}", module.name.name, ty.name.name),
            functions,
        }
    }

    fn resolve_signature<'ast>(&mut self, decl: &'ast FunctionDecl<'ast>) -> Option<FunctionSignature<'ast>> {
        let params: Vec<_> = decl.params.iter().map(|param| self.resolve(&param.ty)).collect();
        let return_type = self.resolve(&decl.return_type);

        Some(FunctionSignature {
            decl,
            params: params.into_iter().collect::<Option<_>>()?,
            return_type: return_type?,
        })
    }

    /// Resolve a declared type, recording an error if it is unknown.
    fn resolve(&mut self, typeref: &TypeRef<'_>) -> Option<(Ty, ValueType)> {
        let ty = match self.ctx.resolve_type(typeref) {
            Ok(ty) => ty,
            Err(error) => {
                self.ctx.error(error);
                return None;
            }
        };
        match ty.value_type(self.ctx.registry()) {
            Some(value_type) => Some((ty, value_type)),
            None => {
                self.ctx.error(CompilationError::InvalidOperation {
                    message: format!("type '{typeref}' cannot be declared"),
                    span: typeref.span,
                });
                None
            }
        }
    }

    fn duplicate(&mut self, name: &str, span: Span) {
        self.ctx.error(CompilationError::Duplicate {
            name: name.to_string(),
            span,
        });
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use stencil_core::{FieldKind, FieldShape, ModelShape};
    use stencil_parser::Parser;

    use super::*;
    use crate::options::CompileOptions;
    use crate::registry::TypeRegistry;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register(&ModelShape::new(
                "app::Person",
                vec![FieldShape::new("Name", FieldKind::Str)],
            ))
            .unwrap();
        registry
    }

    fn errors(source: &str) -> (usize, Vec<String>) {
        let registry = registry();
        let arena = Bump::new();
        let unit = Parser::parse(source, &arena).unwrap();
        let mut ctx = CompilationContext::new(&registry, CompileOptions::default());
        let output = RegistrationPass::new(&mut ctx).run(&unit);
        let messages = ctx.into_diagnostics().iter().map(|d| d.message.clone()).collect();
        (output.functions_registered, messages)
    }

    #[test]
    fn resolves_model_types_through_uses() {
        let (registered, messages) = errors(
            "#![edition = 1] use std; use app; module M { type T { fn F(model: Person) -> string { return \"\"; } } }",
        );
        assert_eq!(registered, 1);
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn reports_edition_and_namespace_errors() {
        let (_, messages) = errors("#![edition = 2] use nowhere; module M { }");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("edition 2"));
        assert!(messages[1].contains("unknown namespace 'nowhere'"));
    }

    #[test]
    fn reports_duplicates_and_unknown_types() {
        let (registered, messages) = errors(
            "module M { type T { fn F() -> string { return \"\"; } fn F() -> string { return \"\"; } } type T { } }
             module M { }
             module N { type T { fn G(x: app::Nobody) -> string { return \"\"; } } }",
        );
        assert_eq!(registered, 1);
        assert_eq!(
            messages,
            vec![
                "duplicate definition of 'F'",
                "duplicate definition of 'T'",
                "duplicate definition of 'M'",
                "unknown type 'app::Nobody'",
            ]
        );
    }
}
