//! Compilation context shared by both passes.

use stencil_core::{CompilationError, Diagnostic, Diagnostics, Span};
use stencil_parser::ast::TypeRef;

use crate::options::CompileOptions;
use crate::registry::TypeRegistry;
use crate::types::Ty;

/// Everything a unit is compiled against, plus the diagnostics collected so far.
pub struct CompilationContext<'reg> {
    registry: &'reg TypeRegistry,
    options: CompileOptions,
    /// Namespaces the unit's `use` declarations brought in.
    uses: Vec<String>,
    diagnostics: Diagnostics,
}

impl<'reg> CompilationContext<'reg> {
    pub fn new(registry: &'reg TypeRegistry, options: CompileOptions) -> Self {
        Self {
            registry,
            options,
            uses: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn registry(&self) -> &'reg TypeRegistry {
        self.registry
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn add_use(&mut self, namespace: String) {
        if !self.uses.contains(&namespace) {
            self.uses.push(namespace);
        }
    }

    /// Resolve a type as written in a signature.
    pub fn resolve_type(&self, ty: &TypeRef<'_>) -> Result<Ty, CompilationError> {
        if ty.path.is_simple() && ty.args.is_empty() {
            if let Some(builtin) = ty.path.last().and_then(|id| Ty::builtin(id.name)) {
                return Ok(builtin);
            }
        }
        let name = ty.to_string();
        self.registry
            .resolve(&name, &self.uses)
            .map(Ty::model)
            .ok_or(CompilationError::UnknownType { name, span: ty.span })
    }

    pub fn type_name(&self, ty: Ty) -> String {
        ty.display(self.registry)
    }

    pub fn error(&mut self, error: CompilationError) {
        self.diagnostics.push(error);
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(span, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}
