//! Toolchain adapter: compiles a synthesized unit into a loaded artifact.

use std::time::Instant;

use stencil_compiler::{Artifact, CompileOptions, Compiler, TypeRegistry};
use stencil_core::{Diagnostic, Diagnostics, Span};

use crate::synth::SynthesizedUnit;

/// Turns unit source into a loaded artifact, or the full set of diagnostics.
pub trait Toolchain: Send + Sync {
    fn compile(&self, unit: &SynthesizedUnit) -> Result<Artifact, Diagnostics>;
}

/// The in-process toolchain.
///
/// Each unit is compiled against a fresh reference set: the `std`
/// namespace, any configured namespaces, and the unit's model type with its
/// nested models.
#[derive(Debug, Clone, Default)]
pub struct NativeToolchain {
    options: CompileOptions,
    namespaces: Vec<String>,
}

impl NativeToolchain {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            namespaces: Vec::new(),
        }
    }

    /// Make namespaces available to `use` even when no model type lives in them.
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces.extend(namespaces.into_iter().map(Into::into));
        self
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    fn registry(&self, unit: &SynthesizedUnit) -> Result<TypeRegistry, Diagnostics> {
        let mut registry = TypeRegistry::new();
        for namespace in &self.namespaces {
            registry.add_namespace(namespace.clone());
        }
        registry.register(&unit.model).map_err(|error| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(Diagnostic::error(Span::default(), error.to_string()));
            diagnostics
        })?;
        Ok(registry)
    }
}

impl Toolchain for NativeToolchain {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn compile(&self, unit: &SynthesizedUnit) -> Result<Artifact, Diagnostics> {
        let started = Instant::now();
        tracing::debug!(
            template_id = %unit.template_id,
            module = %unit.module_name,
            "compiling template"
        );

        let registry = self.registry(unit)?;
        let result = Compiler::new(&registry, self.options).compile(&unit.source);

        match &result {
            Ok(artifact) => tracing::info!(
                template_id = %unit.template_id,
                elapsed_us = started.elapsed().as_micros() as u64,
                warnings = artifact.warnings().len(),
                "template compiled"
            ),
            Err(diagnostics) => tracing::warn!(
                template_id = %unit.template_id,
                errors = diagnostics.error_count(),
                "template failed to compile"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use stencil_compiler::LoadedModule;
    use stencil_core::{FieldKind, FieldShape, ModelShape};

    use super::*;
    use crate::synth::{CodeSynthesizer, ENTRY_POINT};

    fn shape() -> ModelShape {
        ModelShape::new("app::Person", vec![FieldShape::new("Name", FieldKind::Str)])
    }

    #[test]
    fn compiles_a_synthesized_unit() {
        let unit = CodeSynthesizer::default()
            .synthesize("hello", "hi {model.Name}", &shape(), &[])
            .unwrap();
        let artifact = NativeToolchain::default().compile(&unit).unwrap();
        let ty = artifact.resolve_type(&unit.qualified_type_name()).unwrap();
        assert!(ty.entry_point(ENTRY_POINT).is_some());
    }

    #[test]
    fn unknown_namespaces_fail_unless_configured() {
        let unit = CodeSynthesizer::default()
            .synthesize("hello", "hi", &shape(), &["extras"])
            .unwrap();
        let diagnostics = NativeToolchain::default().compile(&unit).unwrap_err();
        assert!(diagnostics.to_string().contains("unknown namespace 'extras'"));

        let toolchain = NativeToolchain::default().with_namespaces(["extras"]);
        assert!(toolchain.compile(&unit).is_ok());
    }

    #[test]
    fn bad_placeholders_are_reported() {
        let unit = CodeSynthesizer::default()
            .synthesize("bad", "{model.Nmae}", &shape(), &[])
            .unwrap();
        let diagnostics = NativeToolchain::default().compile(&unit).unwrap_err();
        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.to_string().contains("has no field 'Nmae'"));
    }
}
