//! Invoker: finds a template's entry point in a loaded module and calls it.
//!
//! Lookup failures ([`TypeNotFound`](InvocationError::TypeNotFound),
//! [`EntryPointNotFound`](InvocationError::EntryPointNotFound)) and a wrong
//! result type mean the plumbing is broken. Only
//! [`InvocationFailed`](InvocationError::InvocationFailed) comes from the
//! template's own code.

use stencil_compiler::LoadedModule;
use stencil_core::{Model, Value};

use crate::error::InvocationError;
use crate::synth::{self, ENTRY_POINT};

/// Calls the entry point of compiled templates.
#[derive(Debug, Clone)]
pub struct Invoker {
    entry_point: String,
}

impl Invoker {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Render `model` with the template compiled for `template_id`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke<L>(&self, module: &L, template_id: &str, model: &dyn Model) -> Result<String, InvocationError>
    where
        L: LoadedModule + ?Sized,
    {
        let type_name = synth::generated_type_path(template_id).map_err(|_| InvocationError::TypeNotFound {
            type_name: template_id.to_string(),
        })?;
        self.invoke_type(module, &type_name, model)
    }

    /// Render `model` through the entry point of an already known type.
    pub fn invoke_type<L>(&self, module: &L, type_name: &str, model: &dyn Model) -> Result<String, InvocationError>
    where
        L: LoadedModule + ?Sized,
    {
        let ty = module
            .resolve_type(type_name)
            .ok_or_else(|| InvocationError::TypeNotFound {
                type_name: type_name.to_string(),
            })?;
        let entry = ty
            .entry_point(&self.entry_point)
            .ok_or_else(|| InvocationError::EntryPointNotFound {
                type_name: type_name.to_string(),
                entry_point: self.entry_point.clone(),
            })?;

        match entry.call(&[Value::Object(model)]) {
            Ok(Value::Str(text)) => Ok(text.into_owned()),
            Ok(other) => Err(InvocationError::UnexpectedResultType {
                found: other.type_name().to_string(),
            }),
            Err(error) => Err(InvocationError::InvocationFailed(error)),
        }
    }
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new(ENTRY_POINT)
    }
}

#[cfg(test)]
mod tests {
    use stencil_compiler::{CompileOptions, Compiler, TypeRegistry};
    use stencil_core::{FieldKind, FieldShape, ModelShape, RuntimeError};

    use super::*;

    struct Counter {
        count: i64,
    }

    impl Model for Counter {
        fn shape() -> ModelShape {
            ModelShape::new("app::Counter", vec![FieldShape::new("Count", FieldKind::Int)])
        }
        fn type_name(&self) -> &'static str {
            "app::Counter"
        }
        fn field(&self, index: usize) -> Option<Value<'_>> {
            (index == 0).then_some(Value::Int(self.count))
        }
    }

    fn artifact(body: &str) -> stencil_compiler::Artifact {
        let mut registry = TypeRegistry::new();
        registry.register_model::<Counter>().unwrap();
        let source = format!(
            "module Stencil_t {{ type Stencil_tTemplateGenerator {{ {body} }} }}"
        );
        Compiler::new(&registry, CompileOptions::default())
            .compile(&source)
            .unwrap()
    }

    #[test]
    fn renders_through_the_entry_point() {
        let module = artifact(
            "fn Interpolate(model: app::Counter) -> string { return $\"n={model.Count}\"; }",
        );
        let rendered = Invoker::default().invoke(&module, "t", &Counter { count: 3 });
        assert_eq!(rendered.unwrap(), "n=3");
    }

    #[test]
    fn each_failure_has_its_own_kind() {
        let model = Counter { count: i64::MAX };
        let invoker = Invoker::default();

        let module = artifact("fn Other(model: app::Counter) -> string { return \"\"; }");
        assert!(matches!(
            invoker.invoke(&module, "missing", &model),
            Err(InvocationError::TypeNotFound { .. })
        ));
        assert!(matches!(
            invoker.invoke(&module, "t", &model),
            Err(InvocationError::EntryPointNotFound { .. })
        ));

        let module = artifact("fn Interpolate(model: app::Counter) -> int { return model.Count; }");
        assert_eq!(
            invoker.invoke(&module, "t", &model),
            Err(InvocationError::UnexpectedResultType {
                found: "int".into()
            })
        );

        let module = artifact(
            "fn Interpolate(model: app::Counter) -> string { return $\"{model.Count + 1}\"; }",
        );
        assert!(matches!(
            invoker.invoke(&module, "t", &model),
            Err(InvocationError::InvocationFailed(RuntimeError::IntegerOverflow { .. }))
        ));
    }
}
