//! Engine configuration.

use stencil_compiler::CompileOptions;

use crate::synth::ENTRY_POINT;

/// Options for a [`TemplateEngine`](crate::TemplateEngine).
///
/// # Example
///
/// ```
/// use stencil::{CompileOptions, EngineOptions};
///
/// let options = EngineOptions::default()
///     .with_compile_options(CompileOptions::debug())
///     .with_namespace("app::models");
/// assert_eq!(options.default_namespaces(), ["std", "app::models"]);
/// assert_eq!(options.entry_point(), "Interpolate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    compile: CompileOptions,
    default_namespaces: Vec<String>,
}

impl EngineOptions {
    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile = options;
        self
    }

    /// Add a namespace every template `use`s.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !self.default_namespaces.contains(&namespace) {
            self.default_namespaces.push(namespace);
        }
        self
    }

    pub fn compile_options(&self) -> CompileOptions {
        self.compile
    }

    pub fn default_namespaces(&self) -> &[String] {
        &self.default_namespaces
    }

    /// Name of the generated function templates are rendered through.
    pub fn entry_point(&self) -> &'static str {
        ENTRY_POINT
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            compile: CompileOptions::default(),
            default_namespaces: vec!["std".to_string()],
        }
    }
}
