//! The template engine: the one type callers render through.

use std::fmt;
use std::sync::Arc;

use stencil_compiler::Artifact;
use stencil_core::Model;

use crate::cache::ArtifactCache;
use crate::config::EngineOptions;
use crate::error::{RenderError, RenderResult};
use crate::invoke::Invoker;
use crate::source::TemplateSource;
use crate::synth::CodeSynthesizer;
use crate::toolchain::{NativeToolchain, Toolchain};

/// The cache a [`TemplateEngine`] keeps artifacts and failures in.
pub type TemplateCache = ArtifactCache<Arc<Artifact>, RenderError>;

/// Renders templates against models, compiling each template once.
///
/// On the first render of a template id the engine fetches its text,
/// synthesizes a unit for the model's type, compiles it, and caches the
/// outcome. Every render then calls the cached artifact. The cache is
/// shared through an `Arc`, so several engines can use one.
///
/// # Example
///
/// ```
/// use stencil::{MemorySource, Model, TemplateEngine};
///
/// #[derive(Model)]
/// #[stencil(name = "app::Person")]
/// struct Person {
///     #[stencil(rename = "Name")]
///     name: String,
///     #[stencil(rename = "Age")]
///     age: u32,
/// }
///
/// let source = MemorySource::new().with("greeting", "hello {model.Name}, age {model.Age}");
/// let engine = TemplateEngine::new(source);
/// let fred = Person { name: "Fred".into(), age: 35 };
///
/// assert_eq!(engine.render("greeting", &fred).unwrap(), "hello Fred, age 35");
/// ```
pub struct TemplateEngine<S, C = NativeToolchain> {
    source: S,
    toolchain: C,
    cache: Arc<TemplateCache>,
    synthesizer: CodeSynthesizer,
    invoker: Invoker,
}

impl<S: TemplateSource> TemplateEngine<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, EngineOptions::default())
    }

    pub fn with_options(source: S, options: EngineOptions) -> Self {
        let toolchain = NativeToolchain::new(options.compile_options())
            .with_namespaces(options.default_namespaces().iter().cloned());
        Self::with_toolchain(source, toolchain, options)
    }
}

impl<S: TemplateSource, C: Toolchain> TemplateEngine<S, C> {
    /// An engine compiling through a custom toolchain.
    pub fn with_toolchain(source: S, toolchain: C, options: EngineOptions) -> Self {
        let synthesizer = CodeSynthesizer::new(
            options.compile_options().language_version,
            options.default_namespaces().to_vec(),
        );
        Self {
            source,
            toolchain,
            cache: Arc::new(TemplateCache::new()),
            synthesizer,
            invoker: Invoker::new(options.entry_point()),
        }
    }

    /// Use `cache` instead of the engine's own.
    pub fn with_cache(mut self, cache: Arc<TemplateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn toolchain(&self) -> &C {
        &self.toolchain
    }

    /// Render template `template_id` against `model`.
    pub fn render<M: Model>(&self, template_id: &str, model: &M) -> RenderResult<String> {
        self.render_with_namespaces(template_id, model, &[])
    }

    /// Render with extra namespaces `use`d by the template's unit.
    ///
    /// The namespaces only matter on the call that compiles the template;
    /// later calls reuse the cached artifact.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn render_with_namespaces<M: Model>(
        &self,
        template_id: &str,
        model: &M,
        extra_namespaces: &[&str],
    ) -> RenderResult<String> {
        let artifact = self.cache.get_or_compile(template_id, || {
            self.build(template_id, M::shape(), extra_namespaces)
        })?;
        Ok(self.invoker.invoke(&*artifact, template_id, model)?)
    }

    /// Fetch, synthesize and compile one template.
    fn build(
        &self,
        template_id: &str,
        shape: stencil_core::ModelShape,
        extra_namespaces: &[&str],
    ) -> RenderResult<Arc<Artifact>> {
        let text = self
            .source
            .fetch(template_id)
            .ok_or_else(|| RenderError::TemplateSourceUnavailable {
                template_id: template_id.to_string(),
            })?;
        let unit = self
            .synthesizer
            .synthesize(template_id, &text, &shape, extra_namespaces)?;
        let artifact = self
            .toolchain
            .compile(&unit)
            .map_err(|diagnostics| RenderError::CompilationFailed {
                template_id: template_id.to_string(),
                diagnostics: Arc::new(diagnostics),
            })?;
        Ok(Arc::new(artifact))
    }
}

impl<S, C> fmt::Debug for TemplateEngine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("cache", &self.cache)
            .field("synthesizer", &self.synthesizer)
            .field("entry_point", &self.invoker.entry_point())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;
    use crate::cache::EntryState;

    #[derive(crate::Model)]
    #[stencil(name = "app::Item")]
    struct Item {
        #[stencil(rename = "Label")]
        label: String,
    }

    #[test]
    fn compiles_on_first_render_only() {
        let engine = TemplateEngine::new(MemorySource::new().with("item", "[{model.Label}]"));
        let item = Item { label: "a".into() };

        assert!(!engine.cache().contains("item"));
        assert_eq!(engine.render("item", &item).unwrap(), "[a]");
        assert_eq!(engine.cache().state("item"), Some(EntryState::Ready));

        engine.source().insert("item", "changed {model.Label}");
        assert_eq!(engine.render("item", &item).unwrap(), "[a]");
        engine.cache().invalidate("item");
        assert_eq!(engine.render("item", &item).unwrap(), "changed a");
    }

    #[test]
    fn engines_can_share_a_cache() {
        let first = TemplateEngine::new(MemorySource::new().with("t", "one"));
        let second =
            TemplateEngine::new(MemorySource::new().with("t", "two")).with_cache(Arc::clone(first.cache()));
        let item = Item { label: String::new() };

        assert_eq!(first.render("t", &item).unwrap(), "one");
        assert_eq!(second.render("t", &item).unwrap(), "one");
    }

    #[test]
    fn extra_namespaces_must_be_known() {
        let engine = TemplateEngine::new(MemorySource::new().with("t", "x"));
        let item = Item { label: String::new() };
        let error = engine
            .render_with_namespaces("t", &item, &["app", "nowhere"])
            .unwrap_err();
        let diagnostics = error.diagnostics().unwrap();
        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.to_string().contains("unknown namespace 'nowhere'"));
    }
}
