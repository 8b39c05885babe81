//! Where template text comes from.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Fetches raw template text by id.
///
/// Text is trusted: the engine escapes it for embedding but does not
/// validate it further.
pub trait TemplateSource: Send + Sync {
    /// The template's text, or `None` if the source has no such template.
    fn fetch(&self, template_id: &str) -> Option<String>;
}

impl<F> TemplateSource for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn fetch(&self, template_id: &str) -> Option<String> {
        self(template_id)
    }
}

/// An in-memory template store.
#[derive(Debug, Default)]
pub struct MemorySource {
    templates: RwLock<FxHashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, template_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(template_id, text);
        self
    }

    /// Add or replace a template. Templates already compiled keep their
    /// cached artifact until invalidated.
    pub fn insert(&self, template_id: impl Into<String>, text: impl Into<String>) {
        self.templates.write().insert(template_id.into(), text.into());
    }

    pub fn remove(&self, template_id: &str) -> Option<String> {
        self.templates.write().remove(template_id)
    }

    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }
}

impl TemplateSource for MemorySource {
    fn fetch(&self, template_id: &str) -> Option<String> {
        self.templates.read().get(template_id).cloned()
    }
}
