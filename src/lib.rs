//! Stencil: compile-once, render-many string templates over typed models.
//!
//! A template is text with `{expr}` placeholders evaluated against a model,
//! such as `hello {model.Name}, age {model.Age}`. The first render of a
//! template id turns the text into a small typed unit, compiles it to
//! bytecode (checking every placeholder against the model's shape) and
//! caches the artifact. Every render after that only runs the artifact.
//!
//! ## Pipeline
//!
//! ```text
//! TemplateEngine::render(id, &model)
//!   -> ArtifactCache::get_or_compile(id)          one build per id, even under contention
//!        -> TemplateSource::fetch(id)             raw text
//!        -> CodeSynthesizer::synthesize(..)       unit source
//!        -> Toolchain::compile(unit)              Artifact or Diagnostics
//!   -> Invoker::invoke(artifact, id, &model)      the rendered string
//! ```
//!
//! ## Crates
//!
//! - `stencil-core`: values, model shapes, errors and diagnostics
//! - `stencil-parser`: lexer and parser for units
//! - `stencil-compiler`: type checking, bytecode and the VM
//! - `stencil-macros`: `#[derive(Model)]`

extern crate self as stencil;

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod invoke;
pub mod source;
pub mod synth;
pub mod toolchain;

pub use cache::{ArtifactCache, CacheHandle, EntryState};
pub use config::EngineOptions;
pub use engine::{TemplateCache, TemplateEngine};
pub use error::{InvocationError, RenderError, RenderResult, SynthesisError};
pub use invoke::Invoker;
pub use source::{MemorySource, TemplateSource};
pub use synth::{CodeSynthesizer, ENTRY_POINT, SynthesizedUnit};
pub use toolchain::{NativeToolchain, Toolchain};

pub use stencil_compiler::{Artifact, CompileOptions, LanguageVersion, LoadedModule, OptLevel};
pub use stencil_core::{
    Diagnostic, Diagnostics, FieldKind, FieldShape, FieldValue, Model, ModelShape, RuntimeError,
    Severity, Value,
};
pub use stencil_macros::Model;
