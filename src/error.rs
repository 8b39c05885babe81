//! Error types of the template engine.
//!
//! Every failure a render can hit is a variant of [`RenderError`]. It is
//! `Clone` because a failed compilation is cached and handed to every caller
//! that asks for the same template afterwards.

use std::sync::Arc;

use stencil_core::{Diagnostics, RuntimeError};
use thiserror::Error;

/// The synthesizer could not produce a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("template id is empty")]
    EmptyTemplateId,

    #[error("type '{host_name}' cannot be named in a template unit")]
    InvalidModelShape { host_name: String },
}

/// Looking up or calling the entry point of a compiled template failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("compiled template has no type '{type_name}'")]
    TypeNotFound { type_name: String },

    #[error("type '{type_name}' has no entry point '{entry_point}'")]
    EntryPointNotFound {
        type_name: String,
        entry_point: String,
    },

    /// The template itself failed while rendering.
    #[error("template raised an error: {0}")]
    InvocationFailed(#[source] RuntimeError),

    #[error("entry point returned {found}, expected string")]
    UnexpectedResultType { found: String },
}

impl InvocationError {
    /// Whether the error came from the template's own code rather than from
    /// looking it up.
    pub fn is_render_failure(&self) -> bool {
        matches!(self, InvocationError::InvocationFailed(_))
    }
}

/// Any failure of [`TemplateEngine::render`](crate::TemplateEngine::render).
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("template '{template_id}' is not available from the template source")]
    TemplateSourceUnavailable { template_id: String },

    #[error("type '{host_name}' cannot be used as a template model")]
    InvalidModelShape { host_name: String },

    #[error("synthesis failed: {0}")]
    Synthesis(SynthesisError),

    #[error("template '{template_id}' failed to compile:\n{diagnostics}")]
    CompilationFailed {
        template_id: String,
        diagnostics: Arc<Diagnostics>,
    },

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl RenderError {
    /// The compiler's diagnostics, for a template that failed to compile.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            RenderError::CompilationFailed { diagnostics, .. } => Some(&**diagnostics),
            _ => None,
        }
    }
}

impl From<SynthesisError> for RenderError {
    fn from(error: SynthesisError) -> Self {
        match error {
            SynthesisError::InvalidModelShape { host_name } => {
                RenderError::InvalidModelShape { host_name }
            }
            other => RenderError::Synthesis(other),
        }
    }
}

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_shapes_surface_as_their_own_kind() {
        let error: RenderError = SynthesisError::InvalidModelShape {
            host_name: "&str".into(),
        }
        .into();
        assert!(matches!(error, RenderError::InvalidModelShape { .. }));

        let error: RenderError = SynthesisError::EmptyTemplateId.into();
        assert!(matches!(error, RenderError::Synthesis(_)));
    }

    #[test]
    fn render_failures_are_told_apart_from_lookup_failures() {
        let failed = InvocationError::InvocationFailed(RuntimeError::StackUnderflow);
        let missing = InvocationError::TypeNotFound {
            type_name: "M::T".into(),
        };
        assert!(failed.is_render_failure());
        assert!(!missing.is_render_failure());
    }

    #[test]
    fn errors_are_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<RenderError>();
    }
}
