//! Local scope management for function compilation.
//!
//! Parameters take the first slots, `let` bindings follow in declaration
//! order. The unit language has no nested blocks, so one flat scope per
//! function is enough. Names can't be redeclared.

use rustc_hash::{FxHashMap, FxHashSet};
use stencil_core::{CompilationError, Span};

use crate::types::Ty;

/// Most locals (parameters included) a function may have.
pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

/// Information about a local variable.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub name: String,
    pub ty: Ty,
    pub slot: u8,
    /// Source location of the declaration.
    pub span: Span,
}

/// Local scope for a function being compiled.
#[derive(Debug, Default)]
pub struct LocalScope {
    variables: FxHashMap<String, LocalVar>,
    /// Names whose declaration failed to compile. Uses of them are not
    /// reported again.
    poisoned: FxHashSet<String>,
    next_slot: usize,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter or `let` binding and allocate its slot.
    pub fn declare(&mut self, name: &str, ty: Ty, span: Span) -> Result<u8, CompilationError> {
        if self.variables.contains_key(name) || self.poisoned.contains(name) {
            return Err(CompilationError::Duplicate {
                name: name.to_string(),
                span,
            });
        }
        let slot = u8::try_from(self.next_slot).map_err(|_| CompilationError::LimitExceeded {
            message: format!("more than {MAX_LOCALS} locals in one function"),
            span,
        })?;
        self.next_slot += 1;
        self.variables.insert(
            name.to_string(),
            LocalVar {
                name: name.to_string(),
                ty,
                slot,
                span,
            },
        );
        Ok(slot)
    }

    /// Record a binding whose initializer failed.
    pub fn poison(&mut self, name: &str) {
        if !self.variables.contains_key(name) {
            self.poisoned.insert(name.to_string());
        }
    }

    pub fn is_poisoned(&self, name: &str) -> bool {
        self.poisoned.contains(name)
    }

    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }

    /// Number of slots the function's frame needs.
    pub fn frame_size(&self) -> usize {
        self.next_slot
    }
}
