//! Compiler options.

use std::fmt;

/// Optimization level for emitted bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptLevel {
    /// Emit every expression as written.
    Debug,
    /// Fold constant expressions and merge literal interpolation segments.
    #[default]
    Release,
}

/// Language edition a unit is compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageVersion {
    #[default]
    V1,
}

impl LanguageVersion {
    /// The number a unit's `#![edition = N]` header carries.
    pub fn number(self) -> u32 {
        match self {
            LanguageVersion::V1 => 1,
        }
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edition {}", self.number())
    }
}

/// Options fixed for one compilation.
///
/// The default is what templates are compiled with: overflow checks on,
/// release optimization, edition 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    /// Raise `IntegerOverflow` instead of wrapping.
    pub overflow_checks: bool,
    pub optimization: OptLevel,
    pub language_version: LanguageVersion,
}

impl CompileOptions {
    pub fn debug() -> Self {
        Self {
            optimization: OptLevel::Debug,
            ..Self::default()
        }
    }

    pub fn with_overflow_checks(mut self, enabled: bool) -> Self {
        self.overflow_checks = enabled;
        self
    }

    pub fn with_optimization(mut self, level: OptLevel) -> Self {
        self.optimization = level;
        self
    }

    pub fn folds_constants(&self) -> bool {
        self.optimization == OptLevel::Release
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            overflow_checks: true,
            optimization: OptLevel::Release,
            language_version: LanguageVersion::V1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_pinned() {
        let options = CompileOptions::default();
        assert!(options.overflow_checks);
        assert!(options.folds_constants());
        assert_eq!(options.language_version.number(), 1);
    }

    #[test]
    fn debug_keeps_checks() {
        let options = CompileOptions::debug();
        assert!(options.overflow_checks);
        assert!(!options.folds_constants());
        assert!(!options.with_overflow_checks(false).overflow_checks);
    }
}
