//! Source location tracking for diagnostics.
//!
//! Synthesized units are small and mostly single-line, so a [`Span`] only
//! records where a token starts and how many bytes it covers.

use std::fmt;

/// A location in a synthesized unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Column one past the last byte covered by this span.
    #[inline]
    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// Extend this span so it also covers `other`.
    ///
    /// Spans on different lines keep the start of `self` and sum lengths,
    /// which is enough for pointing diagnostics at the right place.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let col = self.col.min(other.col);
            let end = self.end_col().max(other.end_col());
            Span::new(self.line, col, end - col)
        } else {
            Span::new(self.line, self.col, self.len + other.len)
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}+{}", self.line, self.col, self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
