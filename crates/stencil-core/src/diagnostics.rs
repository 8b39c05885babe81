//! Compiler diagnostics.
//!
//! A failed compilation hands back the full [`Diagnostics`] set rather than a
//! single error, so a caller can log exactly which placeholder or declaration
//! was rejected.

use std::fmt;

use crate::{CompilationError, LexError, ParseError, Span};

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single message produced while compiling a unit.
///
/// Displays as `unit:LINE:COL: error: MESSAGE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unit:{}:{}: {}: {}",
            self.span.line, self.span.col, self.severity, self.message
        )
    }
}

impl From<LexError> for Diagnostic {
    fn from(error: LexError) -> Self {
        ParseError::from(error).into()
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Diagnostic::error(
            error.span,
            format!("{}: {}", error.kind.as_str(), error.message),
        )
    }
}

impl From<CompilationError> for Diagnostic {
    fn from(error: CompilationError) -> Self {
        let span = error.span();
        // Strip the "at L:C: " prefix; the diagnostic prints its own location.
        let rendered = error.to_string();
        let message = match rendered.split_once(": ") {
            Some((prefix, rest)) if prefix.starts_with("at ") => rest.to_string(),
            _ => rendered,
        };
        Diagnostic::error(span, message)
    }
}

/// Every diagnostic produced by one compilation, in source order of discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.items.push(diagnostic.into());
    }

    pub fn extend<I, D>(&mut self, diagnostics: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<Diagnostic>,
    {
        self.items.extend(diagnostics.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_error_location_is_not_repeated() {
        let diagnostic: Diagnostic = CompilationError::UnknownField {
            type_name: "app::Person".into(),
            field: "Nmae".into(),
            span: Span::new(7, 42, 10),
        }
        .into();

        assert_eq!(
            diagnostic.to_string(),
            "unit:7:42: error: type 'app::Person' has no field 'Nmae'"
        );
    }

    #[test]
    fn counts_only_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning(Span::point(1, 1), "unused local"));
        assert!(!diagnostics.has_errors());

        diagnostics.push(LexError::UnterminatedString {
            span: Span::point(2, 3),
        });
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn display_lists_one_per_line() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::error(Span::point(1, 1), "first"));
        diagnostics.push(Diagnostic::error(Span::point(2, 5), "second"));
        assert_eq!(
            diagnostics.to_string(),
            "unit:1:1: error: first\nunit:2:5: error: second"
        );
    }
}
