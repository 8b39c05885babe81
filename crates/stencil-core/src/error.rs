//! Error types for every phase of the template toolchain.
//!
//! ## Error Hierarchy
//!
//! ```text
//! LexError          - tokenization of a synthesized unit
//! ParseError        - syntax errors (with ParseErrorKind)
//! CompilationError  - name resolution and type checking
//! RuntimeError      - failures while executing an entry point
//! ```
//!
//! The first three are collected into [`Diagnostics`](crate::Diagnostics)
//! by the compiler; `RuntimeError` is returned from a call.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur while tokenizing a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("unterminated interpolation hole at {span}")]
    UnterminatedHole { span: Span },

    /// A lone `}` in interpolated text that is not part of `}}`.
    #[error("unmatched '}}' in interpolated string at {span}")]
    UnmatchedBrace { span: Span },

    #[error("invalid escape sequence '\\{ch}' at {span}")]
    InvalidEscape { ch: char, span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedHole { span }
            | LexError::UnmatchedBrace { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    UnexpectedEof,
    ExpectedExpression,
    ExpectedType,
    ExpectedIdentifier,
    ExpectedStatement,
    /// A `module`, `type`, or `fn` declaration was expected.
    ExpectedDeclaration,
    /// The `#![edition = N]` header is malformed.
    InvalidHeader,
    /// An interpolation hole contains nothing but whitespace.
    EmptyHole,
    /// A format specifier follows `:` but is empty or malformed.
    InvalidFormatSpec,
    /// A literal value could not be parsed.
    InvalidLiteral,
    /// The lexer rejected part of the input.
    InvalidToken,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of unit",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::InvalidHeader => "invalid unit header",
            ParseErrorKind::EmptyHole => "empty interpolation hole",
            ParseErrorKind::InvalidFormatSpec => "invalid format specifier",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::InvalidToken => "invalid token",
        }
    }
}

/// A syntax error with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message} at {span}", .kind.as_str())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected {token}"),
        )
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        let message = match &error {
            LexError::UnexpectedChar { ch, .. } => format!("unexpected character '{ch}'"),
            LexError::UnterminatedString { .. } => "unterminated string".to_string(),
            LexError::UnterminatedHole { .. } => "unterminated interpolation hole".to_string(),
            LexError::UnmatchedBrace { .. } => "unmatched '}' in interpolated string".to_string(),
            LexError::InvalidEscape { ch, .. } => format!("invalid escape sequence '\\{ch}'"),
            LexError::InvalidNumber { detail, .. } => format!("invalid number: {detail}"),
        };
        ParseError::new(ParseErrorKind::InvalidToken, error.span(), message)
    }
}

/// All syntax errors from one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors found while resolving names and checking types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// A `use` names a namespace the reference set does not provide.
    #[error("at {span}: unknown namespace '{name}'")]
    UnknownNamespace { name: String, span: Span },

    #[error("at {span}: unknown type '{name}'")]
    UnknownType { name: String, span: Span },

    #[error("at {span}: unknown variable '{name}'")]
    UnknownVariable { name: String, span: Span },

    /// Member access names a field the model shape does not declare.
    #[error("at {span}: type '{type_name}' has no field '{field}'")]
    UnknownField {
        type_name: String,
        field: String,
        span: Span,
    },

    #[error("at {span}: type '{type_name}' has no method '{method}'")]
    UnknownMethod {
        type_name: String,
        method: String,
        span: Span,
    },

    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    #[error("at {span}: {message}")]
    InvalidOperation { message: String, span: Span },

    #[error("at {span}: format specifier '{spec}' cannot be applied to {type_name}")]
    InvalidFormat {
        spec: String,
        type_name: String,
        span: Span,
    },

    #[error("at {span}: duplicate definition of '{name}'")]
    Duplicate { name: String, span: Span },

    /// The unit requests a language version the compiler was not pinned to.
    #[error("at {span}: unit targets edition {found}, compiler is pinned to {expected}")]
    EditionMismatch { expected: u32, found: u32, span: Span },

    /// A function can fall off its end without returning.
    #[error("at {span}: function '{name}' does not return a value")]
    MissingReturn { name: String, span: Span },

    /// A limit of the bytecode format was exceeded.
    #[error("at {span}: {message}")]
    LimitExceeded { message: String, span: Span },
}

impl CompilationError {
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UnknownNamespace { span, .. }
            | CompilationError::UnknownType { span, .. }
            | CompilationError::UnknownVariable { span, .. }
            | CompilationError::UnknownField { span, .. }
            | CompilationError::UnknownMethod { span, .. }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::InvalidOperation { span, .. }
            | CompilationError::InvalidFormat { span, .. }
            | CompilationError::Duplicate { span, .. }
            | CompilationError::EditionMismatch { span, .. }
            | CompilationError::MissingReturn { span, .. }
            | CompilationError::LimitExceeded { span, .. } => *span,
        }
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while executing compiled code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("integer overflow in '{op}' at line {line}")]
    IntegerOverflow { op: &'static str, line: u32 },

    #[error("expected {expected} argument(s), got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// The model passed in is not the type the entry point was compiled for.
    #[error("argument {index} expected '{expected}', got '{actual}'")]
    ArgumentMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// A model returned no value for a field its shape declares.
    #[error("model '{type_name}' returned no value for field '{field}'")]
    MissingField { type_name: String, field: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("null value cannot be used as {target}")]
    NullValue { target: String },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("malformed bytecode at offset {offset}: {detail}")]
    MalformedBytecode { offset: usize, detail: String },
}
