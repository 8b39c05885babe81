//! Token types for the unit lexer.

use stencil_core::Span;
use std::fmt;

/// A token from a unit.
///
/// The lexeme is copied into the parse arena, so tokens outlive the source
/// string they were scanned from.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`
    IntLiteral,
    /// `3.5`, `1e3`
    FloatLiteral,
    /// `"text"` (lexeme keeps quotes and escapes)
    StringLiteral,
    /// `$"hello {model.Name}"` (lexeme keeps `$`, quotes, escapes and holes)
    InterpolatedString,

    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Use,
    Module,
    Type,
    Fn,
    Let,
    Return,
    True,
    False,
    Null,

    // =========================================
    // Punctuation
    // =========================================
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Less,
    Greater,
    Comma,
    Semicolon,
    Colon,
    ColonColon,
    Dot,
    /// `->`
    Arrow,
    /// `#`
    Hash,
    Bang,
    Equal,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    EqualEqual,
    BangEqual,
    Question,
    QuestionQuestion,

    // =========================================
    // Special
    // =========================================
    Eof,
    /// Produced for input the lexer rejected; the error is recorded separately.
    Error,
}

impl TokenKind {
    /// Description used in "expected X, found Y" messages.
    pub fn description(&self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            FloatLiteral => "float literal",
            StringLiteral => "string literal",
            InterpolatedString => "interpolated string",
            Identifier => "identifier",
            Use => "'use'",
            Module => "'module'",
            Type => "'type'",
            Fn => "'fn'",
            Let => "'let'",
            Return => "'return'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            Less => "'<'",
            Greater => "'>'",
            Comma => "','",
            Semicolon => "';'",
            Colon => "':'",
            ColonColon => "'::'",
            Dot => "'.'",
            Arrow => "'->'",
            Hash => "'#'",
            Bang => "'!'",
            Equal => "'='",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Question => "'?'",
            QuestionQuestion => "'??'",
            Eof => "end of unit",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Look up a keyword by its spelling.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "use" => TokenKind::Use,
        "module" => TokenKind::Module,
        "type" => TokenKind::Type,
        "fn" => TokenKind::Fn,
        "let" => TokenKind::Let,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => return None,
    })
}
