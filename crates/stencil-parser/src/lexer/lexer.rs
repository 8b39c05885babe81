//! Main lexer implementation for units.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s, dispatching
//! on the first character of each token. All lexemes are copied into the
//! arena so the source string can be dropped once parsing finishes.
//!
//! Interpolated strings are scanned as a single token. Their holes are split
//! out and re-lexed by the parser, which starts a fresh lexer at the hole's
//! position via [`Lexer::with_origin`].

use std::collections::VecDeque;

use bumpalo::Bump;
use stencil_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Characters that may follow a backslash in a string literal.
pub const VALID_ESCAPES: &[char] = &['"', '\\', 'n', 'r', 't', '0', '{', '}'];

/// Lexer for unit source text.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated (persists).
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    /// Lookahead buffer for peeking.
    lookahead: VecDeque<Token<'ast>>,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self::with_origin(source, 1, 1, arena)
    }

    /// Create a lexer for text that starts at `line:column` of an enclosing unit.
    pub fn with_origin(source: &'src str, line: u32, column: u32, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::with_origin(source, line, column),
            arena,
            lookahead: VecDeque::with_capacity(4),
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'ast> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead (0 = next).
    pub fn peek_nth(&mut self, n: usize) -> Token<'ast> {
        while self.lookahead.len() <= n {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        self.lookahead[n]
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'ast> {
        self.skip_trivia();

        let Some(c) = self.cursor.peek() else {
            return self.make_eof();
        };

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        match c {
            '"' => self.scan_string(start_line, start_col, start_offset),
            '$' if self.cursor.peek_nth(1) == Some('"') => {
                self.scan_interpolated(start_line, start_col, start_offset)
            }
            c if c.is_ascii_digit() => self.scan_number(start_line, start_col, start_offset),
            c if is_ident_start(c) => self.scan_identifier(start_line, start_col, start_offset),
            _ => self.scan_operator(start_line, start_col, start_offset),
        }
    }

    /// Skip whitespace, a leading BOM, and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            if self.cursor.check_str("\u{FEFF}") || self.cursor.check(|c| c.is_whitespace()) {
                self.cursor.advance();
            } else if self.cursor.check_str("//") {
                self.cursor.eat_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    /// Create a token from the start position to the current position.
    fn make_token(&self, kind: TokenKind, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let text = self.cursor.slice_from(start_offset);
        let span = Span::new(start_line, start_col, text.len() as u32);
        Token::new(kind, self.arena.alloc_str(text), span)
    }

    /// Record an error and produce an error token in its place.
    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    fn span_from(&self, start_line: u32, start_col: u32, start_offset: u32) -> Span {
        Span::new(start_line, start_col, self.cursor.offset() - start_offset)
    }

    // =========================================
    // Scanning: Strings
    // =========================================

    /// Scan a `"..."` literal. Strings never span lines.
    fn scan_string(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance(); // opening quote
        let errors_before = self.errors.len();

        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => self.scan_escape(),
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }

        if self.errors.len() > errors_before {
            let span = self.span_from(start_line, start_col, start_offset);
            return Token::new(TokenKind::Error, "", span);
        }
        self.make_token(TokenKind::StringLiteral, start_line, start_col, start_offset)
    }

    /// Scan `$"..."`, validating escapes and brace structure.
    ///
    /// Text may contain `{{` and `}}`; a single `{` opens a hole that runs to
    /// the next `}` outside any nested string. A lone `}` in text is an error.
    fn scan_interpolated(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance(); // '$'
        self.cursor.advance(); // opening quote
        let errors_before = self.errors.len();

        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => self.scan_escape(),
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('{') if self.cursor.check_str("{{") => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('}') if self.cursor.check_str("}}") => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('{') => {
                    if let Err(error) = self.scan_hole() {
                        return self.make_error(error);
                    }
                }
                Some('}') => {
                    let span = Span::new(self.cursor.line(), self.cursor.column(), 1);
                    self.errors.push(LexError::UnmatchedBrace { span });
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }

        if self.errors.len() > errors_before {
            let span = self.span_from(start_line, start_col, start_offset);
            return Token::new(TokenKind::Error, "", span);
        }
        self.make_token(TokenKind::InterpolatedString, start_line, start_col, start_offset)
    }

    /// Skip over a hole, from its `{` through the closing `}`.
    fn scan_hole(&mut self) -> Result<(), LexError> {
        let hole_line = self.cursor.line();
        let hole_col = self.cursor.column();
        let hole_offset = self.cursor.offset();
        self.cursor.advance(); // '{'

        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(hole_line, hole_col, hole_offset);
                    return Err(LexError::UnterminatedHole { span });
                }
                Some('}') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some('"') => self.skip_nested_string(hole_line, hole_col, hole_offset)?,
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Skip a string literal nested inside a hole.
    fn skip_nested_string(&mut self, hole_line: u32, hole_col: u32, hole_offset: u32) -> Result<(), LexError> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(hole_line, hole_col, hole_offset);
                    return Err(LexError::UnterminatedHole { span });
                }
                Some('\\') => self.scan_escape(),
                Some('"') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Consume a backslash escape, recording an error for unknown escapes.
    fn scan_escape(&mut self) {
        let line = self.cursor.line();
        let col = self.cursor.column();
        self.cursor.advance(); // '\'
        match self.cursor.peek() {
            Some(c) if VALID_ESCAPES.contains(&c) => {
                self.cursor.advance();
            }
            // Left for the enclosing scanner to report as unterminated.
            None | Some('\n') | Some('\r') => {}
            Some(c) => {
                self.cursor.advance();
                let span = Span::new(line, col, 1 + c.len_utf8() as u32);
                self.errors.push(LexError::InvalidEscape { ch: c, span });
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    fn scan_number(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;

        // A dot not followed by a digit is member access on an integer.
        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if self.cursor.eat_while(|c| c.is_ascii_digit()).is_empty() {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::InvalidNumber {
                    span,
                    detail: "expected digits in exponent".to_string(),
                });
            }
            is_float = true;
        }

        if self.cursor.check(is_ident_start) {
            self.cursor.eat_while(is_ident_continue);
            let span = self.span_from(start_line, start_col, start_offset);
            return self.make_error(LexError::InvalidNumber {
                span,
                detail: "identifier characters directly after a number".to_string(),
            });
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.make_token(kind, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Identifiers and keywords
    // =========================================

    fn scan_identifier(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let lexeme = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Operators
    // =========================================

    /// Scan an operator or punctuation token.
    ///
    /// Uses tuple matching on (first_char, peek) to minimize repeated peek() calls.
    fn scan_operator(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        #[rustfmt::skip]
        let kind = match (c, next) {
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('<', _) => TokenKind::Less,
            ('>', _) => TokenKind::Greater,
            (',', _) => TokenKind::Comma,
            (';', _) => TokenKind::Semicolon,
            ('.', _) => TokenKind::Dot,
            ('#', _) => TokenKind::Hash,
            ('+', _) => TokenKind::Plus,
            ('*', _) => TokenKind::Star,

            (':', Some(':')) => { self.cursor.advance(); TokenKind::ColonColon }
            (':', _) => TokenKind::Colon,

            ('-', Some('>')) => { self.cursor.advance(); TokenKind::Arrow }
            ('-', _) => TokenKind::Minus,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqualEqual }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::BangEqual }
            ('!', _) => TokenKind::Bang,

            ('?', Some('?')) => { self.cursor.advance(); TokenKind::QuestionQuestion }
            ('?', _) => TokenKind::Question,

            (ch, _) => {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::UnexpectedChar { ch, span });
            }
        };

        self.make_token(kind, start_line, start_col, start_offset)
    }
}
