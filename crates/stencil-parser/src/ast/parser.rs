//! Parser state and token-stream helpers.
//!
//! The grammar-specific productions live in `decl_parser`, `stmt_parser`,
//! and `expr_parser`; this module owns the token stream, error collection,
//! and recovery.

use bumpalo::Bump;
use stencil_core::{ParseError, ParseErrorKind, ParseErrors, Span};

use crate::ast::Unit;
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive-descent parser for units, with a Pratt parser for expressions.
///
/// All nodes are allocated in the arena passed to [`Parser::parse`].
pub struct Parser<'src, 'ast> {
    lexer: Lexer<'src, 'ast>,
    pub(crate) arena: &'ast Bump,
    errors: Vec<ParseError>,
    /// Span of the most recently consumed token.
    prev_span: Span,
}

impl<'src, 'ast> Parser<'src, 'ast> {
    pub(crate) fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self::with_lexer(Lexer::new(source, arena), arena)
    }

    /// A parser over text cut out of a larger unit, starting at `line:column`.
    pub(crate) fn with_origin(source: &'src str, line: u32, column: u32, arena: &'ast Bump) -> Self {
        Self::with_lexer(Lexer::with_origin(source, line, column, arena), arena)
    }

    fn with_lexer(lexer: Lexer<'src, 'ast>, arena: &'ast Bump) -> Self {
        Self {
            lexer,
            arena,
            errors: Vec::new(),
            prev_span: Span::default(),
        }
    }

    /// Parse a complete unit.
    ///
    /// Lexer and parser errors are both reported, in source order. Parsing
    /// recovers at statement and declaration boundaries so one mistake does
    /// not hide the next.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &'src str, arena: &'ast Bump) -> Result<Unit<'ast>, ParseErrors> {
        let mut parser = Parser::new(source, arena);
        let unit = parser.parse_unit();
        parser.finish(unit)
    }

    /// Parse a lone expression, e.g. the text of an interpolation hole.
    pub fn parse_expression(
        source: &'src str,
        arena: &'ast Bump,
    ) -> Result<&'ast crate::ast::Expr<'ast>, ParseErrors> {
        let mut parser = Parser::new(source, arena);
        let expr = parser.parse_standalone_expr();
        parser.finish_result(expr)
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, ParseErrors> {
        if self.errors.is_empty() && !self.lexer.has_errors() {
            return Ok(value);
        }
        Err(self.into_errors())
    }

    pub(crate) fn finish_result<T>(mut self, value: Result<T, ParseError>) -> Result<T, ParseErrors> {
        match value {
            Ok(value) => self.finish(value),
            Err(error) => {
                self.errors.push(error);
                Err(self.into_errors())
            }
        }
    }

    /// Lexer and parser errors merged in source order.
    fn into_errors(mut self) -> ParseErrors {
        let mut errors: Vec<ParseError> = self
            .lexer
            .take_errors()
            .into_iter()
            .map(ParseError::from)
            .collect();
        errors.append(&mut self.errors);
        errors.sort_by_key(|e| (e.span.line, e.span.col));
        errors.dedup();

        let mut out = ParseErrors::new();
        for error in errors {
            out.push(error);
        }
        out
    }

    /// Parse an expression that must cover all remaining input.
    pub(crate) fn parse_standalone_expr(&mut self) -> Result<&'ast crate::ast::Expr<'ast>, ParseError> {
        let expr = self.parse_expr(0)?;
        if !self.is_eof() {
            let token = self.peek();
            return Err(ParseError::unexpected_token(token.span, token.kind.description()));
        }
        Ok(expr)
    }

    /// Fold errors from a nested parser into this one.
    pub(crate) fn absorb_errors(&mut self, errors: ParseErrors) {
        self.errors.extend(errors);
    }

    pub(crate) fn record(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    // =========================================
    // Token stream
    // =========================================

    #[inline]
    pub(crate) fn peek(&mut self) -> Token<'ast> {
        self.lexer.peek()
    }

    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = self.lexer.next_token();
        if token.kind != TokenKind::Eof {
            self.prev_span = token.span;
        }
        token
    }

    #[inline]
    pub(crate) fn prev_span(&self) -> Span {
        self.prev_span
    }

    #[inline]
    pub(crate) fn check(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    #[inline]
    pub(crate) fn is_eof(&mut self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the next token if it is of the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        if token.kind == TokenKind::Eof {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {}", kind.description()),
            ));
        }
        Err(ParseError::expected_token(
            token.span,
            kind.description(),
            token.kind.description(),
        ))
    }

    // =========================================
    // Recovery
    // =========================================

    /// Skip tokens until one of `stop` at the current nesting depth, or until
    /// the `}` closing the enclosing block. Neither is consumed.
    pub(crate) fn synchronize(&mut self, stop: &[TokenKind]) {
        let mut depth = 0usize;
        loop {
            let kind = self.peek().kind;
            match kind {
                TokenKind::Eof => return,
                TokenKind::RightBrace if depth == 0 => return,
                _ if depth == 0 && stop.contains(&kind) => return,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }
}
