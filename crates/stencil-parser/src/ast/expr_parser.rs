//! Expression parsing using Pratt parsing (precedence climbing).

use bumpalo::collections::Vec as BVec;
use stencil_core::{ParseError, ParseErrorKind, Span};

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::{BinaryOp, Ident, POSTFIX_BP, TERNARY_BP, UnaryOp};
use crate::lexer::{Token, TokenKind};

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse an expression with a minimum binding power.
    ///
    /// This is the core of the Pratt parser. It handles operator precedence
    /// by only consuming operators with sufficient binding power.
    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.peek();

            if token.kind == TokenKind::Dot {
                if POSTFIX_BP < min_bp {
                    break;
                }
                lhs = self.parse_member(lhs)?;
                continue;
            }

            if token.kind == TokenKind::Question {
                if TERNARY_BP < min_bp {
                    break;
                }
                lhs = self.parse_ternary(lhs)?;
                continue;
            }

            if let Some(op) = BinaryOp::from_token(token.kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(rhs.span());
                lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
                    left: lhs,
                    op,
                    right: rhs,
                    span,
                })));
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Parse a prefix expression (the start of an expression).
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = self.peek();

        if let Some(op) = UnaryOp::from_token(token.kind) {
            self.advance();
            let operand = self.parse_expr(UnaryOp::binding_power())?;
            let span = token.span.merge(operand.span());
            return Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr { op, operand, span }))));
        }

        let kind = match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("integer literal '{}' is out of range", token.lexeme),
                    )
                })?;
                LiteralKind::Int(value)
            }

            TokenKind::FloatLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("invalid float literal '{}'", token.lexeme),
                    )
                })?;
                LiteralKind::Float(value)
            }

            TokenKind::StringLiteral => {
                self.advance();
                let body = &token.lexeme[1..token.lexeme.len() - 1];
                LiteralKind::String(self.arena.alloc_str(&unescape(body)))
            }

            TokenKind::True => {
                self.advance();
                LiteralKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                LiteralKind::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                LiteralKind::Null
            }

            // Already reported by the lexer; stand in a null so parsing continues.
            TokenKind::Error => {
                self.advance();
                LiteralKind::Null
            }

            TokenKind::InterpolatedString => {
                self.advance();
                let interpolated = self.parse_interpolated(token);
                return Ok(self.arena.alloc(Expr::Interpolated(interpolated)));
            }

            TokenKind::Identifier => {
                self.advance();
                return Ok(self.arena.alloc(Expr::Ident(Ident::new(token.lexeme, token.span))));
            }

            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                let end = self.expect(TokenKind::RightParen)?.span;
                let span = token.span.merge(end);
                return Ok(self.arena.alloc(Expr::Paren(self.arena.alloc(ParenExpr { expr, span }))));
            }

            TokenKind::Eof => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEof,
                    token.span,
                    "expected expression",
                ));
            }

            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression,
                    token.span,
                    format!("expected expression, found {}", token.kind.description()),
                ));
            }
        };

        Ok(self.arena.alloc(Expr::Literal(LiteralExpr {
            kind,
            span: token.span,
        })))
    }

    /// Parse `.field` or `.method(args)` after `object`.
    fn parse_member(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Dot)?;
        let member = self.parse_ident()?;

        if self.eat(TokenKind::LeftParen).is_none() {
            let span = object.span().merge(member.span);
            return Ok(self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr { object, member, span }))));
        }

        let mut args = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let end = self.expect(TokenKind::RightParen)?.span;
        let span = object.span().merge(end);

        Ok(self.arena.alloc(Expr::MethodCall(self.arena.alloc(MethodCallExpr {
            receiver: object,
            method: member,
            args: args.into_bump_slice(),
            span,
        }))))
    }

    /// Parse `? then : else` after `condition`. Right-associative.
    fn parse_ternary(&mut self, condition: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Question)?;
        let then_expr = self.parse_expr(0)?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.parse_expr(TERNARY_BP)?;
        let span = condition.span().merge(else_expr.span());

        Ok(self.arena.alloc(Expr::Ternary(self.arena.alloc(TernaryExpr {
            condition,
            then_expr,
            else_expr,
            span,
        }))))
    }

    // =========================================
    // Interpolated strings
    // =========================================

    /// Split an interpolated string token into text and hole segments.
    ///
    /// Hole expressions are parsed by a nested parser positioned at the
    /// hole's column, so their diagnostics point into the enclosing unit.
    /// Errors inside holes are recorded and the hole is replaced by `null`.
    fn parse_interpolated(&mut self, token: Token<'ast>) -> InterpolatedExpr<'ast> {
        let lexeme = token.lexeme;
        // `$"` prefix and `"` suffix were checked by the lexer.
        let body = &lexeme[2..lexeme.len() - 1];
        let base_col = token.span.col + 2;
        let line = token.span.line;

        let mut segments = BVec::new_in(self.arena);
        let mut text = String::new();
        let bytes = body.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    let escaped = body[i + 1..].chars().next().unwrap_or('\\');
                    text.push(resolve_escape(escaped));
                    i += 1 + escaped.len_utf8();
                }
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    text.push('{');
                    i += 2;
                }
                b'}' if bytes.get(i + 1) == Some(&b'}') => {
                    text.push('}');
                    i += 2;
                }
                b'{' => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(self.arena.alloc_str(&text)));
                        text.clear();
                    }
                    let end = hole_end(body, i + 1);
                    let hole_text = &body[i + 1..end];
                    let hole_span = Span::new(line, base_col + i as u32, (end + 1 - i) as u32);
                    let hole = self.parse_hole(hole_text, line, base_col + i as u32 + 1, hole_span);
                    segments.push(Segment::Hole(hole));
                    i = end + 1;
                }
                _ => {
                    let ch = body[i..].chars().next().unwrap_or_default();
                    text.push(ch);
                    i += ch.len_utf8().max(1);
                }
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(self.arena.alloc_str(&text)));
        }

        InterpolatedExpr {
            segments: segments.into_bump_slice(),
            span: token.span,
        }
    }

    /// Parse the text between `{` and `}` starting at `line:col`.
    fn parse_hole(&mut self, text: &'ast str, line: u32, col: u32, span: Span) -> Hole<'ast> {
        let (expr_text, format_text) = match format_colon(text) {
            Some(colon) => (&text[..colon], Some((&text[colon + 1..], colon))),
            None => (text, None),
        };

        let arena = self.arena;
        let null = move |span: Span| -> &'ast Expr<'ast> {
            arena.alloc(Expr::Literal(LiteralExpr {
                kind: LiteralKind::Null,
                span,
            }))
        };

        if expr_text.trim().is_empty() {
            self.record(ParseError::new(
                ParseErrorKind::EmptyHole,
                span,
                "interpolation hole has no expression",
            ));
            return Hole { expr: null(span), format: None, span };
        }

        let mut nested = Parser::with_origin(expr_text, line, col, self.arena);
        let result = nested.parse_standalone_expr();
        let expr = match nested.finish_result(result) {
            Ok(expr) => expr,
            Err(errors) => {
                self.absorb_errors(errors);
                null(span)
            }
        };

        let format = format_text.and_then(|(spec, colon)| {
            let spec_col = col + colon as u32 + 1;
            let trimmed = spec.trim();
            let spec_span = Span::new(line, spec_col, spec.len() as u32);
            match FormatKind::parse(trimmed) {
                Some(kind) => Some(FormatSpec { kind, span: spec_span }),
                None => {
                    self.record(ParseError::new(
                        ParseErrorKind::InvalidFormatSpec,
                        spec_span,
                        format!("unknown format specifier '{trimmed}'"),
                    ));
                    None
                }
            }
        });

        Hole { expr, format, span }
    }
}

/// Resolve the escape sequences of a string literal body.
///
/// The lexer has already rejected unknown escapes.
pub(crate) fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(resolve_escape(escaped));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn resolve_escape(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        '0' => '\0',
        other => other,
    }
}

/// Byte index of the `}` closing a hole whose text starts at `start`.
///
/// Quoted strings inside the hole may contain `}`. The lexer guarantees the
/// hole is closed, but the body length is returned as a fallback.
fn hole_end(body: &str, start: usize) -> usize {
    let bytes = body.as_bytes();
    let mut i = start;
    let mut in_string = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'}' if !in_string => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Position of the `:` that separates a hole's expression from its format
/// specifier.
///
/// Colons inside parentheses or strings, the `::` path separator, and the
/// `:` of a `?:` ternary are skipped.
fn format_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0u32;
    let mut pending_ternaries = 0u32;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'?' if next == Some(b'?') => i += 1,
            b'?' if depth == 0 => pending_ternaries += 1,
            b':' if next == Some(b':') => i += 1,
            b':' if depth == 0 => {
                if pending_ternaries == 0 {
                    return Some(i);
                }
                pending_ternaries -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;

    fn expr<'ast>(source: &str, arena: &'ast Bump) -> &'ast Expr<'ast> {
        let source = arena.alloc_str(source);
        Parser::parse_expression(source, arena).unwrap()
    }

    fn segments<'ast>(source: &str, arena: &'ast Bump) -> &'ast [Segment<'ast>] {
        match expr(source, arena) {
            Expr::Interpolated(i) => i.segments,
            other => panic!("expected interpolated string, got {other:?}"),
        }
    }

    #[test]
    fn precedence() {
        let arena = Bump::new();
        // a + b * c == d ?? e  =>  ((a + (b * c)) == d) ?? e
        let Expr::Binary(coalesce) = expr("a + b * c == d ?? e", &arena) else {
            panic!()
        };
        assert_eq!(coalesce.op, BinaryOp::Coalesce);
        let Expr::Binary(eq) = coalesce.left else { panic!() };
        assert_eq!(eq.op, BinaryOp::Equal);
        let Expr::Binary(add) = eq.left else { panic!() };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.right, Expr::Binary(mul) if mul.op == BinaryOp::Mul));
    }

    #[test]
    fn ternary_is_right_associative() {
        let arena = Bump::new();
        let Expr::Ternary(outer) = expr("a ? b : c ? d : e", &arena) else {
            panic!()
        };
        assert!(matches!(outer.else_expr, Expr::Ternary(_)));
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let arena = Bump::new();
        let Expr::Binary(sub) = expr("-a - b", &arena) else { panic!() };
        assert!(matches!(sub.left, Expr::Unary(u) if u.op == UnaryOp::Neg));
    }

    #[test]
    fn member_chain_and_methods() {
        let arena = Bump::new();
        let Expr::MethodCall(call) = expr("model.Customer.Name.upper()", &arena) else {
            panic!()
        };
        assert_eq!(call.method.name, "upper");
        assert!(call.args.is_empty());
        let Expr::Member(name) = call.receiver else { panic!() };
        assert_eq!(name.member.name, "Name");
        assert!(matches!(name.object, Expr::Member(c) if c.member.name == "Customer"));
    }

    #[test]
    fn string_literals_are_unescaped() {
        let arena = Bump::new();
        let Expr::Literal(lit) = expr(r#""a\"b\n\{""#, &arena) else { panic!() };
        assert_eq!(lit.kind, LiteralKind::String("a\"b\n{"));
    }

    #[test]
    fn interpolation_segments() {
        let arena = Bump::new();
        let segs = segments(r#"$"Hello, {model.Name}! {{literal}}""#, &arena);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0], Segment::Text("Hello, "));
        let Segment::Hole(hole) = segs[1] else { panic!() };
        assert!(matches!(hole.expr, Expr::Member(m) if m.member.name == "Name"));
        assert_eq!(hole.span, Span::new(1, 10, 12));
        assert_eq!(hole.expr.span(), Span::new(1, 11, 10));
        assert_eq!(segs[2], Segment::Text("! {literal}"));
    }

    #[test]
    fn hole_with_quoted_strings_and_ternary() {
        let arena = Bump::new();
        let segs = segments(r#"$"{model.Active ? "on:}" : "off"}""#, &arena);
        let Segment::Hole(hole) = segs[0] else { panic!() };
        assert!(hole.format.is_none());
        let Expr::Ternary(t) = hole.expr else { panic!() };
        assert!(matches!(t.then_expr, Expr::Literal(l) if l.kind == LiteralKind::String("on:}")));
    }

    #[test]
    fn hole_format_specifier() {
        let arena = Bump::new();
        let segs = segments(r#"$"{model.Total:F2} {(a ? b : c):D3}""#, &arena);
        let Segment::Hole(total) = segs[0] else { panic!() };
        assert_eq!(total.format.map(|f| f.kind), Some(FormatKind::Fixed(2)));
        let Segment::Hole(paren) = segs[2] else { panic!() };
        assert_eq!(paren.format.map(|f| f.kind), Some(FormatKind::Decimal(3)));
        assert!(matches!(paren.expr, Expr::Paren(_)));
    }

    #[test]
    fn format_colon_positions() {
        assert_eq!(format_colon("x:F2"), Some(1));
        assert_eq!(format_colon("a ? b : c"), None);
        assert_eq!(format_colon("a ? b : c:U"), Some(9));
        assert_eq!(format_colon("a ?? b:U"), Some(6));
        assert_eq!(format_colon("\"a:b\""), None);
        assert_eq!(format_colon("std::x"), None);
    }

    #[test]
    fn errors_inside_holes_point_into_the_unit() {
        let arena = Bump::new();
        let source = r#"$"ok {model.} {}""#;
        let errors = Parser::parse_expression(source, &arena).unwrap_err();
        let found: Vec<(ParseErrorKind, u32)> = errors.iter().map(|e| (e.kind, e.span.col)).collect();
        assert_eq!(
            found,
            vec![
                (ParseErrorKind::ExpectedIdentifier, 13),
                (ParseErrorKind::EmptyHole, 15),
            ]
        );
    }

    #[test]
    fn unknown_format_specifier() {
        let arena = Bump::new();
        let errors = Parser::parse_expression(r#"$"{model.Name:Q}""#, &arena).unwrap_err();
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ParseErrorKind::InvalidFormatSpec);
        assert_eq!(error.span.col, 15);
    }
}
