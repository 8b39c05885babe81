//! Declaration parsing: header, `use` directives, modules, types, functions.

use bumpalo::collections::Vec as BVec;
use stencil_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use crate::ast::decl::*;
use crate::ast::Unit;
use crate::lexer::TokenKind;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse a whole unit. Errors are recorded, never returned.
    ///
    /// Grammar: `edition? use* module*`
    pub(crate) fn parse_unit(&mut self) -> Unit<'ast> {
        let start_span = self.peek().span;

        let edition = if self.check(TokenKind::Hash) {
            match self.parse_edition() {
                Ok(header) => Some(header),
                Err(error) => {
                    self.record(error);
                    self.synchronize(&[TokenKind::Use, TokenKind::Module]);
                    None
                }
            }
        } else {
            None
        };

        let mut uses = BVec::new_in(self.arena);
        while self.check(TokenKind::Use) {
            match self.parse_use() {
                Ok(decl) => uses.push(decl),
                Err(error) => {
                    self.record(error);
                    self.synchronize(&[TokenKind::Use, TokenKind::Module]);
                    self.eat(TokenKind::Semicolon);
                }
            }
        }

        let mut modules = BVec::new_in(self.arena);
        while !self.is_eof() {
            if !self.check(TokenKind::Module) {
                let token = self.peek();
                self.record(ParseError::new(
                    ParseErrorKind::ExpectedDeclaration,
                    token.span,
                    format!("expected 'module', found {}", token.kind.description()),
                ));
                self.advance();
                self.synchronize(&[TokenKind::Module]);
                // A stray `}` at top level would otherwise stop synchronization forever.
                self.eat(TokenKind::RightBrace);
                continue;
            }
            match self.parse_module() {
                Ok(module) => modules.push(module),
                Err(error) => {
                    self.record(error);
                    self.synchronize(&[TokenKind::Module]);
                    self.eat(TokenKind::RightBrace);
                }
            }
        }

        let span = start_span.merge(self.prev_span());
        Unit::new(edition, uses.into_bump_slice(), modules.into_bump_slice(), span)
    }

    /// Grammar: `'#' '!' '[' 'edition' '=' INT ']'`
    fn parse_edition(&mut self) -> Result<EditionHeader, ParseError> {
        let start = self.expect(TokenKind::Hash)?.span;
        let invalid = |span| {
            ParseError::new(
                ParseErrorKind::InvalidHeader,
                span,
                "expected `#![edition = N]`",
            )
        };

        if self.eat(TokenKind::Bang).is_none() || self.eat(TokenKind::LeftBracket).is_none() {
            return Err(invalid(self.peek().span));
        }
        let key = self.peek();
        if key.kind != TokenKind::Identifier || key.lexeme != "edition" {
            return Err(invalid(key.span));
        }
        self.advance();
        if self.eat(TokenKind::Equal).is_none() {
            return Err(invalid(self.peek().span));
        }
        let value = self.peek();
        if value.kind != TokenKind::IntLiteral {
            return Err(invalid(value.span));
        }
        self.advance();
        let version = value.lexeme.parse::<u32>().map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidHeader,
                value.span,
                format!("edition '{}' is out of range", value.lexeme),
            )
        })?;
        let end = self.expect(TokenKind::RightBracket)?.span;

        Ok(EditionHeader {
            version,
            span: start.merge(end),
        })
    }

    /// Grammar: `'use' PATH ';'`
    fn parse_use(&mut self) -> Result<UseDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Use)?.span;
        let path = self.parse_path()?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(UseDecl {
            path,
            span: start.merge(end),
        })
    }

    /// Grammar: `'module' IDENT '{' type* '}'`
    fn parse_module(&mut self) -> Result<ModuleDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Module)?.span;
        let name = self.parse_ident()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut types = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            if !self.check(TokenKind::Type) {
                let token = self.advance();
                self.record(ParseError::new(
                    ParseErrorKind::ExpectedDeclaration,
                    token.span,
                    format!("expected 'type', found {}", token.kind.description()),
                ));
                self.synchronize(&[TokenKind::Type]);
                continue;
            }
            match self.parse_type_decl() {
                Ok(decl) => types.push(decl),
                Err(error) => {
                    self.record(error);
                    self.synchronize(&[TokenKind::Type]);
                }
            }
        }
        let end = self.expect(TokenKind::RightBrace)?.span;

        Ok(ModuleDecl {
            name,
            types: types.into_bump_slice(),
            span: start.merge(end),
        })
    }

    /// Grammar: `'type' IDENT '{' function* '}'`
    fn parse_type_decl(&mut self) -> Result<TypeDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Type)?.span;
        let name = self.parse_ident()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut functions = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            if !self.check(TokenKind::Fn) {
                let token = self.advance();
                self.record(ParseError::new(
                    ParseErrorKind::ExpectedDeclaration,
                    token.span,
                    format!("expected 'fn', found {}", token.kind.description()),
                ));
                self.synchronize(&[TokenKind::Fn]);
                continue;
            }
            match self.parse_function() {
                Ok(decl) => functions.push(decl),
                Err(error) => {
                    self.record(error);
                    self.synchronize(&[TokenKind::Fn]);
                }
            }
        }
        let end = self.expect(TokenKind::RightBrace)?.span;

        Ok(TypeDecl {
            name,
            functions: functions.into_bump_slice(),
            span: start.merge(end),
        })
    }

    /// Grammar: `'fn' IDENT '(' (param (',' param)*)? ')' '->' TYPE BLOCK`
    fn parse_function(&mut self) -> Result<FunctionDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Fn)?.span;
        let name = self.parse_ident()?;
        self.expect(TokenKind::LeftParen)?;

        let mut params = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                let param_name = self.parse_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type_ref()?;
                params.push(Param {
                    name: param_name,
                    ty,
                    span: param_name.span.merge(ty.span),
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::Arrow)?;
        let return_type = self.parse_type_ref()?;
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            params: params.into_bump_slice(),
            return_type,
            body,
            span: start.merge(body.span),
        })
    }

    // =========================================
    // Names and types
    // =========================================

    pub(crate) fn parse_ident(&mut self) -> Result<Ident<'ast>, ParseError> {
        let token = self.peek();
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                token.span,
                format!("expected identifier, found {}", token.kind.description()),
            ));
        }
        self.advance();
        Ok(Ident::new(token.lexeme, token.span))
    }

    /// Grammar: `IDENT ('::' IDENT)*`
    pub(crate) fn parse_path(&mut self) -> Result<Path<'ast>, ParseError> {
        let first = self.parse_ident()?;
        let mut segments = BVec::new_in(self.arena);
        segments.push(first);
        while self.eat(TokenKind::ColonColon).is_some() {
            segments.push(self.parse_ident()?);
        }
        let span = first.span.merge(self.prev_span());
        Ok(Path {
            segments: segments.into_bump_slice(),
            span,
        })
    }

    /// Grammar: `PATH ('<' TYPE (',' TYPE)* '>')?`
    pub(crate) fn parse_type_ref(&mut self) -> Result<TypeRef<'ast>, ParseError> {
        if self.peek().kind != TokenKind::Identifier {
            let token = self.peek();
            return Err(ParseError::new(
                ParseErrorKind::ExpectedType,
                token.span,
                format!("expected type, found {}", token.kind.description()),
            ));
        }
        let path = self.parse_path()?;

        let mut args = BVec::new_in(self.arena);
        if self.eat(TokenKind::Less).is_some() {
            loop {
                args.push(self.parse_type_ref()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::Greater)?;
        }

        Ok(TypeRef {
            path,
            args: args.into_bump_slice(),
            span: path.span.merge(self.prev_span()),
        })
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;
    use crate::ast::Stmt;

    const UNIT: &str = r#"#![edition = 1]
use std;
use app::models;
module Stencil_greeting {
    type Stencil_greetingTemplateGenerator {
        fn Interpolate(model: app::Wrapper<app::Item>) -> string {
            return $"Hello {model.Name}";
        }
    }
}
"#;

    #[test]
    fn parses_full_unit() {
        let arena = Bump::new();
        let unit = Parser::parse(UNIT, &arena).unwrap();

        assert_eq!(unit.edition().map(|e| e.version), Some(1));
        let uses: Vec<String> = unit.uses().iter().map(|u| u.path.to_string()).collect();
        assert_eq!(uses, vec!["std", "app::models"]);

        let module = &unit.modules()[0];
        assert_eq!(module.name.name, "Stencil_greeting");
        let ty = &module.types[0];
        assert_eq!(ty.name.name, "Stencil_greetingTemplateGenerator");
        let func = &ty.functions[0];
        assert_eq!(func.name.name, "Interpolate");
        assert_eq!(func.params[0].ty.to_string(), "app::Wrapper<app::Item>");
        assert_eq!(func.return_type.to_string(), "string");
        assert!(matches!(func.body.stmts[0], Stmt::Return(_)));
        assert_eq!(func.span.line, 6);
    }

    #[test]
    fn header_is_optional() {
        let arena = Bump::new();
        let unit = Parser::parse("module M { }", &arena).unwrap();
        assert!(unit.edition().is_none());
        assert!(unit.uses().is_empty());
        assert!(unit.modules()[0].types.is_empty());
    }

    #[test]
    fn malformed_header() {
        let arena = Bump::new();
        let errors = Parser::parse("#![version = 1] module M { }", &arena).unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ParseErrorKind::InvalidHeader);
        assert_eq!(error.span.col, 4);
    }

    #[test]
    fn recovers_between_functions() {
        let arena = Bump::new();
        let source = "module M { type T {
            fn A() -> int { return 1 }
            fn B( -> int { return 2; }
            fn C() -> int { return 3; }
        } }";
        let errors = Parser::parse(source, &arena).unwrap_err();
        let lines: Vec<u32> = errors.iter().map(|e| e.span.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn stray_top_level_tokens() {
        let arena = Bump::new();
        let errors = Parser::parse("fn F() -> int { return 1; }", &arena).unwrap_err();
        let first = errors.iter().next().unwrap();
        assert_eq!(first.kind, ParseErrorKind::ExpectedDeclaration);
    }
}
