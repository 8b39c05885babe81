//! Statement parsing.

use bumpalo::collections::Vec as BVec;
use stencil_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use crate::ast::stmt::*;
use crate::lexer::TokenKind;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse a block, recovering at statement boundaries.
    ///
    /// Grammar: `'{' stmt* '}'`
    pub(crate) fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBrace)?.span;

        let mut stmts = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.record(error);
                    self.synchronize(&[TokenKind::Semicolon, TokenKind::Let, TokenKind::Return]);
                    self.eat(TokenKind::Semicolon);
                }
            }
        }
        let end = self.expect(TokenKind::RightBrace)?.span;

        Ok(Block {
            stmts: stmts.into_bump_slice(),
            span: start.merge(end),
        })
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            _ => {
                self.advance();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedStatement,
                    token.span,
                    format!("expected 'let' or 'return', found {}", token.kind.description()),
                ))
            }
        }
    }

    /// Grammar: `'let' IDENT '=' EXPR ';'`
    fn parse_let(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Let)?.span;
        let name = self.parse_ident()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expr(0)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Let(LetStmt {
            name,
            value,
            span: start.merge(end),
        }))
    }

    /// Grammar: `'return' EXPR ';'`
    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = self.parse_expr(0)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(end),
        }))
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;
    use crate::ast::{Expr, LiteralKind};

    fn block<'ast>(source: &str, arena: &'ast Bump) -> Block<'ast> {
        let mut parser = Parser::new(source, arena);
        let block = parser.parse_block().unwrap();
        parser.finish(block).unwrap()
    }

    #[test]
    fn let_then_return() {
        let arena = Bump::new();
        let b = block("{ let total = 1 + 2; return total; }", &arena);
        assert_eq!(b.stmts.len(), 2);
        let Stmt::Let(let_stmt) = b.stmts[0] else {
            panic!("expected let");
        };
        assert_eq!(let_stmt.name.name, "total");
        let Stmt::Return(ret) = b.stmts[1] else {
            panic!("expected return");
        };
        assert!(matches!(ret.value, Expr::Ident(id) if id.name == "total"));
        assert!(b.returns());
    }

    #[test]
    fn empty_block() {
        let arena = Bump::new();
        let b = block("{}", &arena);
        assert!(b.stmts.is_empty());
        assert!(!b.returns());
    }

    #[test]
    fn bad_statement_is_skipped() {
        let arena = Bump::new();
        let mut parser = Parser::new("{ total = 3; return 4; }", &arena);
        let b = parser.parse_block().unwrap();
        assert_eq!(b.stmts.len(), 1);
        let Stmt::Return(ret) = b.stmts[0] else {
            panic!("expected return");
        };
        assert!(matches!(ret.value, Expr::Literal(lit) if lit.kind == LiteralKind::Int(4)));

        let errors = parser.finish(()).unwrap_err();
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ParseErrorKind::ExpectedStatement);
    }
}
