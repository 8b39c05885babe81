//! Lexical analysis for units.

mod cursor;
#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::{Lexer, VALID_ESCAPES};
pub use token::{Token, TokenKind, lookup_keyword};
