//! mysqldump lexing, parsing and CockroachDB dialect rules.

pub mod dialect;
mod lexer;
mod parser;
pub mod types;

pub use lexer::{LexError, Lexer, Position, Span, Token, TokenKind};
pub use parser::{ParseError, ParseReason, parse_sql};
