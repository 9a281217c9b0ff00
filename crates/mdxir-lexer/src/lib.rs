//! mdxir lexer: converts embedded expression source into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer};
pub use token::{Token, TokenKind, RESERVED_WORDS};
