//! mdxir parser: turns embedded expression source into an AST.
//!
//! The grammar is a small, side-effect-free subset of JavaScript expression
//! syntax. Everything outside it is rejected here, with a message that says
//! which construct was refused.

mod parse_expr;
mod parser;

pub use parser::{ParseResult, Parser, MAX_DEPTH};

use mdxir_lexer::Lexer;
use mdxir_types::ast::Expr;
use mdxir_types::{Diagnostics, ErrorCode, ParseError, SourceText, Span};
use tracing::trace;

/// Parse `source` as one expression, reporting the first diagnostic.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let (expr, diagnostics) = parse_with_diagnostics(source);
    match (expr, diagnostics.first()) {
        (Some(expr), None) => Ok(expr),
        (_, Some(error)) => Err(error.clone()),
        (None, None) => Err(ParseError::new(
            ErrorCode::UNEXPECTED_TOKEN,
            "invalid expression",
            Span::point(0, 1, 1),
            SourceText::new(source).line(1).unwrap_or(""),
        )),
    }
}

/// Parse `source` and return every diagnostic found along the way.
///
/// Lexer diagnostics come first, followed by the parser's.
pub fn parse_with_diagnostics(source: &str) -> (Option<Expr>, Diagnostics) {
    let src = SourceText::new(source);
    let lexed = Lexer::new(&src).lex();
    let parsed = Parser::new(lexed.tokens, &src).parse();

    let mut diagnostics = lexed.errors;
    diagnostics.extend(parsed.errors);
    if diagnostics.has_errors() {
        trace!(source, errors = diagnostics.total_errors, "expression rejected");
        return (None, diagnostics);
    }
    (parsed.expr, diagnostics)
}
