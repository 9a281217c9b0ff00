//! Core parser infrastructure: token cursor, error reporting, helpers.

use mdxir_lexer::token::{Token, TokenKind};
use mdxir_types::ast::{Expr, Ident};
use mdxir_types::{Diagnostics, ErrorCode, ParseError, SourceText, Span};

/// Maximum nesting depth of a single expression.
pub const MAX_DEPTH: u32 = 64;

/// Parser for the restricted expression grammar.
///
/// Consumes a token stream produced by the lexer and builds one [`Expr`].
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src SourceText,
    errors: Diagnostics,
    /// Current nesting depth, bounded by [`MAX_DEPTH`].
    pub(crate) depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    pub expr: Option<Expr>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source: &'src SourceText) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            errors: Diagnostics::empty(),
            depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the kind of the current token, `Eof` past the end.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.look_ahead(0)
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(0, 1, 1),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(token) => token.span,
            None => Span::point(self.source.text.len(), 1, 1),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a closing token such as `)` or `]`.
    ///
    /// When the offending token is syntax the grammar refuses, the error
    /// explains that instead of reporting a bare mismatch.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            if !self.report_refused_syntax() {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected {}, got {}", expected, self.peek_kind()),
                );
            }
            None
        }
    }

    /// Expect a property name after `.` or `?.`.
    ///
    /// Reserved words and literal words are valid property names.
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let name = match self.peek_kind().clone() {
            TokenKind::Identifier(name) | TokenKind::Reserved(name) => name,
            TokenKind::True => "true".to_string(),
            TokenKind::False => "false".to_string(),
            TokenKind::Null => "null".to_string(),
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected property name, got {}", self.peek_kind()),
                );
                return None;
            }
        };
        let span = self.advance();
        Some(Ident::new(name, span))
    }

    // ── Depth Tracking ────────────────────────────────────────────────────────

    /// Enter one nesting level; reports an error past [`MAX_DEPTH`].
    pub(crate) fn enter(&mut self) -> bool {
        self.enter_or(|| format!("maximum expression nesting depth is {MAX_DEPTH}"))
    }

    fn enter_or(&mut self, message: impl FnOnce() -> String) -> bool {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.error_at_current(ErrorCode::NESTING_LIMIT, message());
            self.depth -= 1;
            return false;
        }
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// One more level of a left-nested operator or postfix chain.
    ///
    /// A failed parse is abandoned, so only the success path calls
    /// [`Parser::unnest`].
    pub(crate) fn nest(&mut self, levels: &mut u32) -> Option<()> {
        if !self.enter_or(|| format!("operator chain too long: at most {MAX_DEPTH} links are allowed")) {
            return None;
        }
        *levels += 1;
        Some(())
    }

    pub(crate) fn unnest(&mut self, levels: u32) {
        self.depth = self.depth.saturating_sub(levels);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let error = self.make_error(code, message, span);
        self.errors.push_error(error);
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let error = self.make_error(code, message, span).with_suggestion(suggestion);
        self.errors.push_error(error);
    }

    fn make_error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> ParseError {
        let source_line = self.source.line(span.line).unwrap_or("").to_string();
        ParseError::new(code, message, span, source_line)
    }

    /// Report the current token if it starts syntax outside the grammar.
    ///
    /// Returns `true` if an error was reported.
    pub(crate) fn report_refused_syntax(&mut self) -> bool {
        let span = self.current_span();
        let code = ErrorCode::UNSUPPORTED_SYNTAX;
        match self.peek_kind().clone() {
            TokenKind::Eq | TokenKind::AssignOp(_) => self.error_with_suggestion(
                code,
                "assignment is not supported in expressions",
                span,
                "use `===` to compare values",
            ),
            TokenKind::PlusPlus | TokenKind::MinusMinus => self.error_at(
                code,
                "increment and decrement operators are not supported",
                span,
            ),
            TokenKind::Arrow => self.error_at(
                code,
                "arrow functions are not supported in expressions",
                span,
            ),
            TokenKind::Semicolon => self.error_at(
                code,
                "statements are not supported; an expression must be a single value",
                span,
            ),
            TokenKind::Bitwise(op) => self.error_with_suggestion(
                code,
                format!("bitwise operator `{op}` is not supported"),
                span,
                "use `&&`, `||` or `!` for logic",
            ),
            TokenKind::StarStar => self.error_at(
                code,
                "the exponent operator `**` is not supported",
                span,
            ),
            TokenKind::LBrace => self.error_at(
                code,
                "object literals and blocks are not supported in expressions",
                span,
            ),
            TokenKind::DotDotDot => {
                self.error_at(code, "spread syntax is not supported", span)
            }
            TokenKind::Reserved(word) => self.error_at(
                code,
                format!("`{word}` is not supported in expressions"),
                span,
            ),
            _ => return false,
        }
        true
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream as exactly one expression.
    pub fn parse(mut self) -> ParseResult {
        if self.at_end() {
            self.error_at_current(ErrorCode::EMPTY_EXPRESSION, "expected an expression");
            return ParseResult {
                expr: None,
                errors: self.errors,
            };
        }

        let expr = self.parse_expression();
        if expr.is_some() && !self.at_end() && !self.report_refused_syntax() {
            self.error_at_current(
                ErrorCode::TRAILING_INPUT,
                format!("unexpected {} after the end of the expression", self.peek_kind()),
            );
        }

        ParseResult {
            expr: if self.errors.has_errors() { None } else { expr },
            errors: self.errors,
        }
    }
}
