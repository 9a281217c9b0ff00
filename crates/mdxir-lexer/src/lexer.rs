//! Expression lexer: converts expression source text to a token stream.
//!
//! Features:
//! - Number literals (decimal, fraction, exponent, `0x`/`0o`/`0b`)
//! - Single- and double-quoted strings with JavaScript escapes
//! - Line (`//`) and block (`/* */`) comments treated as whitespace
//! - Template strings rejected with a suggestion
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use mdxir_types::{Diagnostics, ErrorCode, ParseError, SourceText, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    text: &'src str,
    source: &'src SourceText,
    /// Current byte offset into `text`.
    pos: usize,
    line: u32,
    col: u32,
    errors: Diagnostics,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src SourceText) -> Self {
        Self {
            text: &source.text,
            source,
            pos: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
        }
    }

    /// Lex the entire expression into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume `expected` if it is the next character.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.pos, self.line, self.col)
    }

    fn span_from(&self, start: usize, line: u32, col: u32) -> Span {
        Span::new(start, self.pos, line, col)
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let line = self.source.line(span.line).unwrap_or("").to_string();
        self.errors
            .push_error(ParseError::new(code, message, span, line));
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let line = self.source.line(span.line).unwrap_or("").to_string();
        self.errors
            .push_error(ParseError::new(code, message, span, line).with_suggestion(suggestion));
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace (newlines included) and comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start, line, col);
                    self.emit_error(ErrorCode::UNTERMINATED_COMMENT, "Unterminated comment", span);
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        // If we've hit the error cap, stop immediately
        if self.errors.total_errors >= MAX_ERRORS {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let (start, line, col) = (self.pos, self.line, self.col);
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            '"' | '\'' => return self.scan_string(ch, start, line, col),
            '0'..='9' => return self.scan_number(start, line, col),
            '.' if matches!(self.peek(), Some('0'..='9')) => {
                return self.scan_number(start, line, col)
            }
            c if c == '$' || c == '_' || c.is_alphabetic() => {
                return self.scan_word(start, line, col)
            }
            '`' => {
                self.skip_template();
                let span = self.span_from(start, line, col);
                self.emit_error_with_suggestion(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "Template strings are not supported",
                    span,
                    "concatenate with `+` instead",
                );
                return self.scan_token();
            }

            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::AssignOp("+=")
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::AssignOp("-=")
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        TokenKind::AssignOp("**=")
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.eat('=') {
                    TokenKind::AssignOp("*=")
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::AssignOp("/=")
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::AssignOp("%=")
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::AssignOp("<<=")
                    } else {
                        TokenKind::Bitwise("<<")
                    }
                } else if self.eat('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') {
                            TokenKind::AssignOp(">>>=")
                        } else {
                            TokenKind::Bitwise(">>>")
                        }
                    } else if self.eat('=') {
                        TokenKind::AssignOp(">>=")
                    } else {
                        TokenKind::Bitwise(">>")
                    }
                } else if self.eat('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            '&' => {
                if self.eat('&') {
                    if self.eat('=') {
                        TokenKind::AssignOp("&&=")
                    } else {
                        TokenKind::AmpAmp
                    }
                } else if self.eat('=') {
                    TokenKind::AssignOp("&=")
                } else {
                    TokenKind::Bitwise("&")
                }
            }
            '|' => {
                if self.eat('|') {
                    if self.eat('=') {
                        TokenKind::AssignOp("||=")
                    } else {
                        TokenKind::PipePipe
                    }
                } else if self.eat('=') {
                    TokenKind::AssignOp("|=")
                } else {
                    TokenKind::Bitwise("|")
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::AssignOp("^=")
                } else {
                    TokenKind::Bitwise("^")
                }
            }
            '~' => TokenKind::Bitwise("~"),
            '?' => {
                if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::AssignOp("??=")
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('0'..='9'))
                {
                    // `a?.5:1` is a conditional, not optional access
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,

            _ => {
                let span = self.span_from(start, line, col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Unexpected character '{ch}'"),
                    span,
                );
                // Error recovery: skip the character and try again
                return self.scan_token();
            }
        };

        Token::new(kind, self.span_from(start, line, col))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize, line: u32, col: u32) -> Token {
        let first = self.text[start..].chars().next();
        let radix = match (first, self.peek()) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.advance();
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_digit(radix)) {
                self.advance();
            }
            u64::from_str_radix(&self.text[digits_start..self.pos], radix)
                .ok()
                .map(|n| n as f64)
        } else {
            self.scan_decimal_digits();
            if self.peek() == Some('.') && !self.text[start..self.pos].contains('.') {
                self.advance();
                self.scan_decimal_digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let exponent_ok = match (self.peek_at(1), self.peek_at(2)) {
                    (Some('0'..='9'), _) => true,
                    (Some('+' | '-'), Some('0'..='9')) => true,
                    _ => false,
                };
                if exponent_ok {
                    self.advance();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.advance();
                    }
                    self.scan_decimal_digits();
                } else {
                    self.advance();
                }
            }
            self.text[start..self.pos].parse::<f64>().ok()
        };

        // `3in`, `0x`, `1e` are all malformed
        let glued = matches!(self.peek(), Some(c) if c == '$' || c == '_' || c.is_alphanumeric());
        while matches!(self.peek(), Some(c) if c == '$' || c == '_' || c.is_alphanumeric()) {
            self.advance();
        }

        let span = self.span_from(start, line, col);
        match value {
            Some(n) if !glued => Token::new(TokenKind::Number(n), span),
            _ => {
                let text = self.text[start..self.pos].to_string();
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("Invalid number literal '{text}'"),
                    span,
                );
                Token::new(TokenKind::Number(f64::NAN), span)
            }
        }
    }

    fn scan_decimal_digits(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & words
    // ─────────────────────────────────────────────────────────────

    fn scan_word(&mut self, start: usize, line: u32, col: u32) -> Token {
        while matches!(self.peek(), Some(c) if c == '$' || c == '_' || c.is_alphanumeric()) {
            self.advance();
        }
        let word = &self.text[start..self.pos];
        let kind = TokenKind::from_word(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()));
        Token::new(kind, self.span_from(start, line, col))
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    fn scan_string(&mut self, quote: char, start: usize, line: u32, col: u32) -> Token {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start, line, col);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                        format!("close the string with {quote}"),
                    );
                    return Token::new(TokenKind::String(buf), span);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Token::new(TokenKind::String(buf), self.span_from(start, line, col));
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    ///
    /// Returns the decoded character, or `None` for a line continuation or
    /// an invalid sequence (error emitted).
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.advance();

        let decoded = match self.advance() {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('b') => Some('\u{8}'),
            Some('f') => Some('\u{c}'),
            Some('v') => Some('\u{b}'),
            Some('0') if !matches!(self.peek(), Some('0'..='9')) => Some('\0'),
            Some('\n') => return None,
            Some('x') => self.scan_hex_digits(2).and_then(char::from_u32),
            Some('u') => {
                if self.eat('{') {
                    let digits_start = self.pos;
                    while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                        self.advance();
                    }
                    let code = u32::from_str_radix(&self.text[digits_start..self.pos], 16).ok();
                    if self.eat('}') {
                        code.and_then(char::from_u32)
                    } else {
                        None
                    }
                } else {
                    self.scan_hex_digits(4).and_then(char::from_u32)
                }
            }
            Some(c @ '1'..='9') | Some(c @ '0') => {
                let span = self.span_from(start, line, col);
                self.emit_error(
                    ErrorCode::INVALID_ESCAPE,
                    format!("Octal escape sequences are not allowed ('\\{c}')"),
                    span,
                );
                return None;
            }
            // identity escape: `\'`, `\"`, `\\`, and any other character
            Some(c) => Some(c),
            None => None,
        };

        if decoded.is_none() {
            let span = self.span_from(start, line, col);
            self.emit_error(ErrorCode::INVALID_ESCAPE, "Invalid escape sequence", span);
        }
        decoded
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let digits_start = self.pos;
        for _ in 0..count {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.advance();
                }
                _ => return None,
            }
        }
        u32::from_str_radix(&self.text[digits_start..self.pos], 16).ok()
    }

    /// Skip the body of a template string after its opening backtick.
    fn skip_template(&mut self) {
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => {
                    self.advance();
                }
                '`' => return,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let src = SourceText::new(source);
        Lexer::new(&src)
            .lex()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn question_dot_before_digit_is_conditional() {
        assert_eq!(
            kinds("a?.5:1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Question,
                TokenKind::Number(0.5),
                TokenKind::Colon,
                TokenKind::Number(1.0),
            ]
        );
    }

    #[test]
    fn spans_carry_byte_offsets() {
        let src = SourceText::new("ab + \"é\"");
        let tokens = Lexer::new(&src).lex().tokens;
        assert_eq!(tokens[0].span, Span::new(0, 2, 1, 1));
        assert_eq!(tokens[1].span, Span::new(3, 4, 1, 4));
        assert_eq!(tokens[2].span.slice(&src.text), Some("\"é\""));
    }

    #[test]
    fn line_continuation_in_string() {
        assert_eq!(kinds("'a\\\nb'"), vec![TokenKind::String("ab".into())]);
    }
}
