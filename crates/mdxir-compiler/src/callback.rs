//! Render-prop callbacks: recognising `x => ...` and splitting its body.
//!
//! A callback compiles to a lambda node when it takes one named parameter
//! and its body is markup, or a conditional choosing between markup, a
//! string or `null`. Everything else is reported back to the emitter, which
//! decides whether that is an error (content position) or not (props).

use crate::tokenizer::{markup_extent, opens_string, skip_string};
use mdxir_lexer::{Lexer, Token, TokenKind};
use mdxir_types::SourceText;
use std::ops::Range;

#[derive(Debug, PartialEq)]
pub(crate) enum ArrowShape<'s> {
    NotArrow,
    /// `x => body` or `(x) => body`.
    Single { parameter: String, body: Slice<'s> },
    /// An arrow function with no, several or destructured parameters.
    UnsupportedParameters,
}

#[derive(Debug, PartialEq)]
pub(crate) enum LambdaShape<'s> {
    Markup(Slice<'s>),
    Conditional {
        test: Slice<'s>,
        consequent: Branch<'s>,
        alternate: Branch<'s>,
    },
}

#[derive(Debug, PartialEq)]
pub(crate) enum Branch<'s> {
    Markup(Slice<'s>),
    Null,
    Text(String),
}

/// A piece of expression source and its offset from the start of the
/// enclosing expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Slice<'s> {
    pub source: &'s str,
    pub offset: usize,
}

impl<'s> Slice<'s> {
    pub(crate) fn new(source: &'s str, offset: usize) -> Self {
        Self { source, offset }
    }

    pub(crate) fn trim(self) -> Self {
        let start = self.source.len() - self.source.trim_start().len();
        Self {
            source: self.source.trim(),
            offset: self.offset + start,
        }
    }

    fn sub(self, range: Range<usize>) -> Self {
        Self {
            offset: self.offset + range.start,
            source: &self.source[range],
        }
    }

    /// Strip parentheses that wrap the whole slice: `((<p/>))` → `<p/>`.
    pub(crate) fn unparenthesize(self) -> Self {
        let mut slice = self.trim();
        while slice.source.starts_with('(')
            && find_top(slice.source, |_, b, depth| b == b')' && depth == 0)
                == Some(slice.source.len() - 1)
        {
            slice = slice.sub(1..slice.source.len() - 1).trim();
        }
        slice
    }

    /// Whether the slice is exactly one element or fragment.
    pub(crate) fn is_markup(&self) -> bool {
        self.source.starts_with('<') && markup_extent(self.source) == Some(self.source.len())
    }
}

fn tokens(source: &str) -> Vec<Token> {
    Lexer::new(&SourceText::new(source)).lex().tokens
}

fn single<'s>(source: &'s str, parameter: &str, arrow: &Token) -> ArrowShape<'s> {
    ArrowShape::Single {
        parameter: parameter.to_string(),
        body: Slice::new(&source[arrow.span.end..], arrow.span.end),
    }
}

/// Classify an expression (already trimmed) as an arrow function or not.
pub(crate) fn arrow_shape(source: &str) -> ArrowShape<'_> {
    let tokens = tokens(source);
    match tokens.as_slice() {
        [Token {
            kind: TokenKind::Identifier(parameter),
            ..
        }, arrow @ Token {
            kind: TokenKind::Arrow,
            ..
        }, ..] => single(source, parameter, arrow),
        [Token {
            kind: TokenKind::LParen,
            ..
        }, Token {
            kind: TokenKind::Identifier(parameter),
            ..
        }, Token {
            kind: TokenKind::RParen,
            ..
        }, arrow @ Token {
            kind: TokenKind::Arrow,
            ..
        }, ..] => single(source, parameter, arrow),
        [Token {
            kind: TokenKind::LParen,
            ..
        }, rest @ ..] => {
            let mut depth = 1usize;
            for (i, token) in rest.iter().enumerate() {
                match token.kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            return match rest.get(i + 1).map(|t| &t.kind) {
                                Some(TokenKind::Arrow) => ArrowShape::UnsupportedParameters,
                                _ => ArrowShape::NotArrow,
                            };
                        }
                    }
                    _ => {}
                }
            }
            ArrowShape::NotArrow
        }
        _ => ArrowShape::NotArrow,
    }
}

/// Split a callback body into one of the supported shapes, or explain why
/// it is not supported.
pub(crate) fn lambda_shape(body: Slice<'_>) -> Result<LambdaShape<'_>, &'static str> {
    let body = body.unparenthesize();
    if body.is_markup() {
        return Ok(LambdaShape::Markup(body));
    }
    let Some((test, consequent, alternate)) = split_conditional(body) else {
        return Err("the body must be markup or a conditional choosing between markup");
    };
    Ok(LambdaShape::Conditional {
        test,
        consequent: branch(consequent)?,
        alternate: branch(alternate)?,
    })
}

fn branch(slice: Slice<'_>) -> Result<Branch<'_>, &'static str> {
    let slice = slice.unparenthesize();
    if slice.is_markup() {
        return Ok(Branch::Markup(slice));
    }
    if matches!(slice.source, "null" | "undefined") {
        return Ok(Branch::Null);
    }
    if let [Token {
        kind: TokenKind::String(text),
        ..
    }, Token {
        kind: TokenKind::Eof,
        ..
    }] = tokens(slice.source).as_slice()
    {
        return Ok(Branch::Text(text.clone()));
    }
    if split_conditional(slice).is_some() {
        return Err("nested conditionals are not supported");
    }
    Err("each branch must be markup, a string or null")
}

/// Split `test ? consequent : alternate` at its top-level operators.
fn split_conditional(slice: Slice<'_>) -> Option<(Slice<'_>, Slice<'_>, Slice<'_>)> {
    let bytes = slice.source.as_bytes();
    let question = find_top(slice.source, |i, _, depth| {
        depth == 0 && is_conditional_question(bytes, i)
    })?;
    let after = question + 1;
    let mut nested = 0usize;
    let colon = after
        + find_top(&slice.source[after..], |i, b, depth| {
            if depth != 0 {
                return false;
            }
            match b {
                b'?' if is_conditional_question(bytes, after + i) => {
                    nested += 1;
                    false
                }
                b':' if nested == 0 => true,
                b':' => {
                    nested -= 1;
                    false
                }
                _ => false,
            }
        })?;
    Some((
        slice.sub(0..question).trim(),
        slice.sub(after..colon).trim(),
        slice.sub(colon + 1..slice.source.len()).trim(),
    ))
}

/// `?` as the conditional operator, not part of `??` or `?.`.
fn is_conditional_question(bytes: &[u8], i: usize) -> bool {
    if bytes.get(i) != Some(&b'?') || (i > 0 && bytes[i - 1] == b'?') {
        return false;
    }
    match bytes.get(i + 1) {
        Some(b'?') => false,
        // `a?.5:1` is a conditional
        Some(b'.') => bytes.get(i + 2).is_some_and(u8::is_ascii_digit),
        _ => true,
    }
}

/// Walk `s` outside string literals and embedded markup, calling `visit`
/// with each byte offset, the byte and its bracket depth (closers report
/// the depth they return to). Returns the first offset `visit` accepts.
fn find_top(s: &str, mut visit: impl FnMut(usize, u8, usize) -> bool) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut prev = b'(';
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if matches!(b, b'"' | b'\'' | b'`') {
            i = skip_string(bytes, i)?;
            prev = b'"';
            continue;
        }
        if b == b'<' && opens_string(prev) {
            if let Some(len) = markup_extent(&s[i..]) {
                i += len;
                prev = b'>';
                continue;
            }
        }
        if matches!(b, b')' | b']' | b'}') {
            depth = depth.saturating_sub(1);
        }
        if visit(i, b, depth) {
            return Some(i);
        }
        if matches!(b, b'(' | b'[' | b'{') {
            depth += 1;
        }
        if !b.is_ascii_whitespace() {
            prev = b;
        }
        i += 1;
    }
    None
}
