//! Token types for the expression lexer.
//!
//! The token set covers the JavaScript expression syntax an author is likely
//! to write, including constructs the grammar refuses (assignment, arrows,
//! object braces, statements). Lexing them as real tokens lets the parser
//! explain *why* an expression is rejected instead of failing on a stray
//! character.

use mdxir_types::Span;
use std::fmt;

/// JavaScript reserved words that may not be used as identifiers.
///
/// `true`, `false` and `null` are literals and not listed here. `undefined`
/// is an ordinary identifier, as in JavaScript.
pub const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "export", "extends", "finally",
    "for", "function", "if", "import", "in", "instanceof", "let", "new", "return",
    "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while",
    "with", "yield",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────
    Number(f64),
    /// String literal with escapes already decoded.
    String(String),
    True,
    False,
    Null,

    // ── Names ────────────────────────────────────────────────
    Identifier(String),
    /// A reserved word such as `new` or `typeof`.
    Reserved(String),

    // ── Arithmetic ───────────────────────────────────────────
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `**`
    StarStar,

    // ── Comparison ───────────────────────────────────────────
    /// `===`
    EqEqEq,
    /// `!==`
    BangEqEq,
    EqEq,
    BangEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    // ── Logical ──────────────────────────────────────────────
    Bang,
    AmpAmp,
    PipePipe,
    QuestionQuestion,
    Question,
    /// `?.`
    QuestionDot,
    Colon,

    // ── Refused operators ────────────────────────────────────
    /// `=`
    Eq,
    /// `+=`, `??=`, `<<=`, ...
    AssignOp(&'static str),
    PlusPlus,
    MinusMinus,
    /// `=>`
    Arrow,
    /// `&`, `|`, `^`, `~`, `<<`, `>>`, `>>>`
    Bitwise(&'static str),

    // ── Punctuation ──────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    DotDotDot,
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Map a scanned word to its literal or reserved-word token.
    pub fn from_word(word: &str) -> Option<TokenKind> {
        match word {
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ if RESERVED_WORDS.contains(&word) => Some(TokenKind::Reserved(word.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Number(n) => return write!(f, "number {n}"),
            TokenKind::String(s) => return write!(f, "string {s:?}"),
            TokenKind::Identifier(name) => return write!(f, "identifier `{name}`"),
            TokenKind::Reserved(word) => return write!(f, "`{word}`"),
            TokenKind::AssignOp(op) | TokenKind::Bitwise(op) => return write!(f, "`{op}`"),
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::EqEqEq => "===",
            TokenKind::BangEqEq => "!==",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::Bang => "!",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Question => "?",
            TokenKind::QuestionDot => "?.",
            TokenKind::Colon => ":",
            TokenKind::Eq => "=",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Arrow => "=>",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::DotDotDot => "...",
            TokenKind::Semicolon => ";",
            TokenKind::Eof => return write!(f, "end of expression"),
        };
        write!(f, "`{text}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_words() {
        assert_eq!(TokenKind::from_word("null"), Some(TokenKind::Null));
        assert_eq!(TokenKind::from_word("true"), Some(TokenKind::True));
        assert_eq!(
            TokenKind::from_word("typeof"),
            Some(TokenKind::Reserved("typeof".into()))
        );
        assert_eq!(TokenKind::from_word("undefined"), None);
        assert_eq!(TokenKind::from_word("user"), None);
    }

    #[test]
    fn display_quotes_symbols() {
        assert_eq!(TokenKind::EqEqEq.to_string(), "`===`");
        assert_eq!(TokenKind::Eof.to_string(), "end of expression");
        assert_eq!(
            TokenKind::Identifier("x".into()).to_string(),
            "identifier `x`"
        );
    }
}
