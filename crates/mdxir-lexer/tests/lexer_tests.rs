//! Lexer tests: literals, operators, refused syntax, comments, error
//! recovery and determinism.

use mdxir_lexer::{Lexer, TokenKind, RESERVED_WORDS};
use mdxir_types::{ErrorCode, SourceText};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let src = SourceText::new(source);
    Lexer::new(&src)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

fn error_count(source: &str) -> usize {
    let src = SourceText::new(source);
    Lexer::new(&src).lex().errors.total_errors
}

fn first_error(source: &str) -> (ErrorCode, String) {
    let src = SourceText::new(source);
    let result = Lexer::new(&src).lex();
    result
        .errors
        .first()
        .map(|e| (e.code, e.message.clone()))
        .unwrap_or((ErrorCode(0), String::new()))
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn numbers() {
    assert_eq!(
        kinds("0 42 3.25 .5 1e3 2.5E-2 0xff 0b101 0o17"),
        vec![
            TokenKind::Number(0.0),
            TokenKind::Number(42.0),
            TokenKind::Number(3.25),
            TokenKind::Number(0.5),
            TokenKind::Number(1000.0),
            TokenKind::Number(0.025),
            TokenKind::Number(255.0),
            TokenKind::Number(5.0),
            TokenKind::Number(15.0),
        ]
    );
}

#[test]
fn malformed_numbers() {
    assert_eq!(first_error("3in").0, ErrorCode::INVALID_NUMBER);
    assert_eq!(first_error("1e").0, ErrorCode::INVALID_NUMBER);
    assert_eq!(first_error("0x").0, ErrorCode::INVALID_NUMBER);
}

#[test]
fn strings_with_both_quotes_and_escapes() {
    assert_eq!(
        kinds(r#"'it\'s' "say \"hi\"" 'tab\there' "A\u{1F600}\x42""#),
        vec![
            TokenKind::String("it's".into()),
            TokenKind::String("say \"hi\"".into()),
            TokenKind::String("tab\there".into()),
            TokenKind::String("A\u{1F600}B".into()),
        ]
    );
}

#[test]
fn unicode_string_content() {
    assert_eq!(kinds("'héllo wörld'"), vec![TokenKind::String("héllo wörld".into())]);
}

#[test]
fn unterminated_string() {
    let (code, message) = first_error("'abc");
    assert_eq!(code, ErrorCode::UNTERMINATED_STRING);
    assert_eq!(message, "Unterminated string literal");
}

#[test]
fn invalid_escapes() {
    assert_eq!(first_error(r"'\u12'").0, ErrorCode::INVALID_ESCAPE);
    assert_eq!(first_error(r"'\x4'").0, ErrorCode::INVALID_ESCAPE);
    assert_eq!(first_error(r"'\01'").0, ErrorCode::INVALID_ESCAPE);
}

#[test]
fn literal_words() {
    assert_eq!(
        kinds("true false null undefined"),
        vec![
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            ident("undefined"),
        ]
    );
}

#[test]
fn identifiers_allow_dollar_underscore_and_unicode() {
    assert_eq!(
        kinds("$el _private café x1"),
        vec![ident("$el"), ident("_private"), ident("café"), ident("x1")]
    );
}

#[test]
fn every_reserved_word_is_reserved() {
    for word in RESERVED_WORDS {
        assert_eq!(
            kinds(word),
            vec![TokenKind::Reserved(word.to_string())],
            "word {word}"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn comparison_operators() {
    assert_eq!(
        kinds("=== !== == != < <= > >="),
        vec![
            TokenKind::EqEqEq,
            TokenKind::BangEqEq,
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::Less,
            TokenKind::LessEq,
            TokenKind::Greater,
            TokenKind::GreaterEq,
        ]
    );
}

#[test]
fn logical_and_optional_operators() {
    assert_eq!(
        kinds("a && b || c ?? d ? e : f?.g"),
        vec![
            ident("a"),
            TokenKind::AmpAmp,
            ident("b"),
            TokenKind::PipePipe,
            ident("c"),
            TokenKind::QuestionQuestion,
            ident("d"),
            TokenKind::Question,
            ident("e"),
            TokenKind::Colon,
            ident("f"),
            TokenKind::QuestionDot,
            ident("g"),
        ]
    );
}

#[test]
fn refused_operators_are_still_tokens() {
    assert_eq!(
        kinds("= += ??= ++ -- => ** & | ^ ~ << >> >>>"),
        vec![
            TokenKind::Eq,
            TokenKind::AssignOp("+="),
            TokenKind::AssignOp("??="),
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::Arrow,
            TokenKind::StarStar,
            TokenKind::Bitwise("&"),
            TokenKind::Bitwise("|"),
            TokenKind::Bitwise("^"),
            TokenKind::Bitwise("~"),
            TokenKind::Bitwise("<<"),
            TokenKind::Bitwise(">>"),
            TokenKind::Bitwise(">>>"),
        ]
    );
}

#[test]
fn punctuation() {
    assert_eq!(
        kinds("( ) [ ] { } , . ... ;"),
        vec![
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::DotDotDot,
            TokenKind::Semicolon,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Trivia
// ─────────────────────────────────────────────────────────────────────

#[test]
fn comments_and_newlines_are_whitespace() {
    assert_eq!(
        kinds("a // trailing\n + /* inline */ b\n"),
        vec![ident("a"), TokenKind::Plus, ident("b")]
    );
}

#[test]
fn comment_only_source_is_empty() {
    assert_eq!(kinds("/* just a note */"), vec![]);
}

#[test]
fn unterminated_block_comment() {
    assert_eq!(first_error("a /* never").0, ErrorCode::UNTERMINATED_COMMENT);
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn template_strings_are_rejected() {
    let src = SourceText::new("`hi ${name}` + 1");
    let result = Lexer::new(&src).lex();
    let err = result.errors.first().cloned();
    assert_eq!(err.as_ref().map(|e| e.code), Some(ErrorCode::UNSUPPORTED_SYNTAX));
    assert_eq!(
        err.and_then(|e| e.suggestion),
        Some("concatenate with `+` instead".to_string())
    );
    // scanning resumes after the closing backtick
    let kinds: Vec<_> = result.tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Plus, TokenKind::Number(1.0), TokenKind::Eof]
    );
}

#[test]
fn unexpected_characters_recover() {
    assert_eq!(kinds("a # b @ c"), vec![ident("a"), ident("b"), ident("c")]);
    assert_eq!(error_count("a # b @ c"), 2);
    assert_eq!(first_error("#").1, "Unexpected character '#'");
}

#[test]
fn error_cap_stops_lexing() {
    let source = "#".repeat(500);
    let src = SourceText::new(source.as_str());
    let result = Lexer::new(&src).lex();
    assert_eq!(result.errors.errors.len(), mdxir_types::MAX_ERRORS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

#[test]
fn error_carries_source_line() {
    let src = SourceText::new("a +\n  #");
    let result = Lexer::new(&src).lex();
    let err = result.errors.first().cloned().unwrap();
    assert_eq!(err.source_line, "  #");
    assert_eq!((err.span.line, err.span.col), (2, 3));
}

#[test]
fn determinism_100_iterations() {
    let source = "user?.profile['name'] ?? (count > 1 ? 'many' : 'one')";
    let first = kinds(source);
    for i in 0..100 {
        assert_eq!(kinds(source), first, "Determinism failure at iteration {i}");
    }
}
