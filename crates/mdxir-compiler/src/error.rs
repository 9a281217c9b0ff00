//! Compile errors.

use mdxir_types::{DecodeError, ParseError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("line {line}: expected </{expected}> (opened on line {opened}), found </{found}>")]
    MismatchedTag {
        line: u32,
        found: String,
        expected: String,
        opened: u32,
    },
    #[error("line {line}: closing tag </{tag}> has no matching open tag")]
    UnmatchedClose { line: u32, tag: String },
    #[error("line {line}: <{tag}> is never closed")]
    Unclosed { line: u32, tag: String },
    #[error("invalid frontmatter: {0}")]
    Frontmatter(String),
    #[error("document has no slug; set one in the compile options or in frontmatter")]
    MissingSlug,
    /// A callback child outside the supported shapes.
    #[error("line {line}: unsupported callback `{callback}`: {reason}")]
    UnsupportedCallback {
        line: u32,
        callback: String,
        reason: String,
    },
    #[error("line {line}: invalid callback condition `{test}`: {error}")]
    InvalidCallbackTest {
        line: u32,
        test: String,
        #[source]
        error: ParseError,
    },
    /// Only reported when expressions are checked at compile time.
    #[error("line {line}: invalid expression `{expression}`: {error}")]
    InvalidExpression {
        line: u32,
        expression: String,
        #[source]
        error: ParseError,
    },
    #[error("compiled document is invalid: {0}")]
    Document(#[from] DecodeError),
}

pub type CompileResult<T> = Result<T, CompileError>;
