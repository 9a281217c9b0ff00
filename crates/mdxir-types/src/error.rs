use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics kept before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Numeric diagnostic code for expression syntax errors (E100–E199).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNEXPECTED_CHARACTER: Self = Self(101);
    pub const UNTERMINATED_STRING: Self = Self(102);
    pub const INVALID_ESCAPE: Self = Self(103);
    pub const INVALID_NUMBER: Self = Self(104);
    pub const UNTERMINATED_COMMENT: Self = Self(105);
    /// Valid JavaScript that the restricted grammar refuses.
    pub const UNSUPPORTED_SYNTAX: Self = Self(110);
    pub const TRAILING_INPUT: Self = Self(111);
    pub const EMPTY_EXPRESSION: Self = Self(112);
    pub const NESTING_LIMIT: Self = Self(120);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured expression syntax error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// The source line containing `span`, for display.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ParseError {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a hint on how to rewrite the expression.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.span, self.code, self.message)?;
        if let Some(hint) = &self.suggestion {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Diagnostics collected by the lexer and parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<ParseError>,
    pub total_errors: usize,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Record an error, keeping at most [`MAX_ERRORS`].
    pub fn push_error(&mut self, error: ParseError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Fold another collection into this one.
    pub fn extend(&mut self, other: Diagnostics) {
        // errors dropped past the cap in `other` still count
        let dropped = other.total_errors.saturating_sub(other.errors.len());
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += dropped;
    }
}

/// Failure to accept a serialized document.
///
/// Every variant that concerns a field names its path from the document
/// root, e.g. `root.children[2].props.title`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("document is not valid JSON: {0}")]
    Syntax(String),

    #[error("document could not be encoded: {0}")]
    Encode(String),

    #[error("unsupported schemaVersion {found}, expected 1")]
    SchemaVersion { found: String },

    #[error("{path}: expected {expected}, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: missing required field")]
    Missing { path: String },

    #[error("{path}: unknown field `{field}`")]
    UnknownField { path: String, field: String },

    #[error("{path}: unknown node type `{tag}`")]
    UnknownNodeType { path: String, tag: String },

    #[error("{path}: unknown prop value type `{tag}`")]
    UnknownPropType { path: String, tag: String },

    #[error("{path}: unknown lambda body kind `{kind}`")]
    UnknownLambdaKind { path: String, kind: String },

    #[error("{path}: must not be empty")]
    Empty { path: String },

    #[error("{path}: invalid timestamp: {reason}")]
    Timestamp { path: String, reason: String },

    #[error("{path}: number must be finite")]
    NonFinite { path: String },
}
