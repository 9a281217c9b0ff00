//! Runtime error types for evaluation and rendering.

use mdxir_types::ParseError;

/// Evaluation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// `__proto__`, `prototype` or `constructor`, reached by any route.
    #[error("access to property `{0}` is blocked")]
    BlockedProperty(String),
    /// A call to a name missing from the allow-list.
    #[error("call to `{0}` is not allowed")]
    CallNotAllowed(String),
    #[error("{0} is not supported")]
    Unsupported(String),
    /// A computed key that is neither a string nor a number.
    #[error("property key must be a string or number, got {0}")]
    InvalidPropertyKey(&'static str),
    /// An allowed host function reported an error.
    #[error("`{name}` failed: {message}")]
    CallFailed { name: String, message: String },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Rendering error. Any of these aborts the render.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown component `{0}`")]
    UnknownComponent(String),
    #[error("invalid expression `{expression}`: {error}")]
    Parse {
        expression: String,
        #[source]
        error: ParseError,
    },
    #[error("failed to evaluate `{expression}`: {error}")]
    Eval {
        expression: String,
        #[source]
        error: EvalError,
    },
    /// An expression in content position produced a value that cannot be
    /// shown, such as a plain object.
    #[error("{found} value cannot be rendered as content (at {key})")]
    InvalidContent { key: String, found: &'static str },
    #[error("component `{name}` failed: {message}")]
    Component { name: String, message: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
