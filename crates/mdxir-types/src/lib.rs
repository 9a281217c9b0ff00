//! Shared types for mdxir.
//!
//! This crate defines the compiled document IR and its codec, the
//! expression AST, source spans and the error types used by every other
//! crate in the workspace.

mod error;
mod span;
pub mod ast;
pub mod codec;
pub mod document;

pub use document::{Document, Frontmatter, LambdaBody, Node, PropValue, Props, SCHEMA_VERSION};
pub use error::{DecodeError, Diagnostics, ErrorCode, ParseError, MAX_ERRORS};
pub use span::{SourceText, Span};
