//! mdxir compiler: MDX source to the versioned document IR.
//!
//! Compilation runs in four steps:
//! - tokenize: frontmatter, module lines, tags, `{...}` expressions, markdown
//! - parse: match tags into a [`ContentTree`]
//! - emit: lower markdown with pulldown-cmark, compile callbacks and props
//! - check: validate the finished [`Document`] against the codec

mod callback;
mod emit;
mod frontmatter;
mod literal;
mod markdown;
pub mod content;
pub mod error;
pub mod options;
pub mod parser;
pub mod tokenizer;

pub use content::{AttrValue, Attribute, ContentNode, ContentTree};
pub use error::{CompileError, CompileResult};
pub use options::{CompileOptions, MarkdownOptions};

use chrono::Utc;
use emit::Emitter;
use markdown::Flow;
use mdxir_types::{codec, Document, Frontmatter, Node, SourceText};
use tracing::{debug, instrument};

/// Compile MDX source into a document.
#[instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn compile(source: &str, options: &CompileOptions) -> CompileResult<Document> {
    let text = SourceText::new(source);
    let tree = parser::parse(tokenizer::tokenize(source), &text)?;
    build(&tree, options, &text)
}

/// Compile an already-parsed content tree. Line numbers in errors count
/// from the start of `source`.
pub fn compile_tree(tree: &ContentTree, options: &CompileOptions, source: &str) -> CompileResult<Document> {
    build(tree, options, &SourceText::new(source))
}

/// Compile one content node into zero or more document nodes.
pub fn emit_node(node: &ContentNode, options: &CompileOptions) -> CompileResult<Vec<Node>> {
    let source = SourceText::new("");
    Emitter::new(options, &source).emit_node(node)
}

fn build(tree: &ContentTree, options: &CompileOptions, text: &SourceText) -> CompileResult<Document> {
    let frontmatter = match &tree.frontmatter {
        Some(yaml) => frontmatter::parse(yaml)?,
        None => Frontmatter::new(),
    };
    let slug = options
        .slug
        .clone()
        .or_else(|| frontmatter.get("slug").and_then(|v| v.as_str()).map(str::to_string))
        .filter(|slug| !slug.is_empty())
        .ok_or(CompileError::MissingSlug)?;

    let children = Emitter::new(options, text).emit_flow(&tree.nodes, Flow::Block)?;
    let compiled_at = options.compiled_at.unwrap_or_else(Utc::now);
    let document = Document::new(slug, compiled_at, Node::Root { children }).with_frontmatter(frontmatter);
    codec::check(&document)?;

    debug!(slug = %document.slug, nodes = document.root.count(), "compiled document");
    Ok(document)
}
