//! Content tree → document nodes.

use crate::callback::{self, ArrowShape, Branch, LambdaShape, Slice};
use crate::content::{AttrValue, Attribute, ContentNode};
use crate::error::{CompileError, CompileResult};
use crate::literal::literal_prop;
use crate::markdown::{self, dedent, placeholder, Flow};
use crate::options::CompileOptions;
use crate::parser;
use crate::tokenizer::tokenize_fragment;
use mdxir_lexer::{Lexer, TokenKind};
use mdxir_types::{LambdaBody, Node, PropValue, Props, SourceText};
use tracing::debug;

pub(crate) struct Emitter<'a> {
    options: &'a CompileOptions,
    /// The whole document, for line numbers in errors.
    source: &'a SourceText,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(options: &'a CompileOptions, source: &'a SourceText) -> Self {
        Self { options, source }
    }

    fn line(&self, offset: usize) -> u32 {
        self.source.position(offset).0
    }

    /// Lower a run of top-level content nodes.
    pub(crate) fn emit_flow(&self, nodes: &[ContentNode], flow: Flow) -> CompileResult<Vec<Node>> {
        let mut text = String::new();
        let mut embeds = Vec::new();
        for node in nodes {
            match node {
                ContentNode::Markdown(markdown) => text.push_str(markdown),
                other => {
                    text.push_str(&placeholder(embeds.len()));
                    embeds.push(self.emit_node(other)?);
                }
            }
        }
        let text = match flow {
            Flow::Block => dedent(&text),
            Flow::Phrasing => text.as_str().into(),
        };
        Ok(markdown::lower(&text, embeds, flow, &self.options.markdown))
    }

    /// One content node becomes zero or more document nodes.
    pub(crate) fn emit_node(&self, node: &ContentNode) -> CompileResult<Vec<Node>> {
        match node {
            ContentNode::Markdown(_) => self.emit_flow(std::slice::from_ref(node), Flow::Phrasing),
            ContentNode::Expression { source, offset } => self.emit_expression(source, *offset),
            ContentNode::Element {
                name,
                attributes,
                children,
                inline,
                ..
            } => {
                let flow = if *inline { Flow::Phrasing } else { Flow::Block };
                let children = self.emit_flow(children, flow)?;
                if name.is_empty() {
                    return Ok(children);
                }
                let props = attributes
                    .iter()
                    .map(|attribute| Ok((attribute.name.clone(), self.emit_attribute(attribute)?)))
                    .collect::<CompileResult<Props>>()?;
                Ok(vec![Node::element_with(name.clone(), props, children)])
            }
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn emit_expression(&self, source: &str, offset: usize) -> CompileResult<Vec<Node>> {
        let slice = Slice::new(source, offset).trim();
        if is_blank(slice.source) {
            return Ok(Vec::new());
        }
        if let Some(nodes) = self.try_markup(slice)? {
            return Ok(nodes);
        }
        match callback::arrow_shape(slice.source) {
            ArrowShape::Single { parameter, body } => {
                let body = Slice::new(body.source, slice.offset + body.offset);
                return Ok(vec![self.emit_lambda(slice, parameter, body)?]);
            }
            ArrowShape::UnsupportedParameters => {
                return Err(CompileError::UnsupportedCallback {
                    line: self.line(slice.offset),
                    callback: slice.source.to_string(),
                    reason: "callbacks take exactly one named parameter".to_string(),
                });
            }
            ArrowShape::NotArrow => {}
        }
        if self.options.check_expressions {
            mdxir_parser::parse_expression(slice.source).map_err(|error| {
                CompileError::InvalidExpression {
                    line: self.line(slice.offset),
                    expression: slice.source.to_string(),
                    error,
                }
            })?;
        }
        Ok(vec![Node::expression(slice.source)])
    }

    /// Compile `slice` as markup when it is exactly one (possibly
    /// parenthesized) element or fragment.
    fn try_markup(&self, slice: Slice<'_>) -> CompileResult<Option<Vec<Node>>> {
        let slice = slice.unparenthesize();
        if !slice.is_markup() {
            return Ok(None);
        }
        let tree = parser::parse(tokenize_fragment(slice.source, slice.offset), self.source)?;
        self.emit_flow(&tree.nodes, Flow::Phrasing).map(Some)
    }

    fn emit_markup_node(&self, slice: Slice<'_>) -> CompileResult<Node> {
        let nodes = self.try_markup(slice)?.unwrap_or_default();
        Ok(single_node(nodes))
    }

    fn emit_lambda(&self, callback: Slice<'_>, parameter: String, body: Slice<'_>) -> CompileResult<Node> {
        let line = self.line(callback.offset);
        let shape = callback::lambda_shape(body).map_err(|reason| CompileError::UnsupportedCallback {
            line,
            callback: callback.source.to_string(),
            reason: reason.to_string(),
        })?;
        let body = match shape {
            LambdaShape::Markup(markup) => LambdaBody::Node {
                node: Box::new(self.emit_markup_node(markup)?),
            },
            LambdaShape::Conditional {
                test,
                consequent,
                alternate,
            } => {
                mdxir_parser::parse_expression(test.source).map_err(|error| {
                    CompileError::InvalidCallbackTest {
                        line: self.line(test.offset),
                        test: test.source.to_string(),
                        error,
                    }
                })?;
                LambdaBody::Conditional {
                    test: test.source.to_string(),
                    consequent: Box::new(self.emit_branch(consequent)?),
                    alternate: Box::new(self.emit_branch(alternate)?),
                }
            }
        };
        Ok(Node::Lambda { parameter, body })
    }

    fn emit_branch(&self, branch: Branch<'_>) -> CompileResult<Node> {
        match branch {
            Branch::Markup(markup) => self.emit_markup_node(markup),
            Branch::Null => Ok(Node::expression("null")),
            Branch::Text(text) => Ok(Node::text(text)),
        }
    }

    // ── Attributes ────────────────────────────────────────────────────────────

    fn emit_attribute(&self, attribute: &Attribute) -> CompileResult<PropValue> {
        let (source, offset) = match &attribute.value {
            None => return Ok(PropValue::Bool(true)),
            Some(AttrValue::String(value)) => return Ok(PropValue::String(value.clone())),
            Some(AttrValue::Expression { source, offset }) => (source, *offset),
        };
        let slice = Slice::new(source, offset).trim();

        if let Some(nodes) = self.try_markup(slice)? {
            return Ok(PropValue::Node(Box::new(single_node(nodes))));
        }
        if let ArrowShape::Single { parameter, body } = callback::arrow_shape(slice.source) {
            let body = Slice::new(body.source, slice.offset + body.offset);
            match self.emit_lambda(slice, parameter, body) {
                Ok(lambda) => return Ok(PropValue::Node(Box::new(lambda))),
                Err(error) => debug!(
                    prop = %attribute.name,
                    %error,
                    "callback prop kept as an expression"
                ),
            }
        }
        Ok(literal_prop(slice.source).unwrap_or_else(|| PropValue::Expression(slice.source.to_string())))
    }
}

/// Multiple nodes in a single-node position are grouped under a root.
fn single_node(mut nodes: Vec<Node>) -> Node {
    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return node;
        }
    }
    Node::Root { children: nodes }
}

/// Empty or comment-only expression source, such as `{/* note */}`.
fn is_blank(source: &str) -> bool {
    let lexed = Lexer::new(&SourceText::new(source)).lex();
    !lexed.errors.has_errors() && matches!(lexed.tokens.as_slice(), [t] if t.kind == TokenKind::Eof)
}
