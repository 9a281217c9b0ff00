//! Tag tree parser: matches open and close tags into a [`ContentTree`].

use crate::content::{ContentNode, ContentTree};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::Token;
use mdxir_types::SourceText;
use tracing::trace;

/// Build the content tree for a token stream. `source` is the whole
/// document, used to turn offsets into line numbers.
pub fn parse(tokens: Vec<Token>, source: &SourceText) -> CompileResult<ContentTree> {
    let mut parser = Parser {
        tokens: tokens.into_iter(),
        source,
        frontmatter: None,
    };
    let nodes = parser.parse_nodes(None)?;
    Ok(ContentTree {
        frontmatter: parser.frontmatter,
        nodes,
    })
}

struct Parser<'a> {
    tokens: std::vec::IntoIter<Token>,
    source: &'a SourceText,
    frontmatter: Option<String>,
}

/// An open tag waiting for its close tag.
struct OpenElement<'n> {
    name: &'n str,
    offset: usize,
}

impl Parser<'_> {
    fn line(&self, offset: usize) -> u32 {
        self.source.position(offset).0
    }

    /// Parse nodes until the close tag of `open`, or the end of input at the
    /// top level.
    fn parse_nodes(&mut self, open: Option<OpenElement<'_>>) -> CompileResult<Vec<ContentNode>> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            match token {
                Token::Frontmatter(yaml) => self.frontmatter = Some(yaml),
                Token::Module(statement) => trace!(%statement, "dropping module statement"),
                Token::Markdown(text) => nodes.push(ContentNode::Markdown(text)),
                Token::Expression { source, offset } => {
                    nodes.push(ContentNode::Expression { source, offset })
                }
                Token::OpenTag {
                    name,
                    attributes,
                    self_closing,
                    offset,
                } => {
                    let children = if self_closing {
                        Vec::new()
                    } else {
                        self.parse_nodes(Some(OpenElement {
                            name: &name,
                            offset,
                        }))?
                    };
                    let inline = !children
                        .iter()
                        .any(|c| matches!(c, ContentNode::Markdown(text) if text.contains('\n')));
                    nodes.push(ContentNode::Element {
                        name,
                        attributes,
                        children,
                        inline,
                        offset,
                    });
                }
                Token::CloseTag { name, offset } => {
                    return match &open {
                        Some(open) if open.name == name => Ok(nodes),
                        Some(open) => Err(CompileError::MismatchedTag {
                            line: self.line(offset),
                            found: name,
                            expected: open.name.to_string(),
                            opened: self.line(open.offset),
                        }),
                        None => Err(CompileError::UnmatchedClose {
                            line: self.line(offset),
                            tag: name,
                        }),
                    };
                }
            }
        }

        match open {
            Some(open) => Err(CompileError::Unclosed {
                line: self.line(open.offset),
                tag: open.name.to_string(),
            }),
            None => Ok(nodes),
        }
    }
}
