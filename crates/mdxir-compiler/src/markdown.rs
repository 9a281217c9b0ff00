//! Markdown lowering.
//!
//! A run of sibling content is lowered in one pulldown-cmark pass. Elements
//! and expressions inside the run are compiled first and stand in the
//! markdown as private-use placeholders, so block structure (paragraphs,
//! lists, headings) is decided by the markdown parser alone and the compiled
//! nodes are spliced back where their placeholder lands.

use crate::options::MarkdownOptions;
use mdxir_types::{Node, PropValue, Props};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Parser, Tag};
use std::borrow::Cow;

const EMBED_OPEN: char = '\u{E000}';
const EMBED_CLOSE: char = '\u{E001}';

/// The markdown stand-in for embedded node group `index`.
pub(crate) fn placeholder(index: usize) -> String {
    format!("{EMBED_OPEN}{index}{EMBED_CLOSE}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Document or multi-line element content.
    Block,
    /// Content of an element opened and closed on one line: a lone
    /// paragraph is unwrapped.
    Phrasing,
}

/// Lower `markdown` to document nodes, substituting `embeds` for their
/// placeholders.
pub(crate) fn lower(
    markdown: &str,
    embeds: Vec<Vec<Node>>,
    flow: Flow,
    options: &MarkdownOptions,
) -> Vec<Node> {
    let mut builder = Builder::new(embeds);
    for event in Parser::new_ext(markdown, options.to_cmark()) {
        builder.event(event);
    }
    let mut nodes = builder.finish();

    if flow == Flow::Phrasing
        && matches!(nodes.as_slice(), [Node::Element { name, .. }] if name == "p")
    {
        if let Some(Node::Element { children, .. }) = nodes.pop() {
            nodes = children.unwrap_or_default();
        }
    }
    nodes
}

/// Remove the indentation shared by every non-blank line, so element
/// children indented for readability are not read as code blocks.
pub(crate) fn dedent(text: &str) -> Cow<'_, str> {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let strip = line
            .bytes()
            .take(indent)
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        out.push_str(&line[strip..]);
    }
    Cow::Owned(out)
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Element,
    Paragraph,
    Image,
    CodeBlock,
    TableHead,
    /// Splices its children into the parent (HTML blocks, unknown tags).
    Transparent,
}

struct Frame {
    kind: Kind,
    name: &'static str,
    props: Props,
    children: Vec<Node>,
    /// Placeholders substituted directly into this frame.
    embeds: usize,
    /// Whether the frame holds anything besides embeds and whitespace.
    other: bool,
}

impl Frame {
    fn new(kind: Kind, name: &'static str, props: Props) -> Self {
        Self {
            kind,
            name,
            props,
            children: Vec::new(),
            embeds: 0,
            other: false,
        }
    }

    fn into_node(self) -> Node {
        match self.kind {
            Kind::Image => {
                let mut props = Props::new();
                let mut rest = self.props;
                if let Some(src) = rest.shift_remove("src") {
                    props.insert("src".into(), src);
                }
                props.insert("alt".into(), PropValue::String(text_content(&self.children)));
                props.extend(rest);
                Node::element_with("img", props, Vec::new())
            }
            Kind::CodeBlock => {
                let code = Node::element_with("code", self.props, self.children);
                Node::element_with("pre", Props::new(), vec![code])
            }
            Kind::TableHead => {
                let row = Node::element_with("tr", Props::new(), self.children);
                Node::element_with("thead", self.props, vec![row])
            }
            _ => Node::element_with(self.name, self.props, self.children),
        }
    }
}

struct Builder {
    root: Frame,
    stack: Vec<Frame>,
    embeds: Vec<Option<Vec<Node>>>,
    /// Text not yet pushed; pulldown-cmark may split one run into several
    /// events.
    text: String,
    alignments: Vec<Alignment>,
    cell: usize,
    in_head: bool,
}

impl Builder {
    fn new(embeds: Vec<Vec<Node>>) -> Self {
        Self {
            root: Frame::new(Kind::Transparent, "", Props::new()),
            stack: Vec::new(),
            embeds: embeds.into_iter().map(Some).collect(),
            text: String::new(),
            alignments: Vec::new(),
            cell: 0,
            in_head: false,
        }
    }

    fn top(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.text.push_str(&text)
            }
            Event::SoftBreak => self.text.push('\n'),
            Event::Start(tag) => {
                self.flush();
                self.open(tag);
            }
            Event::End(_) => {
                self.flush();
                self.close();
            }
            Event::Code(code) => {
                self.flush();
                self.push_element("code", Props::new(), vec![Node::text(code.to_string())]);
            }
            Event::HardBreak => {
                self.flush();
                self.push_element("br", Props::new(), Vec::new());
            }
            Event::Rule => {
                self.flush();
                self.push_element("hr", Props::new(), Vec::new());
            }
            Event::TaskListMarker(checked) => {
                self.flush();
                let mut props = Props::new();
                props.insert("type".into(), "checkbox".into());
                props.insert("checked".into(), checked.into());
                props.insert("disabled".into(), true.into());
                self.push_element("input", props, Vec::new());
            }
            Event::FootnoteReference(label) => {
                self.flush();
                let mut props = Props::new();
                props.insert("href".into(), PropValue::String(format!("#fn-{label}")));
                props.insert("id".into(), PropValue::String(format!("fnref-{label}")));
                let link = Node::element_with("a", props, vec![Node::text(label.to_string())]);
                self.push_element("sup", Props::new(), vec![link]);
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let mut props = Props::new();
        let (kind, name) = match tag {
            Tag::Paragraph => (Kind::Paragraph, "p"),
            Tag::Heading { level, id, .. } => {
                if let Some(id) = id {
                    props.insert("id".into(), PropValue::String(id.to_string()));
                }
                (Kind::Element, heading(level))
            }
            Tag::BlockQuote(..) => (Kind::Element, "blockquote"),
            Tag::CodeBlock(block) => {
                if let CodeBlockKind::Fenced(info) = block {
                    if let Some(lang) = info.split_whitespace().next() {
                        props.insert("className".into(), PropValue::String(format!("language-{lang}")));
                    }
                }
                (Kind::CodeBlock, "pre")
            }
            Tag::List(Some(start)) => {
                if start != 1 {
                    props.insert("start".into(), PropValue::Number(start as f64));
                }
                (Kind::Element, "ol")
            }
            Tag::List(None) => (Kind::Element, "ul"),
            Tag::Item => (Kind::Element, "li"),
            Tag::FootnoteDefinition(label) => {
                props.insert("className".into(), "footnote-definition".into());
                props.insert("id".into(), PropValue::String(format!("fn-{label}")));
                (Kind::Element, "div")
            }
            Tag::Table(alignments) => {
                self.alignments = alignments;
                (Kind::Element, "table")
            }
            Tag::TableHead => {
                self.in_head = true;
                self.cell = 0;
                (Kind::TableHead, "thead")
            }
            Tag::TableRow => {
                self.cell = 0;
                (Kind::Element, "tr")
            }
            Tag::TableCell => {
                let align = match self.alignments.get(self.cell) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    props.insert("align".into(), align.into());
                }
                self.cell += 1;
                (Kind::Element, if self.in_head { "th" } else { "td" })
            }
            Tag::Emphasis => (Kind::Element, "em"),
            Tag::Strong => (Kind::Element, "strong"),
            Tag::Strikethrough => (Kind::Element, "del"),
            Tag::Link {
                dest_url, title, ..
            } => {
                props.insert("href".into(), PropValue::String(dest_url.to_string()));
                if !title.is_empty() {
                    props.insert("title".into(), PropValue::String(title.to_string()));
                }
                (Kind::Element, "a")
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                props.insert("src".into(), PropValue::String(dest_url.to_string()));
                if !title.is_empty() {
                    props.insert("title".into(), PropValue::String(title.to_string()));
                }
                (Kind::Image, "img")
            }
            _ => (Kind::Transparent, ""),
        };
        self.stack.push(Frame::new(kind, name, props));
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if frame.kind == Kind::TableHead {
            self.in_head = false;
        }
        let parent = self.top();
        match frame.kind {
            // A paragraph holding only embedded elements is not a paragraph.
            Kind::Paragraph if frame.embeds > 0 && !frame.other => {
                parent.embeds += frame.embeds;
                for child in frame.children {
                    if !matches!(&child, Node::Text { value } if value.trim().is_empty()) {
                        push_merged(&mut parent.children, child);
                    }
                }
            }
            Kind::Transparent => {
                parent.embeds += frame.embeds;
                parent.other |= frame.other;
                for child in frame.children {
                    push_merged(&mut parent.children, child);
                }
            }
            _ => {
                parent.other = true;
                parent.children.push(frame.into_node());
            }
        }
    }

    fn push_element(&mut self, name: &str, props: Props, children: Vec<Node>) {
        let top = self.top();
        top.other = true;
        top.children.push(Node::element_with(name, props, children));
    }

    /// Push buffered text, replacing placeholders with their nodes.
    fn flush(&mut self) {
        let text = std::mem::take(&mut self.text);
        let mut rest = text.as_str();
        while !rest.is_empty() {
            match split_placeholder(rest) {
                Some((before, index, after)) => {
                    self.push_text(before);
                    let nodes = self
                        .embeds
                        .get_mut(index)
                        .and_then(Option::take)
                        .unwrap_or_default();
                    let top = self.top();
                    top.embeds += 1;
                    for node in nodes {
                        push_merged(&mut top.children, node);
                    }
                    rest = after;
                }
                None => {
                    self.push_text(rest);
                    break;
                }
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let top = self.top();
        top.other |= !text.trim().is_empty();
        push_merged(&mut top.children, Node::text(text));
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush();
        while !self.stack.is_empty() {
            self.close();
        }
        // Placeholders swallowed by markdown syntax (link definitions, say)
        // still keep their content.
        let leftovers: Vec<Node> = self.embeds.iter_mut().filter_map(Option::take).flatten().collect();
        let mut nodes = self.root.children;
        nodes.extend(leftovers);
        nodes
    }
}

fn heading(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// `("before", index, "after")` around the first placeholder in `s`.
fn split_placeholder(s: &str) -> Option<(&str, usize, &str)> {
    let start = s.find(EMBED_OPEN)?;
    let digits = &s[start + EMBED_OPEN.len_utf8()..];
    let end = digits.find(EMBED_CLOSE)?;
    let index = digits[..end].parse().ok()?;
    Some((&s[..start], index, &digits[end + EMBED_CLOSE.len_utf8()..]))
}

/// Push `node`, joining it onto a preceding text node.
fn push_merged(children: &mut Vec<Node>, node: Node) {
    if let Node::Text { value } = &node {
        if let Some(Node::Text { value: last }) = children.last_mut() {
            last.push_str(value);
            return;
        }
    }
    children.push(node);
}

fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text { value } => out.push_str(value),
            Node::Root { children } => out.push_str(&text_content(children)),
            Node::Element {
                children: Some(children),
                ..
            } => out.push_str(&text_content(children)),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_block(markdown: &str, embeds: Vec<Vec<Node>>) -> Vec<Node> {
        lower(markdown, embeds, Flow::Block, &MarkdownOptions::default())
    }

    fn el(name: &str, children: Vec<Node>) -> Node {
        Node::element_with(name, Props::new(), children)
    }

    fn props(entries: &[(&str, PropValue)]) -> Props {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn headings_and_paragraphs() {
        assert_eq!(
            lower_block("# Hello *world*\n\nSome **bold** text.\n", vec![]),
            vec![
                el("h1", vec![Node::text("Hello "), el("em", vec![Node::text("world")])]),
                el(
                    "p",
                    vec![
                        Node::text("Some "),
                        el("strong", vec![Node::text("bold")]),
                        Node::text(" text."),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn lone_embeds_are_not_wrapped_in_paragraphs() {
        let markdown = format!("Intro\n\n{}\n\n{} {}\n", placeholder(0), placeholder(1), placeholder(2));
        let nodes = lower_block(
            &markdown,
            vec![
                vec![Node::element("Callout")],
                vec![Node::expression("a")],
                vec![Node::expression("b")],
            ],
        );
        assert_eq!(
            nodes,
            vec![
                el("p", vec![Node::text("Intro")]),
                Node::element("Callout"),
                Node::expression("a"),
                Node::expression("b"),
            ]
        );
    }

    #[test]
    fn inline_embeds_stay_in_their_paragraph() {
        let markdown = format!("Hello {}!", placeholder(0));
        assert_eq!(
            lower_block(&markdown, vec![vec![Node::expression("user.name")]]),
            vec![el(
                "p",
                vec![
                    Node::text("Hello "),
                    Node::expression("user.name"),
                    Node::text("!"),
                ]
            )]
        );
    }

    #[test]
    fn phrasing_unwraps_a_single_paragraph() {
        let nodes = lower("Click *here*", vec![], Flow::Phrasing, &MarkdownOptions::default());
        assert_eq!(
            nodes,
            vec![Node::text("Click "), el("em", vec![Node::text("here")])]
        );
    }

    #[test]
    fn lists_code_and_links() {
        let nodes = lower_block(
            "3. one\n4. [two](/two \"Two\")\n\n```rust\nfn main() {}\n```\n",
            vec![],
        );
        let Node::Element { name, props: list_props, .. } = &nodes[0] else {
            panic!("expected a list");
        };
        assert_eq!(name, "ol");
        assert_eq!(list_props.as_ref().unwrap()["start"], PropValue::Number(3.0));
        assert_eq!(
            nodes[1],
            el(
                "pre",
                vec![Node::element_with(
                    "code",
                    props(&[("className", "language-rust".into())]),
                    vec![Node::text("fn main() {}\n")]
                )]
            )
        );
    }

    #[test]
    fn tables_with_alignment() {
        let nodes = lower_block("| a | b |\n|:-|-:|\n| 1 | 2 |\n", vec![]);
        let Node::Element {
            name,
            children: Some(rows),
            ..
        } = &nodes[0]
        else {
            panic!("expected a table");
        };
        assert_eq!(name, "table");
        assert_eq!(
            rows[0],
            el(
                "thead",
                vec![el(
                    "tr",
                    vec![
                        Node::element_with("th", props(&[("align", "left".into())]), vec![Node::text("a")]),
                        Node::element_with("th", props(&[("align", "right".into())]), vec![Node::text("b")]),
                    ]
                )]
            )
        );
        assert!(matches!(&rows[1], Node::Element { name, .. } if name == "tr"));
    }

    #[test]
    fn images_tasks_and_breaks() {
        let nodes = lower_block("![A *cat*](cat.png)\n\n- [x] done\n\n---\n", vec![]);
        assert_eq!(
            nodes[0],
            el(
                "p",
                vec![Node::element_with(
                    "img",
                    props(&[("src", "cat.png".into()), ("alt", "A cat".into())]),
                    vec![]
                )]
            )
        );
        let Node::Element { children: Some(items), .. } = &nodes[1] else {
            panic!("expected a list");
        };
        let Node::Element { children: Some(item), .. } = &items[0] else {
            panic!("expected an item");
        };
        assert!(matches!(&item[0], Node::Element { name, .. } if name == "input"));
        assert_eq!(nodes[2], Node::element("hr"));
    }

    #[test]
    fn dedent_shared_indentation() {
        assert_eq!(dedent("\n  Watch out\n\n    - nested\n"), "\nWatch out\n\n  - nested\n");
        assert!(matches!(dedent("flush\n  indented"), Cow::Borrowed(_)));
    }
}
