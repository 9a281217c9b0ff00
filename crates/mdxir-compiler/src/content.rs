//! The generic content tree handed to the emitter.

/// A parsed MDX document: optional frontmatter plus top-level content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentTree {
    /// Raw YAML between the `---` fences.
    pub frontmatter: Option<String>,
    pub nodes: Vec<ContentNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    /// Markdown text, lowered later by pulldown-cmark.
    Markdown(String),
    /// `{...}` in content position. `offset` is where the source starts.
    Expression { source: String, offset: usize },
    /// A tag and everything up to its matching close tag. A fragment
    /// (`<>...</>`) has an empty name.
    Element {
        name: String,
        attributes: Vec<Attribute>,
        children: Vec<ContentNode>,
        /// Open and close tag on one line: children are phrasing content.
        inline: bool,
        offset: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// `None` for a bare attribute such as `<Modal open />`.
    pub value: Option<AttrValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Expression { source: String, offset: usize },
}
