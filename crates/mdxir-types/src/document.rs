//! The compiled document IR.
//!
//! A [`Document`] is produced once by the compiler and is immutable from then
//! on. It is plain data: every value in it can be written to JSON and read
//! back (see [`crate::codec`]).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The only schema version this crate reads or writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Document metadata from the frontmatter block, in source order.
pub type Frontmatter = serde_json::Map<String, serde_json::Value>;

/// Element props, in source order.
pub type Props = IndexMap<String, PropValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub schema_version: u32,
    pub slug: String,
    pub frontmatter: Frontmatter,
    pub compiled_at: DateTime<Utc>,
    pub root: Node,
}

impl Document {
    pub fn new(slug: impl Into<String>, compiled_at: DateTime<Utc>, root: Node) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            slug: slug.into(),
            frontmatter: Frontmatter::new(),
            compiled_at,
            root,
        }
    }

    pub fn with_frontmatter(mut self, frontmatter: Frontmatter) -> Self {
        self.frontmatter = frontmatter;
        self
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::codec::validate(&value).map_err(serde::de::Error::custom)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Nodes
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Root {
        children: Vec<Node>,
    },
    /// Literal text, rendered verbatim.
    Text {
        value: String,
    },
    /// Expression source evaluated at render time.
    Expression {
        value: String,
    },
    /// A single-argument render-prop callback.
    Lambda {
        parameter: String,
        body: LambdaBody,
    },
    /// A host tag or a registry component, depending on `name`.
    Element {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        props: Option<Props>,
        #[serde(skip_serializing_if = "Option::is_none")]
        children: Option<Vec<Node>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LambdaBody {
    /// `(x) => <Node />`
    Node { node: Box<Node> },
    /// `(x) => test ? <A /> : <B />`
    Conditional {
        test: String,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn expression(value: impl Into<String>) -> Self {
        Node::Expression {
            value: value.into(),
        }
    }

    /// An element with no props and no children.
    pub fn element(name: impl Into<String>) -> Self {
        Node::Element {
            name: name.into(),
            props: None,
            children: None,
        }
    }

    /// Build an element, storing empty props/children as absent.
    pub fn element_with(name: impl Into<String>, props: Props, children: Vec<Node>) -> Self {
        Node::Element {
            name: name.into(),
            props: (!props.is_empty()).then_some(props),
            children: (!children.is_empty()).then_some(children),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Root { .. } => "root",
            Node::Text { .. } => "text",
            Node::Expression { .. } => "expression",
            Node::Lambda { .. } => "lambda",
            Node::Element { .. } => "element",
        }
    }

    /// Number of nodes in this subtree, including nodes held in props.
    pub fn count(&self) -> usize {
        let nested = match self {
            Node::Root { children } => children.iter().map(Node::count).sum(),
            Node::Text { .. } | Node::Expression { .. } => 0,
            Node::Lambda { body, .. } => match body {
                LambdaBody::Node { node } => node.count(),
                LambdaBody::Conditional {
                    consequent,
                    alternate,
                    ..
                } => consequent.count() + alternate.count(),
            },
            Node::Element {
                props, children, ..
            } => {
                let in_props: usize = props
                    .iter()
                    .flat_map(|p| p.values())
                    .map(PropValue::node_count)
                    .sum();
                let in_children: usize = children.iter().flatten().map(Node::count).sum();
                in_props + in_children
            }
        };
        nested + 1
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Prop Values
// ══════════════════════════════════════════════════════════════════════════════

/// The value of an element prop.
///
/// On the wire, `Expression` and `Node` are objects tagged with `type`;
/// `Object` is a plain map and therefore may not carry a `type` key.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Null,
    String(String),
    Number(f64),
    Bool(bool),
    Array(Vec<PropValue>),
    Expression(String),
    Node(Box<Node>),
    Object(IndexMap<String, PropValue>),
}

impl PropValue {
    fn node_count(&self) -> usize {
        match self {
            PropValue::Node(node) => node.count(),
            PropValue::Array(items) => items.iter().map(PropValue::node_count).sum(),
            PropValue::Object(map) => map.values().map(PropValue::node_count).sum(),
            _ => 0,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_string())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<Node> for PropValue {
    fn from(node: Node) -> Self {
        PropValue::Node(Box::new(node))
    }
}

impl Serialize for PropValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropValue::Null => serializer.serialize_unit(),
            PropValue::String(s) => serializer.serialize_str(s),
            PropValue::Number(n) => serialize_number(*n, serializer),
            PropValue::Bool(b) => serializer.serialize_bool(*b),
            PropValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PropValue::Expression(source) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "expression")?;
                map.serialize_entry("value", source)?;
                map.end()
            }
            PropValue::Node(node) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "node")?;
                map.serialize_entry("value", node)?;
                map.end()
            }
            PropValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Integral numbers are written without a fractional part.
fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 && !(n == 0.0 && n.is_sign_negative())
    {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}
