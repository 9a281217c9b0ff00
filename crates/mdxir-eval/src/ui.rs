//! The rendered UI tree.

use crate::render::RenderCallback;
use crate::value::Value;
use indexmap::IndexMap;

/// Resolved props handed to elements and components.
pub type UiProps = IndexMap<String, Value>;

/// A rendered node.
///
/// Every node except [`UiNode::Empty`] carries a key derived from its
/// position in the document: the root is `0`, its second child `0.1`, a node
/// prop `title` of that child `0.1:title`. Invocation `i` of a callback is
/// keyed `<callback key>~i`, and the root a component renders `<component
/// key>/` unless the component keyed it itself.
#[derive(Debug, Clone, PartialEq)]
pub enum UiNode {
    Fragment {
        key: String,
        children: Vec<UiNode>,
    },
    /// A host element such as `div` or `a`.
    Element {
        key: String,
        tag: String,
        props: UiProps,
        children: Vec<UiNode>,
    },
    /// A registered component and what it rendered to.
    Component {
        key: String,
        name: String,
        rendered: Box<UiNode>,
    },
    Text {
        key: String,
        value: String,
    },
    /// A render-prop child, left for the enclosing component to invoke.
    Callback(RenderCallback),
    /// Content that renders to nothing: `null`, `undefined` and booleans.
    Empty,
}

impl UiNode {
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        UiNode::Text {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn element(
        key: impl Into<String>,
        tag: impl Into<String>,
        props: UiProps,
        children: Vec<UiNode>,
    ) -> Self {
        UiNode::Element {
            key: key.into(),
            tag: tag.into(),
            props,
            children,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            UiNode::Fragment { key, .. }
            | UiNode::Element { key, .. }
            | UiNode::Component { key, .. }
            | UiNode::Text { key, .. } => Some(key),
            UiNode::Callback(callback) => Some(callback.key()),
            UiNode::Empty => None,
        }
    }

    /// Give this node `key` if it has an empty one.
    pub fn key_if_unset(&mut self, key: String) {
        match self {
            UiNode::Fragment { key: current, .. }
            | UiNode::Element { key: current, .. }
            | UiNode::Component { key: current, .. }
            | UiNode::Text { key: current, .. }
                if current.is_empty() =>
            {
                *current = key
            }
            _ => {}
        }
    }

    pub fn children(&self) -> &[UiNode] {
        match self {
            UiNode::Fragment { children, .. } | UiNode::Element { children, .. } => children,
            UiNode::Component { rendered, .. } => std::slice::from_ref(rendered),
            _ => &[],
        }
    }

    /// Concatenated text of this subtree. Callbacks contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            UiNode::Text { value, .. } => out.push_str(value),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Find a node by key, depth first.
    pub fn find(&self, key: &str) -> Option<&UiNode> {
        if self.key() == Some(key) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_walks_the_tree() {
        let tree = UiNode::Fragment {
            key: "0".into(),
            children: vec![
                UiNode::text("0.0", "Hello "),
                UiNode::element("0.1", "strong", UiProps::new(), vec![UiNode::text("0.1.0", "Kent")]),
                UiNode::Empty,
            ],
        };
        assert_eq!(tree.text_content(), "Hello Kent");
        assert_eq!(tree.find("0.1.0"), Some(&UiNode::text("0.1.0", "Kent")));
        assert!(tree.find("0.7").is_none());
    }
}
