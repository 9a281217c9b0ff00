//! Static HTML output for a rendered tree.
//!
//! Stored documents are only checked for structure, so tag and attribute
//! names are checked here: an element with an invalid tag name contributes
//! only its children, and invalid names, event handlers and `javascript:`
//! URLs are left out of the attributes.

use crate::ui::{UiNode, UiProps};
use crate::value::Value;
use tracing::debug;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl UiNode {
    /// Serialize to HTML. Components contribute what they rendered;
    /// callbacks that were never invoked contribute nothing.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn write_node(node: &UiNode, out: &mut String) {
    match node {
        UiNode::Text { value, .. } => escape_into(value, false, out),
        UiNode::Element {
            tag,
            props,
            children,
            ..
        } => {
            if !is_valid_name(tag) {
                debug!(tag = tag.as_str(), "writing element without its invalid tag");
                for child in children {
                    write_node(child, out);
                }
                return;
            }
            out.push('<');
            out.push_str(tag);
            write_attributes(props, out);
            if VOID_ELEMENTS.contains(&tag.as_str()) && children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        UiNode::Fragment { children, .. } => {
            for child in children {
                write_node(child, out);
            }
        }
        UiNode::Component { rendered, .. } => write_node(rendered, out),
        UiNode::Callback(_) | UiNode::Empty => {}
    }
}

fn write_attributes(props: &UiProps, out: &mut String) {
    for (name, value) in props {
        let name = match name.as_str() {
            "className" => "class",
            "htmlFor" => "for",
            other => other,
        };
        if !is_valid_name(name) || is_event_handler(name) {
            debug!(attribute = name, "attribute left out");
            continue;
        }
        let text = match value {
            Value::Bool(true) => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(_) | Value::Array(_) => value.to_js_string(),
            Value::Object(map) if name == "style" => style_text(map),
            _ => continue,
        };
        if matches!(name, "href" | "src" | "action" | "formaction") && is_script_url(&text) {
            debug!(attribute = name, "script URL left out");
            continue;
        }
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(&text, true, out);
        out.push('"');
    }
}

/// `[A-Za-z][A-Za-z0-9-]*`
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name[..2].eq_ignore_ascii_case("on")
}

fn is_script_url(url: &str) -> bool {
    let scheme: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take(11)
        .collect();
    scheme.eq_ignore_ascii_case("javascript:")
}

/// `{fontSize: 12}` becomes `font-size:12`.
fn style_text(map: &indexmap::IndexMap<String, Value>) -> String {
    map.iter()
        .filter(|(_, v)| matches!(v, Value::String(_) | Value::Number(_)))
        .map(|(k, v)| {
            let mut property = String::new();
            for c in k.chars() {
                if c.is_ascii_uppercase() {
                    property.push('-');
                    property.push(c.to_ascii_lowercase());
                } else {
                    property.push(c);
                }
            }
            format!("{property}:{}", v.to_js_string())
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
