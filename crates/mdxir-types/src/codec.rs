//! Structural validation and (de)serialization of documents.
//!
//! Validation is purely structural: expression strings are not parsed and
//! component names are not resolved here. The format is closed, so unknown
//! fields and unknown tags are fatal. There is no partial recovery; the first
//! problem found is reported with its path from the document root.

use crate::document::{Document, Frontmatter, LambdaBody, Node, PropValue, Props, SCHEMA_VERSION};
use crate::error::DecodeError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

type DecodeResult<T> = Result<T, DecodeError>;

/// Accept a generic JSON value as a [`Document`], or explain why not.
#[instrument(level = "debug", skip_all)]
pub fn validate(value: &Value) -> DecodeResult<Document> {
    let obj = object(value, "document")?;
    only_fields(
        obj,
        "document",
        &["schemaVersion", "slug", "frontmatter", "compiledAt", "root"],
    )?;

    let version = required(obj, "", "schemaVersion")?;
    if version.as_u64() != Some(u64::from(SCHEMA_VERSION)) {
        return Err(DecodeError::SchemaVersion {
            found: version.to_string(),
        });
    }

    let slug = non_empty_string(required(obj, "", "slug")?, "slug")?;
    let frontmatter: Frontmatter = object(required(obj, "", "frontmatter")?, "frontmatter")?.clone();
    let compiled_at = timestamp(required(obj, "", "compiledAt")?, "compiledAt")?;
    let root = node(required(obj, "", "root")?, "root")?;

    debug!(slug = %slug, nodes = root.count(), "document validated");
    Ok(Document {
        schema_version: SCHEMA_VERSION,
        slug,
        frontmatter,
        compiled_at,
        root,
    })
}

/// Check that an in-memory document would survive a write/read cycle.
pub fn check(doc: &Document) -> DecodeResult<()> {
    if doc.schema_version != SCHEMA_VERSION {
        return Err(DecodeError::SchemaVersion {
            found: doc.schema_version.to_string(),
        });
    }
    if doc.slug.is_empty() {
        return Err(DecodeError::Empty {
            path: "slug".into(),
        });
    }
    check_node(&doc.root, "root")
}

/// Encode a document as canonical JSON bytes.
///
/// Documents that [`deserialize`] would refuse are refused here too.
pub fn serialize(doc: &Document) -> DecodeResult<Vec<u8>> {
    check(doc)?;
    serde_json::to_vec(doc).map_err(|e| DecodeError::Encode(e.to_string()))
}

/// Pretty-printed variant of [`serialize`].
pub fn serialize_pretty(doc: &Document) -> DecodeResult<Vec<u8>> {
    check(doc)?;
    serde_json::to_vec_pretty(doc).map_err(|e| DecodeError::Encode(e.to_string()))
}

/// Decode and validate a document from JSON bytes.
pub fn deserialize(bytes: &[u8]) -> DecodeResult<Document> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Syntax(e.to_string()))?;
    validate(&value)
}

// ══════════════════════════════════════════════════════════════════════════════
// Decoding
// ══════════════════════════════════════════════════════════════════════════════

fn node(value: &Value, path: &str) -> DecodeResult<Node> {
    let obj = object(value, path)?;
    let tag = string(required(obj, path, "type")?, &join(path, "type"))?;

    match tag.as_str() {
        "root" => {
            only_fields(obj, path, &["type", "children"])?;
            let children = nodes(required(obj, path, "children")?, &join(path, "children"))?;
            Ok(Node::Root { children })
        }
        "text" | "expression" => {
            only_fields(obj, path, &["type", "value"])?;
            let value = string(required(obj, path, "value")?, &join(path, "value"))?;
            Ok(if tag == "text" {
                Node::Text { value }
            } else {
                Node::Expression { value }
            })
        }
        "lambda" => {
            only_fields(obj, path, &["type", "parameter", "body"])?;
            let parameter =
                non_empty_string(required(obj, path, "parameter")?, &join(path, "parameter"))?;
            let body = lambda_body(required(obj, path, "body")?, &join(path, "body"))?;
            Ok(Node::Lambda { parameter, body })
        }
        "element" => {
            only_fields(obj, path, &["type", "name", "props", "children"])?;
            let name = non_empty_string(required(obj, path, "name")?, &join(path, "name"))?;
            let props = obj
                .get("props")
                .map(|v| props(v, &join(path, "props")))
                .transpose()?;
            let children = obj
                .get("children")
                .map(|v| nodes(v, &join(path, "children")))
                .transpose()?;
            Ok(Node::Element {
                name,
                props,
                children,
            })
        }
        _ => Err(DecodeError::UnknownNodeType {
            path: path.to_string(),
            tag,
        }),
    }
}

fn nodes(value: &Value, path: &str) -> DecodeResult<Vec<Node>> {
    array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, child)| node(child, &format!("{path}[{i}]")))
        .collect()
}

fn lambda_body(value: &Value, path: &str) -> DecodeResult<LambdaBody> {
    let obj = object(value, path)?;
    let kind = string(required(obj, path, "kind")?, &join(path, "kind"))?;
    match kind.as_str() {
        "node" => {
            only_fields(obj, path, &["kind", "node"])?;
            let body = node(required(obj, path, "node")?, &join(path, "node"))?;
            Ok(LambdaBody::Node {
                node: Box::new(body),
            })
        }
        "conditional" => {
            only_fields(obj, path, &["kind", "test", "consequent", "alternate"])?;
            let test = string(required(obj, path, "test")?, &join(path, "test"))?;
            let consequent = node(required(obj, path, "consequent")?, &join(path, "consequent"))?;
            let alternate = node(required(obj, path, "alternate")?, &join(path, "alternate"))?;
            Ok(LambdaBody::Conditional {
                test,
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            })
        }
        _ => Err(DecodeError::UnknownLambdaKind {
            path: path.to_string(),
            kind,
        }),
    }
}

fn props(value: &Value, path: &str) -> DecodeResult<Props> {
    object(value, path)?
        .iter()
        .map(|(key, v)| Ok((key.clone(), prop_value(v, &join(path, key))?)))
        .collect()
}

fn prop_value(value: &Value, path: &str) -> DecodeResult<PropValue> {
    match value {
        Value::Null => Ok(PropValue::Null),
        Value::Bool(b) => Ok(PropValue::Bool(*b)),
        Value::String(s) => Ok(PropValue::String(s.clone())),
        Value::Number(n) => n.as_f64().map(PropValue::Number).ok_or(DecodeError::NonFinite {
            path: path.to_string(),
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| prop_value(item, &format!("{path}[{i}]")))
            .collect::<DecodeResult<_>>()
            .map(PropValue::Array),
        Value::Object(obj) => match obj.get("type") {
            None => props(value, path).map(PropValue::Object),
            Some(tag) => {
                let tag = string(tag, &join(path, "type"))?;
                match tag.as_str() {
                    "expression" => {
                        only_fields(obj, path, &["type", "value"])?;
                        let source = string(required(obj, path, "value")?, &join(path, "value"))?;
                        Ok(PropValue::Expression(source))
                    }
                    "node" => {
                        only_fields(obj, path, &["type", "value"])?;
                        let inner = node(required(obj, path, "value")?, &join(path, "value"))?;
                        Ok(PropValue::Node(Box::new(inner)))
                    }
                    _ => Err(DecodeError::UnknownPropType {
                        path: path.to_string(),
                        tag,
                    }),
                }
            }
        },
    }
}

fn timestamp(value: &Value, path: &str) -> DecodeResult<DateTime<Utc>> {
    let text = string(value, path)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DecodeError::Timestamp {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

// ── Shape helpers ─────────────────────────────────────────────────────────────

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn shape(path: &str, expected: &'static str, value: &Value) -> DecodeError {
    DecodeError::Shape {
        path: path.to_string(),
        expected,
        found: kind_of(value),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> DecodeResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| shape(path, "object", value))
}

fn array<'a>(value: &'a Value, path: &str) -> DecodeResult<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| shape(path, "array", value))
}

fn string(value: &Value, path: &str) -> DecodeResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| shape(path, "string", value))
}

fn non_empty_string(value: &Value, path: &str) -> DecodeResult<String> {
    let s = string(value, path)?;
    if s.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_string(),
        });
    }
    Ok(s)
}

fn required<'a>(obj: &'a Map<String, Value>, path: &str, field: &str) -> DecodeResult<&'a Value> {
    obj.get(field).ok_or_else(|| DecodeError::Missing {
        path: join(path, field),
    })
}

fn only_fields(obj: &Map<String, Value>, path: &str, allowed: &[&str]) -> DecodeResult<()> {
    match obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(field) => Err(DecodeError::UnknownField {
            path: path.to_string(),
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// In-memory checks
// ══════════════════════════════════════════════════════════════════════════════

fn check_node(node: &Node, path: &str) -> DecodeResult<()> {
    match node {
        Node::Root { children } => check_children(children, &join(path, "children")),
        Node::Text { .. } | Node::Expression { .. } => Ok(()),
        Node::Lambda { parameter, body } => {
            if parameter.is_empty() {
                return Err(DecodeError::Empty {
                    path: join(path, "parameter"),
                });
            }
            let body_path = join(path, "body");
            match body {
                LambdaBody::Node { node } => check_node(node, &join(&body_path, "node")),
                LambdaBody::Conditional {
                    consequent,
                    alternate,
                    ..
                } => {
                    check_node(consequent, &join(&body_path, "consequent"))?;
                    check_node(alternate, &join(&body_path, "alternate"))
                }
            }
        }
        Node::Element {
            name,
            props,
            children,
        } => {
            if name.is_empty() {
                return Err(DecodeError::Empty {
                    path: join(path, "name"),
                });
            }
            if let Some(props) = props {
                let props_path = join(path, "props");
                for (key, value) in props {
                    check_prop(value, &join(&props_path, key))?;
                }
            }
            match children {
                Some(children) => check_children(children, &join(path, "children")),
                None => Ok(()),
            }
        }
    }
}

fn check_children(children: &[Node], path: &str) -> DecodeResult<()> {
    children
        .iter()
        .enumerate()
        .try_for_each(|(i, child)| check_node(child, &format!("{path}[{i}]")))
}

fn check_prop(value: &PropValue, path: &str) -> DecodeResult<()> {
    match value {
        PropValue::Null | PropValue::String(_) | PropValue::Bool(_) | PropValue::Expression(_) => {
            Ok(())
        }
        PropValue::Number(n) if !n.is_finite() => Err(DecodeError::NonFinite {
            path: path.to_string(),
        }),
        PropValue::Number(_) => Ok(()),
        PropValue::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check_prop(item, &format!("{path}[{i}]"))),
        PropValue::Node(node) => check_node(node, &join(path, "value")),
        PropValue::Object(map) => {
            if map.contains_key("type") {
                // would be read back as a tagged value
                return Err(DecodeError::UnknownField {
                    path: path.to_string(),
                    field: "type".into(),
                });
            }
            map.iter()
                .try_for_each(|(key, item)| check_prop(item, &join(path, key)))
        }
    }
}
