//! Document renderer: turns a Document into a [`UiNode`] tree.
//!
//! Content expressions and lambda tests that fail to parse or evaluate abort
//! the render. Expression props are more forgiving: a failure leaves the prop
//! `undefined` and the render continues.

use crate::env::{AllowCalls, Scope};
use crate::error::{RenderError, RenderResult};
use crate::registry::{is_host_element, ComponentRegistry};
use crate::ui::{UiNode, UiProps};
use crate::value::Value;
use indexmap::IndexMap;
use mdxir_types::{Document, LambdaBody, Node, PropValue, Props};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Key of the document root.
pub const ROOT_KEY: &str = "0";

/// Variables and callable functions for one render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub scope: Scope,
    pub allow_calls: AllowCalls,
}

impl RenderContext {
    pub fn new(scope: Scope, allow_calls: AllowCalls) -> Self {
        Self { scope, allow_calls }
    }
}

/// Render a validated document.
#[instrument(level = "debug", skip_all, fields(slug = %document.slug))]
pub fn render(
    document: &Document,
    context: &RenderContext,
    registry: &ComponentRegistry,
) -> RenderResult<UiNode> {
    let tree = render_node(&document.root, context, registry)?;
    debug!("rendered document");
    Ok(tree)
}

/// Render a single node as if it were the document root.
pub fn render_node(
    node: &Node,
    context: &RenderContext,
    registry: &ComponentRegistry,
) -> RenderResult<UiNode> {
    Renderer {
        scope: &context.scope,
        allow_calls: &context.allow_calls,
        registry,
    }
    .render_node(node, ROOT_KEY)
}

// ══════════════════════════════════════════════════════════════════════════
// Render callbacks
// ══════════════════════════════════════════════════════════════════════════

struct CallbackInner {
    parameter: String,
    body: LambdaBody,
    scope: Scope,
    allow_calls: AllowCalls,
    registry: ComponentRegistry,
    key: String,
}

/// A render-prop function built from a lambda node.
///
/// Captures the scope it was rendered in; [`RenderCallback::invoke`] binds
/// the parameter over that scope and renders the body. Two callbacks are
/// equal only if they are the same callback.
#[derive(Clone)]
pub struct RenderCallback {
    inner: Arc<CallbackInner>,
}

impl RenderCallback {
    pub fn parameter(&self) -> &str {
        &self.inner.parameter
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Call the function with `argument`. Same as `invoke_at(0, argument)`.
    pub fn invoke(&self, argument: Value) -> RenderResult<UiNode> {
        self.invoke_at(0, argument)
    }

    /// Call the function as invocation `index`, keying the output
    /// `<key>~<index>`. A component calling one render prop per item passes
    /// the item's index so the outputs stay distinct siblings.
    pub fn invoke_at(&self, index: usize, argument: Value) -> RenderResult<UiNode> {
        let inner = &*self.inner;
        let scope = inner.scope.child(inner.parameter.clone(), argument);
        let renderer = Renderer {
            scope: &scope,
            allow_calls: &inner.allow_calls,
            registry: &inner.registry,
        };
        let key = format!("{}~{index}", inner.key);
        match &inner.body {
            LambdaBody::Node { node } => renderer.render_node(node, &key),
            LambdaBody::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let branch = if renderer.eval_source(test)?.is_truthy() {
                    consequent
                } else {
                    alternate
                };
                renderer.render_node(branch, &key)
            }
        }
    }
}

impl PartialEq for RenderCallback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RenderCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCallback")
            .field("parameter", &self.inner.parameter)
            .field("key", &self.inner.key)
            .finish_non_exhaustive()
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════════════════

struct Renderer<'a> {
    scope: &'a Scope,
    allow_calls: &'a AllowCalls,
    registry: &'a ComponentRegistry,
}

impl Renderer<'_> {
    fn render_node(&self, node: &Node, key: &str) -> RenderResult<UiNode> {
        match node {
            Node::Root { children } => Ok(UiNode::Fragment {
                key: key.to_string(),
                children: self.render_children(children, key)?,
            }),
            Node::Text { value } => Ok(UiNode::text(key, value.clone())),
            Node::Expression { value } => {
                let result = self.eval_source(value)?;
                content(result, key)
            }
            Node::Lambda { parameter, body } => Ok(UiNode::Callback(self.callback(parameter, body, key))),
            Node::Element {
                name,
                props,
                children,
            } => self.render_element(name, props.as_ref(), children.as_deref().unwrap_or(&[]), key),
        }
    }

    fn render_children(&self, children: &[Node], key: &str) -> RenderResult<Vec<UiNode>> {
        children
            .iter()
            .enumerate()
            .map(|(i, child)| self.render_node(child, &format!("{key}.{i}")))
            .collect()
    }

    /// Host elements render directly; anything else must be registered.
    /// The registry is consulted before props or children are touched.
    fn render_element(
        &self,
        name: &str,
        props: Option<&Props>,
        children: &[Node],
        key: &str,
    ) -> RenderResult<UiNode> {
        let component = match self.registry.get(name) {
            Some(component) => Some(component.clone()),
            None if is_host_element(name) => None,
            None => return Err(RenderError::UnknownComponent(name.to_string())),
        };

        let props = match props {
            Some(props) => self.resolve_props(props, key)?,
            None => UiProps::new(),
        };
        let children = self.render_children(children, key)?;

        match component {
            None => Ok(UiNode::element(key, name, props, children)),
            Some(component) => {
                trace!(component = name, key, "rendering component");
                let mut rendered =
                    component
                        .render(&props, children)
                        .map_err(|message| RenderError::Component {
                            name: name.to_string(),
                            message,
                        })?;
                rendered.key_if_unset(format!("{key}/"));
                Ok(UiNode::Component {
                    key: key.to_string(),
                    name: name.to_string(),
                    rendered: Box::new(rendered),
                })
            }
        }
    }

    fn callback(&self, parameter: &str, body: &LambdaBody, key: &str) -> RenderCallback {
        RenderCallback {
            inner: Arc::new(CallbackInner {
                parameter: parameter.to_string(),
                body: body.clone(),
                scope: self.scope.clone(),
                allow_calls: self.allow_calls.clone(),
                registry: self.registry.clone(),
                key: key.to_string(),
            }),
        }
    }

    // ── Props ─────────────────────────────────────────────────────────────

    fn resolve_props(&self, props: &Props, key: &str) -> RenderResult<UiProps> {
        props
            .iter()
            .map(|(name, value)| {
                let resolved = self.resolve_prop(value, &format!("{key}:{name}"))?;
                Ok((name.clone(), resolved))
            })
            .collect()
    }

    /// Node props are rendered like content, so their failures are fatal.
    fn resolve_prop(&self, value: &PropValue, key: &str) -> RenderResult<Value> {
        Ok(match value {
            PropValue::Null => Value::Null,
            PropValue::String(s) => Value::String(s.clone()),
            PropValue::Number(n) => Value::Number(*n),
            PropValue::Bool(b) => Value::Bool(*b),
            PropValue::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.resolve_prop(item, &format!("{key}.{i}")))
                    .collect::<RenderResult<Vec<_>>>()?,
            ),
            PropValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(name, item)| {
                        Ok((name.clone(), self.resolve_prop(item, &format!("{key}.{name}"))?))
                    })
                    .collect::<RenderResult<IndexMap<_, _>>>()?,
            ),
            PropValue::Expression(source) => match self.eval_source(source) {
                Ok(value) => value,
                Err(error) => {
                    debug!(key, %error, "expression prop left undefined");
                    Value::Undefined
                }
            },
            PropValue::Node(node) => match self.render_node(node, key)? {
                UiNode::Callback(callback) => Value::Callback(callback),
                rendered => Value::Node(Box::new(rendered)),
            },
        })
    }

    // ── Expressions ───────────────────────────────────────────────────────

    fn eval_source(&self, source: &str) -> RenderResult<Value> {
        crate::evaluate_source(source, self.scope, self.allow_calls)
    }
}

/// Convert an expression result in content position to a node.
fn content(value: Value, key: &str) -> RenderResult<UiNode> {
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) => Ok(UiNode::Empty),
        Value::String(s) => Ok(UiNode::text(key, s)),
        Value::Number(_) => Ok(UiNode::text(key, value.to_js_string())),
        Value::Array(items) => Ok(UiNode::Fragment {
            key: key.to_string(),
            children: items
                .into_iter()
                .enumerate()
                .map(|(i, item)| content(item, &format!("{key}.{i}")))
                .collect::<RenderResult<Vec<_>>>()?,
        }),
        Value::Node(node) => Ok(*node),
        Value::Callback(callback) => Ok(UiNode::Callback(callback)),
        Value::Object(_) => Err(RenderError::InvalidContent {
            key: key.to_string(),
            found: "object",
        }),
    }
}
