//! Renderer tests: content, components, props, render-prop callbacks and
//! path-derived keys.

use chrono::{TimeZone, Utc};
use mdxir_eval::{
    render, render_node, AllowCalls, ComponentRegistry, EvalError, RenderContext, RenderError,
    Scope, UiNode, UiProps, Value,
};
use mdxir_types::{Document, LambdaBody, Node, PropValue, Props};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn doc(children: Vec<Node>) -> Document {
    let compiled_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Document::new("test", compiled_at, Node::Root { children })
}

fn el(name: &str, children: Vec<Node>) -> Node {
    Node::element_with(name, Props::new(), children)
}

fn el_props(name: &str, props: Vec<(&str, PropValue)>, children: Vec<Node>) -> Node {
    let props: Props = props.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Node::element_with(name, props, children)
}

fn kent_scope() -> Scope {
    Scope::from_json(&serde_json::json!({ "user": { "name": "Kent" } })).unwrap()
}

fn context(scope: Scope) -> RenderContext {
    RenderContext::new(scope, AllowCalls::new())
}

fn render_ok(document: &Document, scope: Scope, registry: &ComponentRegistry) -> UiNode {
    match render(document, &context(scope), registry) {
        Ok(tree) => tree,
        Err(e) => panic!("render failed: {e}"),
    }
}

/// Wraps its children in a `div`, tagging it with the component name.
fn passthrough(name: &'static str) -> impl Fn(&UiProps, Vec<UiNode>) -> Result<UiNode, String> {
    move |_props, children| {
        let mut props = UiProps::new();
        props.insert("data-component".into(), Value::from(name));
        Ok(UiNode::element("", "div", props, children))
    }
}

/// Invokes every callback child with the `value` prop.
fn provider(props: &UiProps, children: Vec<UiNode>) -> Result<UiNode, String> {
    let argument = props.get("value").cloned().unwrap_or(Value::Undefined);
    let rendered = children
        .into_iter()
        .map(|child| match child {
            UiNode::Callback(callback) => callback.invoke(argument.clone()).map_err(|e| e.to_string()),
            other => Ok(other),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(UiNode::Fragment {
        key: String::new(),
        children: rendered,
    })
}

fn greeting_lambda() -> Node {
    Node::Lambda {
        parameter: "maybeUser".into(),
        body: LambdaBody::Conditional {
            test: "maybeUser".into(),
            consequent: Box::new(el(
                "p",
                vec![Node::text("Hello "), Node::expression("maybeUser.firstName")],
            )),
            alternate: Box::new(el("p", vec![Node::text("Hello visitor")])),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────

#[test]
fn text_and_expression() {
    let document = doc(vec![el(
        "p",
        vec![Node::text("Hello "), Node::expression("user.name")],
    )]);
    let tree = render_ok(&document, kent_scope(), &ComponentRegistry::new());
    assert_eq!(tree.text_content(), "Hello Kent");
    assert_eq!(tree.to_html(), "<p>Hello Kent</p>");
}

#[test]
fn content_values_render_like_jsx() {
    let document = doc(vec![
        Node::expression("42"),
        Node::expression("null"),
        Node::expression("false"),
        Node::expression("missing"),
        Node::expression("['a', 1, null]"),
    ]);
    let tree = render_ok(&document, Scope::new(), &ComponentRegistry::new());
    assert_eq!(tree.text_content(), "42a1");
    assert_eq!(tree.children()[1], UiNode::Empty);
}

#[test]
fn object_content_is_an_error() {
    let document = doc(vec![Node::expression("user")]);
    let err = render(&document, &context(kent_scope()), &ComponentRegistry::new()).unwrap_err();
    assert_eq!(
        err,
        RenderError::InvalidContent {
            key: "0.0".into(),
            found: "object"
        }
    );
}

#[test]
fn content_expression_failures_abort() {
    let registry = ComponentRegistry::new();
    let parse = render(&doc(vec![Node::expression("a =")]), &context(Scope::new()), &registry);
    assert!(matches!(parse, Err(RenderError::Parse { .. })));

    let blocked = doc(vec![el("p", vec![Node::expression("user.constructor")])]);
    let err = render(&blocked, &context(kent_scope()), &registry).unwrap_err();
    assert_eq!(
        err,
        RenderError::Eval {
            expression: "user.constructor".into(),
            error: EvalError::BlockedProperty("constructor".into()),
        }
    );
}

// ─────────────────────────────────────────────────────────────────────
// Components
// ─────────────────────────────────────────────────────────────────────

#[test]
fn unknown_component() {
    let document = doc(vec![el("UnknownComponent", vec![])]);
    let err = render(&document, &context(Scope::new()), &ComponentRegistry::new()).unwrap_err();
    assert_eq!(err, RenderError::UnknownComponent("UnknownComponent".into()));
    assert_eq!(err.to_string(), "unknown component `UnknownComponent`");
}

#[test]
fn lowercase_dotted_names_are_host_tags() {
    let document = doc(vec![el("motion.div", vec![Node::text("hi")])]);
    let tree = render_ok(&document, Scope::new(), &ComponentRegistry::new());
    assert!(matches!(
        tree.find("0.0"),
        Some(UiNode::Element { tag, .. }) if tag == "motion.div"
    ));

    let registry = ComponentRegistry::new().with_fn("motion.div", passthrough("motion"));
    let tree = render_ok(&document, Scope::new(), &registry);
    assert_eq!(tree.to_html(), r#"<div data-component="motion">hi</div>"#);

    let err = render(&doc(vec![el("Motion.div", vec![])]), &context(Scope::new()), &ComponentRegistry::new())
        .unwrap_err();
    assert_eq!(err, RenderError::UnknownComponent("Motion.div".into()));
}

#[test]
fn registered_components_receive_props_and_children() {
    let registry = ComponentRegistry::new().with_fn("Callout", |props, children| {
        let kind = props.get("kind").map(Value::to_js_string).unwrap_or_default();
        let mut attrs = UiProps::new();
        attrs.insert("class".into(), Value::from(format!("callout-{kind}")));
        Ok(UiNode::element("", "aside", attrs, children))
    });
    let document = doc(vec![el_props(
        "Callout",
        vec![("kind", PropValue::from("warning"))],
        vec![Node::text("Careful")],
    )]);
    let tree = render_ok(&document, Scope::new(), &registry);
    assert_eq!(tree.to_html(), r#"<aside class="callout-warning">Careful</aside>"#);
    match &tree.children()[0] {
        UiNode::Component { key, name, .. } => {
            assert_eq!(key, "0.0");
            assert_eq!(name, "Callout");
        }
        other => panic!("expected a component, got {other:?}"),
    }
}

#[test]
fn registry_takes_precedence_over_host_tags() {
    let registry = ComponentRegistry::new().with_fn("a", passthrough("link"));
    let tree = render_ok(&doc(vec![el("a", vec![])]), Scope::new(), &registry);
    assert_eq!(tree.to_html(), r#"<div data-component="link"></div>"#);
}

#[test]
fn component_errors_abort() {
    let registry =
        ComponentRegistry::new().with_fn("Broken", |_props, _children| Err("no data".to_string()));
    let err = render(&doc(vec![el("Broken", vec![])]), &context(Scope::new()), &registry)
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::Component {
            name: "Broken".into(),
            message: "no data".into()
        }
    );
}

// ─────────────────────────────────────────────────────────────────────
// Props
// ─────────────────────────────────────────────────────────────────────

fn host_props(tree: &UiNode) -> UiProps {
    match &tree.children()[0] {
        UiNode::Element { props, .. } => props.clone(),
        other => panic!("expected an element, got {other:?}"),
    }
}

#[test]
fn failing_prop_expression_becomes_undefined() {
    let document = doc(vec![el_props(
        "form",
        vec![(
            "onSubmit",
            PropValue::Expression("({ username }) => alert(username)".into()),
        )],
        vec![],
    )]);
    let tree = render_ok(&document, Scope::new(), &ComponentRegistry::new());
    assert_eq!(host_props(&tree).get("onSubmit"), Some(&Value::Undefined));
}

#[test]
fn prop_values_resolve_recursively() {
    let mut style = indexmap::IndexMap::new();
    style.insert("color".to_string(), PropValue::from("red"));
    style.insert("width".to_string(), PropValue::Expression("user.name.length * 10".into()));
    let document = doc(vec![el_props(
        "div",
        vec![
            ("title", PropValue::Expression("'Hi ' + user.name".into())),
            ("count", PropValue::Number(3.0)),
            ("hidden", PropValue::Bool(false)),
            ("nothing", PropValue::Null),
            (
                "list",
                PropValue::Array(vec![PropValue::from(1.0), PropValue::Expression("user.name".into())]),
            ),
            ("style", PropValue::Object(style)),
            ("broken", PropValue::Expression("user.__proto__".into())),
        ],
        vec![],
    )]);
    let tree = render_ok(&document, kent_scope(), &ComponentRegistry::new());
    let props = host_props(&tree);
    assert_eq!(props["title"], Value::from("Hi Kent"));
    assert_eq!(props["count"], Value::Number(3.0));
    assert_eq!(props["nothing"], Value::Null);
    assert_eq!(
        props["list"],
        Value::Array(vec![Value::Number(1.0), Value::from("Kent")])
    );
    assert_eq!(
        props["style"],
        Value::object([("color", Value::from("red")), ("width", Value::Number(40.0))])
    );
    assert_eq!(props["broken"], Value::Undefined);
    assert_eq!(
        tree.to_html(),
        r#"<div title="Hi Kent" count="3" list="1,Kent" style="color:red;width:40"></div>"#
    );
}

#[test]
fn node_props_are_rendered() {
    let registry = ComponentRegistry::new().with_fn("Card", |props, children| {
        let mut content = Vec::new();
        if let Some(Value::Node(header)) = props.get("header") {
            content.push((**header).clone());
        }
        content.extend(children);
        Ok(UiNode::element("", "section", UiProps::new(), content))
    });
    let header = el("h2", vec![Node::expression("user.name")]);
    let document = doc(vec![el_props(
        "Card",
        vec![("header", PropValue::Node(Box::new(header)))],
        vec![Node::text("body")],
    )]);
    let tree = render_ok(&document, kent_scope(), &registry);
    assert_eq!(tree.to_html(), "<section><h2>Kent</h2>body</section>");
    assert!(tree.find("0.0:header").is_some());
    assert!(tree.find("0.0:header.0").is_some());
}

#[test]
fn node_prop_failures_abort() {
    let bad = el("Missing", vec![]);
    let document = doc(vec![el_props(
        "div",
        vec![("slot", PropValue::Node(Box::new(bad)))],
        vec![],
    )]);
    let err = render(&document, &context(Scope::new()), &ComponentRegistry::new()).unwrap_err();
    assert_eq!(err, RenderError::UnknownComponent("Missing".into()));
}

// ─────────────────────────────────────────────────────────────────────
// Render-prop callbacks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn lambda_conditional_chooses_branch() {
    let ctx = context(Scope::new());
    let tree = render_node(&greeting_lambda(), &ctx, &ComponentRegistry::new()).unwrap();
    let UiNode::Callback(callback) = tree else {
        panic!("expected a callback, got {tree:?}");
    };
    assert_eq!(callback.parameter(), "maybeUser");

    let kent = Value::object([("firstName", Value::from("Kent"))]);
    assert_eq!(callback.invoke(kent).unwrap().text_content(), "Hello Kent");
    assert_eq!(callback.invoke(Value::Null).unwrap().text_content(), "Hello visitor");
    assert_eq!(
        callback.invoke(Value::Undefined).unwrap().text_content(),
        "Hello visitor"
    );
}

#[test]
fn callbacks_see_the_outer_scope() {
    let lambda = Node::Lambda {
        parameter: "item".into(),
        body: LambdaBody::Node {
            node: Box::new(el(
                "li",
                vec![Node::expression("user.name + ': ' + item")],
            )),
        },
    };
    let registry = ComponentRegistry::new().with_fn("Provider", provider);
    let document = doc(vec![el_props(
        "Provider",
        vec![("value", PropValue::from("first"))],
        vec![lambda],
    )]);
    let tree = render_ok(&document, kent_scope(), &registry);
    assert_eq!(tree.text_content(), "Kent: first");
    assert!(tree.find("0.0.0~0").is_some(), "{tree:?}");
}

#[test]
fn parameter_shadows_outer_binding() {
    let lambda = Node::Lambda {
        parameter: "user".into(),
        body: LambdaBody::Node {
            node: Box::new(Node::expression("user.name")),
        },
    };
    let registry = ComponentRegistry::new().with_fn("Provider", provider);
    let document = doc(vec![el_props(
        "Provider",
        vec![(
            "value",
            PropValue::Expression("null".into()),
        )],
        vec![lambda],
    )]);
    let tree = render_ok(&document, kent_scope(), &registry);
    assert_eq!(tree.text_content(), "");
}

#[test]
fn uninvoked_callbacks_render_nothing() {
    let document = doc(vec![el("div", vec![greeting_lambda()])]);
    let tree = render_ok(&document, Scope::new(), &ComponentRegistry::new());
    assert_eq!(tree.to_html(), "<div></div>");
    assert!(matches!(tree.find("0.0.0"), Some(UiNode::Callback(_))));
}

#[test]
fn callback_test_failures_abort_the_invocation() {
    let lambda = Node::Lambda {
        parameter: "x".into(),
        body: LambdaBody::Conditional {
            test: "x.prototype".into(),
            consequent: Box::new(Node::text("yes")),
            alternate: Box::new(Node::text("no")),
        },
    };
    let tree = render_node(&lambda, &context(Scope::new()), &ComponentRegistry::new()).unwrap();
    let UiNode::Callback(callback) = tree else {
        panic!("expected a callback");
    };
    assert!(matches!(
        callback.invoke(Value::Null),
        Err(RenderError::Eval {
            error: EvalError::BlockedProperty(_),
            ..
        })
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Keys & determinism
// ─────────────────────────────────────────────────────────────────────

fn keys(tree: &UiNode, out: &mut Vec<String>) {
    if let Some(key) = tree.key() {
        out.push(key.to_string());
    }
    for child in tree.children() {
        keys(child, out);
    }
}

#[test]
fn keys_follow_document_position() {
    let document = doc(vec![
        el("h1", vec![Node::text("Title")]),
        el("p", vec![Node::text("a"), el("em", vec![Node::text("b")])]),
    ]);
    let tree = render_ok(&document, Scope::new(), &ComponentRegistry::new());
    let mut found = Vec::new();
    keys(&tree, &mut found);
    assert_eq!(
        found,
        vec!["0", "0.0", "0.0.0", "0.1", "0.1.0", "0.1.1", "0.1.1.0"]
    );
}

#[test]
fn props_and_children_have_separate_keys() {
    let registry = ComponentRegistry::new().with_fn("Slot", |props, mut children| {
        if let Some(Value::Node(slot)) = props.get("0") {
            children.push((**slot).clone());
        }
        Ok(UiNode::Fragment {
            key: String::new(),
            children,
        })
    });
    let document = doc(vec![el_props(
        "Slot",
        vec![("0", PropValue::Node(Box::new(Node::text("prop"))))],
        vec![Node::text("child")],
    )]);
    let tree = render_ok(&document, Scope::new(), &registry);
    let mut found = Vec::new();
    keys(&tree, &mut found);
    assert_eq!(found, vec!["0", "0.0", "0.0/", "0.0.0", "0.0:0"]);
}

#[test]
fn component_roots_are_keyed_under_the_component() {
    let registry = ComponentRegistry::new()
        .with_fn("Box", passthrough("box"))
        .with_fn("Keyed", |_props, children| {
            Ok(UiNode::element("mine", "span", UiProps::new(), children))
        });
    let document = doc(vec![el("Box", vec![]), el("Keyed", vec![])]);
    let tree = render_ok(&document, Scope::new(), &registry);
    assert!(matches!(tree.find("0.0/"), Some(UiNode::Element { tag, .. }) if tag == "div"));
    assert!(matches!(tree.find("mine"), Some(UiNode::Element { tag, .. }) if tag == "span"));
}

/// Invokes the first callback child once per item of the `items` prop.
fn list(props: &UiProps, children: Vec<UiNode>) -> Result<UiNode, String> {
    let Some(Value::Array(items)) = props.get("items") else {
        return Err("`items` must be an array".into());
    };
    let Some(UiNode::Callback(render_item)) = children.into_iter().next() else {
        return Err("expected a render-prop child".into());
    };
    let rendered = items
        .iter()
        .enumerate()
        .map(|(i, item)| render_item.invoke_at(i, item.clone()).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(UiNode::element("", "ul", UiProps::new(), rendered))
}

#[test]
fn repeated_invocations_get_distinct_keys() {
    let lambda = Node::Lambda {
        parameter: "x".into(),
        body: LambdaBody::Node {
            node: Box::new(el("li", vec![Node::expression("x")])),
        },
    };
    let registry = ComponentRegistry::new().with_fn("List", list);
    let document = doc(vec![el_props(
        "List",
        vec![(
            "items",
            PropValue::Array(vec![PropValue::from("a"), PropValue::from("b")]),
        )],
        vec![lambda],
    )]);
    let tree = render_ok(&document, Scope::new(), &registry);
    assert_eq!(tree.to_html(), "<ul><li>a</li><li>b</li></ul>");

    let Some(ul) = tree.find("0.0/") else {
        panic!("no list root in {tree:?}");
    };
    let sibling_keys: Vec<_> = ul.children().iter().map(UiNode::key).collect();
    assert_eq!(sibling_keys, vec![Some("0.0.0~0"), Some("0.0.0~1")]);
}

#[test]
fn determinism_100_iterations() {
    let registry = ComponentRegistry::new().with_fn("Provider", provider);
    let document = doc(vec![
        el("p", vec![Node::text("Hello "), Node::expression("user.name")]),
        el_props(
            "Provider",
            vec![("value", PropValue::Expression("user".into()))],
            vec![greeting_lambda()],
        ),
    ]);
    let first = render_ok(&document, kent_scope(), &registry).to_html();
    for i in 0..100 {
        let html = render_ok(&document, kent_scope(), &registry).to_html();
        assert_eq!(html, first, "Determinism failure at iteration {i}");
    }
}

#[test]
fn concurrent_renders_do_not_interfere() {
    let document = doc(vec![el(
        "p",
        vec![Node::text("Hello "), Node::expression("user.name")],
    )]);
    let registry = ComponentRegistry::new();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let document = &document;
                let registry = &registry;
                s.spawn(move || {
                    let name = format!("user{i}");
                    let scope = Scope::from_bindings([(
                        "user",
                        Value::object([("name", Value::from(name.clone()))]),
                    )]);
                    let tree = render_ok(document, scope, registry);
                    assert_eq!(tree.text_content(), format!("Hello {name}"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
