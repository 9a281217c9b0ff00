//! `mdxir.toml`: compile options and the components the CLI can render.

use anyhow::{Context, Result};
use mdxir_compiler::CompileOptions;
use mdxir_eval::{ComponentRegistry, UiNode, UiProps, Value};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub compile: CompileOptions,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Component names rendered as `<div data-component="Name">` wrappers.
    pub components: Vec<String>,
}

impl CliConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read the config at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

impl RenderConfig {
    pub fn registry(&self) -> ComponentRegistry {
        self.components
            .iter()
            .fold(ComponentRegistry::new(), |registry, name| {
                registry.with(name.clone(), Wrapper { name: name.clone() })
            })
    }
}

/// Stand-in component: a `div` around its children. Callback children are
/// invoked with the `value` prop. The `div` is left unkeyed, so the renderer
/// keys it under the component.
struct Wrapper {
    name: String,
}

impl mdxir_eval::Component for Wrapper {
    fn render(&self, props: &UiProps, children: Vec<UiNode>) -> Result<UiNode, String> {
        let value = props.get("value").cloned().unwrap_or(Value::Undefined);
        let children = children
            .into_iter()
            .enumerate()
            .map(|(i, child)| match child {
                UiNode::Callback(callback) => callback
                    .invoke_at(i, value.clone())
                    .map_err(|e| e.to_string()),
                other => Ok(other),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut attrs = UiProps::new();
        attrs.insert("data-component".into(), Value::from(self.name.as_str()));
        Ok(UiNode::element("", "div", attrs, children))
    }
}
