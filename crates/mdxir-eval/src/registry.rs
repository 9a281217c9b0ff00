//! Component registry.

use crate::ui::{UiNode, UiProps};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A renderable component.
///
/// Receives resolved props and already-rendered children. Render-prop
/// children arrive as [`UiNode::Callback`] and may be invoked any number of
/// times, through [`RenderCallback::invoke_at`] when the outputs are
/// siblings. A returned root with an empty key is keyed by the renderer.
///
/// [`RenderCallback::invoke_at`]: crate::RenderCallback::invoke_at
pub trait Component: Send + Sync {
    fn render(&self, props: &UiProps, children: Vec<UiNode>) -> Result<UiNode, String>;
}

impl<F> Component for F
where
    F: Fn(&UiProps, Vec<UiNode>) -> Result<UiNode, String> + Send + Sync,
{
    fn render(&self, props: &UiProps, children: Vec<UiNode>) -> Result<UiNode, String> {
        self(props, children)
    }
}

/// Components available to a render, by name.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: Arc<IndexMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, component: impl Component + 'static) {
        Arc::make_mut(&mut self.components).insert(name.into(), Arc::new(component));
    }

    pub fn with(mut self, name: impl Into<String>, component: impl Component + 'static) -> Self {
        self.register(name, component);
        self
    }

    /// Register a closure; its argument types are inferred from the bound.
    pub fn with_fn<F>(self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&UiProps, Vec<UiNode>) -> Result<UiNode, String> + Send + Sync + 'static,
    {
        self.with(name, render)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Unregistered names starting with a lowercase letter (`div`, `a`,
/// `motion.div`) are host tags; anything else must be registered.
pub fn is_host_element(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_element_names() {
        assert!(is_host_element("div"));
        assert!(is_host_element("my-widget"));
        assert!(!is_host_element("Greeting"));
        assert!(is_host_element("motion.div"));
        assert!(!is_host_element("_x"));
    }
}
