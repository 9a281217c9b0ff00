//! Evaluation scope and the host call allow-list.

use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A single scope level.
#[derive(Debug)]
struct Frame {
    bindings: IndexMap<String, Value>,
    parent: Option<Arc<Frame>>,
}

/// Immutable variable scope.
///
/// Lookups search from the innermost frame outward. [`Scope::child`] shares
/// its parent, so a render-prop callback can capture the scope it was built
/// in and extend it later without copying.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    frame: Option<Arc<Frame>>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope holding the given bindings.
    pub fn from_bindings<K, I>(bindings: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::new().with_bindings(bindings)
    }

    /// Create a scope from a JSON object; `None` if `json` is not an object.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let map = json.as_object()?;
        Some(Self::from_bindings(
            map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))),
        ))
    }

    /// A new scope with one binding that shadows the same name here.
    pub fn child(&self, name: impl Into<String>, value: Value) -> Self {
        self.with_bindings([(name.into(), value)])
    }

    /// A new scope with the given bindings layered over this one.
    pub fn with_bindings<K, I>(&self, bindings: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let bindings: IndexMap<String, Value> =
            bindings.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            frame: Some(Arc::new(Frame {
                bindings,
                parent: self.frame.clone(),
            })),
        }
    }

    /// Look up a variable, searching from innermost to outermost frame.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            if let Some(value) = current.bindings.get(name) {
                return Some(value);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

// ── Allow-list ────────────────────────────────────────────────────────────────

/// A host function callable from expressions.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// The functions an expression may call, by name.
///
/// Anything not registered here cannot be called.
#[derive(Clone, Default)]
pub struct AllowCalls {
    functions: Arc<IndexMap<String, HostFn>>,
}

impl AllowCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.functions).insert(name.into(), Arc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<&HostFn> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for AllowCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_bindings_shadow_outer() {
        let outer = Scope::from_bindings([("name", Value::from("outer")), ("x", Value::from(1.0))]);
        let inner = outer.child("name", Value::from("inner"));
        assert_eq!(inner.get("name"), Some(&Value::from("inner")));
        assert_eq!(inner.get("x"), Some(&Value::from(1.0)));
        assert_eq!(outer.get("name"), Some(&Value::from("outer")));
        assert!(inner.get("missing").is_none());
    }

    #[test]
    fn scope_from_json_requires_object() {
        assert!(Scope::from_json(&serde_json::json!([1])).is_none());
        let scope = Scope::from_json(&serde_json::json!({"user": {"name": "Kent"}}));
        assert!(scope.is_some_and(|s| s.contains("user")));
    }

    #[test]
    fn allow_calls_replace_by_name() {
        let calls = AllowCalls::new()
            .with("f", |_| Ok(Value::from(1.0)))
            .with("f", |_| Ok(Value::from(2.0)));
        assert_eq!(calls.names().collect::<Vec<_>>(), vec!["f"]);
        let f = calls.get("f").cloned();
        assert_eq!(f.map(|f| f(&[])), Some(Ok(Value::from(2.0))));
    }
}
