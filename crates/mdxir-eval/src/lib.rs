//! mdxir runtime.
//!
//! Evaluates restricted expressions against a scope and renders compiled
//! documents to a keyed [`UiNode`] tree through a [`ComponentRegistry`].
//!
//! # Modules
//!
//! - [`value`]: runtime values and JavaScript-compatible coercions
//! - [`env`]: scopes and the call allow-list
//! - [`evaluator`]: expression evaluation
//! - [`render`]: document rendering and render-prop callbacks
//! - [`ui`]: the rendered tree
//! - [`registry`]: components
//! - [`error`]: runtime errors

pub mod env;
pub mod error;
pub mod evaluator;
mod html;
pub mod registry;
pub mod render;
pub mod ui;
pub mod value;

pub use env::{AllowCalls, HostFn, Scope};
pub use error::{EvalError, EvalResult, RenderError, RenderResult};
pub use evaluator::{evaluate, Evaluator, BLOCKED_PROPERTIES};
pub use registry::{Component, ComponentRegistry};
pub use render::{render, render_node, RenderCallback, RenderContext, ROOT_KEY};
pub use ui::{UiNode, UiProps};
pub use value::Value;

/// Parse and evaluate `source` in one step.
pub fn evaluate_source(
    source: &str,
    scope: &Scope,
    allow_calls: &AllowCalls,
) -> RenderResult<Value> {
    let expr = mdxir_parser::parse_expression(source).map_err(|error| RenderError::Parse {
        expression: source.to_string(),
        error,
    })?;
    evaluate(&expr, scope, allow_calls).map_err(|error| RenderError::Eval {
        expression: source.to_string(),
        error,
    })
}
