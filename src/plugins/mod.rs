//! Check plugins shipped with the engine.

mod counters;
mod gauge;
mod local;

pub use counters::*;
pub use gauge::*;
pub use local::*;

use serde_json::Value;

use crate::api::CheckError;
use crate::checking::CheckPlugin;
use crate::levels::{render, LevelSpec};

/// Every built-in plugin, ready for registration.
pub fn builtin_plugins() -> Vec<CheckPlugin> {
    vec![counters_plugin(), gauge_plugin(), local_plugin()]
}

/// Parse the optional level literal stored under `key` in the check parameters.
fn levels_param(params: &Value, key: &str) -> Result<Option<LevelSpec>, CheckError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(LevelSpec::from_value(value)?)),
    }
}

/// The render function named by the `render` parameter, `default` if unset.
fn render_param(params: &Value, default: fn(f64) -> String) -> Result<fn(f64) -> String, CheckError> {
    match params.get("render") {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_str()
            .and_then(render::by_name)
            .ok_or_else(|| CheckError::plugin(format!("unknown render function {}", value))),
    }
}
