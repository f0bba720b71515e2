//! Typed parameter lookup on a `serde_json::Value` object.
//!
//! Engines draw a randomized default for every parameter first and then let
//! these helpers override it, so a run's draw sequence does not depend on
//! which keys were supplied. Missing or mistyped keys fall back to the
//! default.

use serde_json::Value;
use tracing::warn;

use crate::error::EngineError;
use crate::variation::Variation;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Like [`param_f64`], but an override outside `[min, max]` or non-finite is
/// ignored with a warning and `default` is kept.
pub fn param_f64_in(params: &Value, name: &str, default: f64, min: f64, max: f64) -> f64 {
    let value = param_f64(params, name, default);
    if value.is_finite() && (min..=max).contains(&value) {
        value
    } else {
        warn!(param = name, value, min, max, "override out of range, keeping {default}");
        default
    }
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing or
/// not a non-negative integer.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Extracts a `bool` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}

/// Extracts a list of variation names from `params[name]`.
///
/// Returns `Ok(None)` when the key is absent, `Ok(Some(list))` for an array
/// of known names, and an error for anything else. A misspelled variation is
/// a configuration mistake worth failing on, unlike a mistyped number.
pub fn param_variations(params: &Value, name: &str) -> Result<Option<Vec<Variation>>, EngineError> {
    let Some(value) = params.get(name) else {
        return Ok(None);
    };
    let items = value.as_array().ok_or_else(|| EngineError::InvalidParameter {
        name: name.to_string(),
        reason: "expected an array of variation names".into(),
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| EngineError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("expected a string, got {item}"),
                })
                .and_then(str::parse)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
