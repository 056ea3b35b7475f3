//! Helpers over the dynamic [`Value`] document.
//!
//! Templates, render contexts and rendered output all share the same
//! tagged-union representation (`serde_json::Value`). The functions here give
//! the rendering engine its path lookup, stringification and truthiness rules.

use std::borrow::Cow;

pub use serde_json::{Map, Number, Value};

/// Integral floats below this magnitude print without a fractional part.
const INTEGRAL_FLOAT_LIMIT: f64 = 1e15;

/// Resolve a dot-separated key path (`repository.owner.login`) against `root`.
///
/// Fails when a segment is absent or an intermediate value is not a map.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}

/// Render a value as the text substituted into a template.
///
/// Strings are returned verbatim, numbers in their shortest natural form,
/// lists and maps as compact JSON.
pub fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Number(n) => Cow::Owned(format_number(n)),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Null => Cow::Borrowed("null"),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Format a number so that `3.0` prints as `3` and `3.5` as `3.5`.
pub fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < INTEGRAL_FLOAT_LIMIT => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Truthiness used by `{{#if ...}}` blocks. A missing value is falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Number(n)) => format_number(n) != "0",
    }
}

/// The `length` filter: element count for lists and maps, character count
/// for strings. Any other scalar is coerced to its string form.
pub fn length_of(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::from(items.len()),
        Value::Object(map) => Value::from(map.len()),
        Value::String(s) => Value::from(s.chars().count()),
        other => Value::String(stringify(other).into_owned()),
    }
}

/// `true` when the value is a string with no characters.
pub fn is_empty_string(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}
