use std::collections::BTreeMap;

use serde_json::Value;

/// Free-form metadata attached to an array node, mapping parameter names to
/// JSON values. The `"__array__"` parameter tags interpretation overlays such
/// as `"byte"` and `"char"` data.
pub type Parameters = BTreeMap<String, Value>;

/// Whether `params` maps `key` to exactly `value`.
pub fn parameter_equals(params: &Parameters, key: &str, value: &Value) -> bool {
    params.get(key) == Some(value)
}

/// Whether the parameters tag this array as byte- or char-interpreted 1-byte
/// data. Such arrays concatenate by raw memory copy and render to JSON as
/// strings.
pub(crate) fn is_bytestring(params: &Parameters) -> bool {
    matches!(
        params.get("__array__").and_then(Value::as_str),
        Some("byte") | Some("char")
    )
}
