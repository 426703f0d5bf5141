use serde_json::Value;

/// Renders a scalar the way it appears inside store keys and sort hashes.
///
/// Returns `None` for `null`. Strings are verbatim, numbers and booleans use
/// their JSON text, and nested values fall back to compact JSON.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Expands an extracted index value into the set of values it is indexed under.
///
/// Arrays give one membership per distinct non-null element, in order.
/// A scalar gives exactly one, and `null` gives none.
pub fn index_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => {
            let mut out: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                if let Some(s) = scalar_string(item) {
                    if !out.contains(&s) {
                        out.push(s);
                    }
                }
            }
            out
        }
        other => scalar_string(other).into_iter().collect(),
    }
}
