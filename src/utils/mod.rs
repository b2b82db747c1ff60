// SPDX-License-Identifier: MIT

//! Small helpers for working with dynamic `serde_yaml::Value` trees.

use serde_yaml::Value;

/// Human-readable name of a YAML value's type, for error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Render a scalar value as the text spliced into an interpolated string.
///
/// Containers fall back to their flow-style YAML rendering; a trailing
/// newline from the emitter is trimmed off.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
