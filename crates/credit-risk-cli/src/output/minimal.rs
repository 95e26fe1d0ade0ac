use serde_json::Value;

use super::scalar_text;

/// Priority list of key output fields
const PRIORITY_KEYS: [&str; 5] = ["score", "band", "stage", "overview", "actions"];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            println!("{}", minimal_line(map));
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => println!("{}", minimal_line(map)),
                    other => println!("{}", scalar_text(other, "null")),
                }
            }
        }
        other => println!("{}", scalar_text(other, "null")),
    }
}

/// `score` and `band` print together when both are present.
fn minimal_line(map: &serde_json::Map<String, Value>) -> String {
    if let (Some(score), Some(band)) = (map.get("score"), map.get("band")) {
        return format!("{} {}", scalar_text(score, "null"), scalar_text(band, "null"));
    }
    if let (Some(stage), Some(actions)) = (map.get("stage"), map.get("actions")) {
        return format!("{}: {}", scalar_text(stage, "null"), action_list(actions));
    }

    // Skip null values
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key) {
            if !val.is_null() {
                return scalar_text(val, "null");
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, scalar_text(val, "null")),
        None => String::new(),
    }
}

/// Playbook actions joined for one line; a plain string passes through.
fn action_list(actions: &Value) -> String {
    match actions {
        Value::Array(items) => items
            .iter()
            .map(|a| scalar_text(a, "null"))
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar_text(other, "null"),
    }
}
