//! Dotted-path access into nested JSON records.
//!
//! Child field names inside a list field may contain `.` separators
//! (`"address.city"`). Reading such a name walks nested objects; writing it
//! creates the intermediate objects on demand.

use serde_json::{Map, Value};

/// Reads the value at a dotted `path` inside `value`.
///
/// Returns `None` when any segment is missing or an intermediate value is not
/// an object.
///
/// # Examples
///
/// ```
/// use formwork_forms::path::deep_read;
/// use serde_json::json;
///
/// let record = json!({"address": {"city": "Oslo"}});
/// assert_eq!(deep_read(&record, "address.city"), Some(&json!("Oslo")));
/// assert_eq!(deep_read(&record, "address.zip"), None);
/// ```
pub fn deep_read<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Writes `new_value` at a dotted `path` inside `target`.
///
/// Missing intermediate objects are created. An intermediate that exists but
/// is not an object is replaced by an empty object.
pub fn deep_write(target: &mut Map<String, Value>, path: &str, new_value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), new_value);
        }
        Some((head, rest)) => {
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(inner) = slot {
                deep_write(inner, rest, new_value);
            }
        }
    }
}
