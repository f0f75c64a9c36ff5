//! Dotted-path access into records.
//!
//! A path like `applicant.address.city` walks nested mappings one segment
//! at a time. Reads also step into sequences when a segment is a decimal
//! index (`items.0.price`).

use logicgit_types::Record;
use serde_json::{Map, Value};

/// Look up a dotted path. `None` if any segment is missing.
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Assign `value` at a dotted path, creating intermediate mappings.
///
/// Any intermediate level (including the root) that is not a mapping is
/// replaced by an empty one.
pub fn set_path(record: &mut Record, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = record;
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Whether a path is usable as an assignment target.
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_nested_and_indexed() {
        let record = json!({"a": {"b": [10, {"c": "deep"}]}});
        assert_eq!(get_path(&record, "a.b.0"), Some(&json!(10)));
        assert_eq!(get_path(&record, "a.b.1.c"), Some(&json!("deep")));
        assert_eq!(get_path(&record, "a.x"), None);
        assert_eq!(get_path(&record, "a.b.9"), None);
    }

    #[test]
    fn set_creates_intermediate_levels() {
        let mut record = json!({"name": "x"});
        set_path(&mut record, "decision.reason.code", json!("R1"));
        assert_eq!(record, json!({"name": "x", "decision": {"reason": {"code": "R1"}}}));
    }

    #[test]
    fn set_replaces_scalar_intermediate() {
        let mut record = json!({"flag": true});
        set_path(&mut record, "flag.detail", json!(1));
        assert_eq!(record, json!({"flag": {"detail": 1}}));
    }

    #[test]
    fn set_overwrites_leaf() {
        let mut record = json!({"rate": 5.0});
        set_path(&mut record, "rate", json!(3.5));
        assert_eq!(record["rate"], json!(3.5));
    }

    #[test]
    fn path_validity() {
        assert!(is_valid_path("a.b"));
        assert!(!is_valid_path(""));
        assert!(!is_valid_path("a..b"));
        assert!(!is_valid_path(".a"));
    }
}
