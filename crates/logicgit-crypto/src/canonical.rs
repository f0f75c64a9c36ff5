//! Canonical JSON encoding.
//!
//! - Mapping keys are emitted in byte-wise sorted order at every depth.
//! - No insignificant whitespace.
//! - Strings use standard JSON escaping.
//! - Numbers keep their exact JSON form, so `1` and `1.0` stay distinct.
//! - Sequence order is preserved: sequences are ordered data.
//!
//! The encoder walks the value itself instead of relying on the map type's
//! iteration order, so the output does not depend on how `serde_json` was
//! compiled.

use serde::Serialize;
use serde_json::Value;

use crate::hasher::HasherError;

/// Canonicalize any serializable value.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HasherError> {
    let value = serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
    Ok(canonicalize_value(&value))
}

/// Canonicalize an already-built JSON value.
pub fn canonicalize_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, &mut out);
    out
}

/// Canonical bytes as a UTF-8 string (for persisted `content` columns).
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<String, HasherError> {
    let bytes = canonicalize(value)?;
    String::from_utf8(bytes).map_err(|e| HasherError::Serialization(e.to_string()))
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_value(item, out);
            }
            out.push(b'}');
        }
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(Value::String(s.to_owned()).to_string().as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_at_every_depth() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}});
        assert_eq!(
            canonicalize_value(&value),
            br#"{"a":{"m":null,"z":true},"b":1}"#.to_vec()
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": {"p": 2, "q": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": {"q": 3, "p": 2}, "x": 1}"#).unwrap();
        assert_eq!(canonicalize_value(&a), canonicalize_value(&b));
    }

    #[test]
    fn whitespace_does_not_matter() {
        let a: Value = serde_json::from_str("{ \"k\" :\n [1, 2,  3] }").unwrap();
        let b: Value = serde_json::from_str(r#"{"k":[1,2,3]}"#).unwrap();
        assert_eq!(canonicalize_value(&a), canonicalize_value(&b));
    }

    #[test]
    fn sequence_order_matters() {
        assert_ne!(
            canonicalize_value(&json!([1, 2])),
            canonicalize_value(&json!([2, 1]))
        );
    }

    #[test]
    fn integer_and_float_are_distinct() {
        assert_ne!(
            canonicalize_value(&json!({"n": 1})),
            canonicalize_value(&json!({"n": 1.0}))
        );
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            canonicalize_value(&json!("a\"b\n")),
            br#""a\"b\n""#.to_vec()
        );
    }

    #[test]
    fn canonical_output_parses_back() {
        let value = json!({"outer": [{"b": "x", "a": 2.5}], "flag": false});
        let bytes = canonicalize_value(&value);
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, value);
    }

    fn arb_object() -> impl Strategy<Value = Vec<(String, i64)>> {
        prop::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..12)
    }

    proptest! {
        #[test]
        fn key_permutation_is_invisible(pairs in arb_object()) {
            let mut forward = serde_json::Map::new();
            for (k, v) in &pairs {
                forward.insert(k.clone(), json!(v));
            }
            let mut reversed = serde_json::Map::new();
            for (k, _) in pairs.iter().rev() {
                if let Some(v) = forward.get(k) {
                    reversed.insert(k.clone(), v.clone());
                }
            }
            prop_assert_eq!(
                canonicalize_value(&Value::Object(forward)),
                canonicalize_value(&Value::Object(reversed))
            );
        }
    }
}
