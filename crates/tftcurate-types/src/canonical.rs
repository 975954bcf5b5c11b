//! Canonical JSON and content hashing.
//!
//! Canonical form: lexicographically key-sorted objects, no insignificant
//! whitespace. Identical logical content therefore hashes identically
//! regardless of how a document was serialized or parsed.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Render a value in canonical form.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// SHA-256 of the canonical form, lowercase hex.
#[must_use]
pub fn content_hash(value: &Value) -> String {
    let canon = canonical_json(value);
    format!("{:x}", Sha256::digest(canon.as_bytes()))
}

/// SHA-256 of raw bytes, lowercase hex. Used for file checksums in
/// provenance entities and backup metadata.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Display on Value emits compact JSON, escaping included.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_and_whitespace_dropped() {
        let value = json!({"b": 1, "a": {"z": [1, 2], "y": "x"}});
        assert_eq!(canonical_json(&value), r#"{"a":{"y":"x","z":[1,2]},"b":1}"#);
    }

    #[test]
    fn key_order_does_not_change_hash() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": {"b": 2, "a": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": {"a": 3, "b": 2}, "x": 1}"#).unwrap();
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn different_content_changes_hash() {
        assert_ne!(
            content_hash(&json!({"a": 1})),
            content_hash(&json!({"a": 2}))
        );
    }

    #[test]
    fn escapes_survive_canonicalization() {
        let value = json!({"k\"ey": "va\nlue"});
        let canon = canonical_json(&value);
        let back: Value = serde_json::from_str(&canon).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn sha256_hex_known_vector() {
        // sha256("") from FIPS 180-2 test vectors.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z0-9 ]{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent_through_reparse(value in arb_json()) {
            let canon = canonical_json(&value);
            let reparsed: Value = serde_json::from_str(&canon).unwrap();
            prop_assert_eq!(content_hash(&value), content_hash(&reparsed));
        }
    }
}
