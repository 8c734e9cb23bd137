//! State Hashing for Replay Verification
//!
//! Canonicalizes a state value into a stable byte sequence and hashes it
//! with SHA-256. Two independently produced states are considered identical
//! exactly when their canonical hashes match; this is the acceptance gate
//! for the whole simulation engine.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::game::state::GameState;

/// Domain separator mixed into every state hash.
const STATE_DOMAIN: &[u8] = b"HEXHOLD_STATE_V1";

/// Render a JSON value into its canonical byte form.
///
/// Rules:
/// - object keys are sorted lexically (byte order), arrays keep their order;
/// - numbers use serde_json's shortest round-trip rendering, which is a
///   function of the bit pattern alone;
/// - non-finite floats have already collapsed to the `null` sentinel by the
///   time a value exists (serde_json cannot represent them);
/// - 64-bit-wide integers never appear as numbers: the only wide value in
///   the model, the RNG state, serializes itself as the `"<digits>n"`
///   marker string, so no pattern sniffing is needed here.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_json_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push(b'{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_json_string(key, out);
                out.push(b':');
                write_canonical(item, out);
            }
            out.push(b'}');
        }
    }
}

fn write_json_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

/// SHA-256 over the canonical form of an arbitrary JSON value, as
/// lowercase hex.
pub fn hash_value(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(STATE_DOMAIN);
    hasher.update(canonical_bytes(value));
    hex::encode(hasher.finalize())
}

/// Hash a full game state.
///
/// The state is projected through its serde representation, which already
/// strips volatile view flags (unit selection) and encodes the RNG state as
/// the tagged big-integer string. Serialization of the state model cannot
/// fail (string keys, finite-or-null numbers); the unreachable error arm
/// hashes the `null` sentinel so the function stays total.
pub fn hash_state(state: &GameState) -> String {
    let value = serde_json::to_value(state).unwrap_or(Value::Null);
    hash_value(&value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_is_normalized() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":2,"b":1}"#).unwrap();
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn test_array_order_is_preserved() {
        let a = json!([1, 2, 3]);
        let b = json!([3, 2, 1]);
        assert_ne!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn test_canonical_form_shape() {
        let value = json!({"z": [true, null], "a": {"k": "v"}});
        let bytes = canonical_bytes(&value);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":{"k":"v"},"z":[true,null]}"#
        );
    }

    #[test]
    fn test_string_escaping() {
        let value = json!({"s": "a\"b\\c\nd\u{1}"});
        let bytes = canonical_bytes(&value);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"s\":\"a\\\"b\\\\c\\nd\\u0001\"}"
        );
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = hash_value(&json!({"turn": 3}));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_number_rendering_round_trips() {
        // Shortest-form float rendering must survive a parse cycle unchanged.
        let value = json!({"e": 0.8566830430645496, "i": 12, "neg": -3.5});
        let reparsed: Value =
            serde_json::from_slice(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(hash_value(&value), hash_value(&reparsed));
    }
}
