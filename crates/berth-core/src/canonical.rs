//! Canonical JSON encoding for deterministic serialization.
//!
//! This module implements a JCS-style canonical form:
//! - Object keys sorted lexicographically (by Unicode code point) at
//!   every nesting level
//! - Arrays preserve element order
//! - No insignificant whitespace
//! - Standard JSON escaping and number formatting via `serde_json`
//!
//! Before encoding, the top-level `signature` field and every
//! `_`-prefixed field (transport-only markers such as an inlined binary
//! payload or an overwrite flag) are removed. The resulting byte
//! sequence is the exact input to signing and verification, and is
//! exposed verbatim to callers for external re-verification.

use serde_json::Value;

use crate::crypto::Sha256Hash;
use crate::error::CoreError;
use crate::manifest::Entity;

/// The detached-signature field stripped from the canonical form.
pub const SIGNATURE_FIELD: &str = "signature";

/// Canonical bytes of an entity.
pub fn canonical_bytes(entity: &Entity) -> Result<Vec<u8>, CoreError> {
    let value =
        serde_json::to_value(entity).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(canonicalize_value(&value))
}

/// Canonical bytes as a UTF-8 string, for API exposure.
pub fn canonical_json(entity: &Entity) -> Result<String, CoreError> {
    let bytes = canonical_bytes(entity)?;
    String::from_utf8(bytes).map_err(|e| CoreError::EncodingError(e.to_string()))
}

/// The signed message: SHA-256 over the canonical bytes.
pub fn signing_digest(entity: &Entity) -> Result<Sha256Hash, CoreError> {
    Ok(Sha256Hash::hash(&canonical_bytes(entity)?))
}

/// Canonicalize an arbitrary JSON document.
pub fn canonicalize_value(value: &Value) -> Vec<u8> {
    let stripped = strip_signature(&strip_transport_fields(value));
    let mut buf = Vec::new();
    write_value(&mut buf, &stripped);
    buf
}

/// Remove `_`-prefixed fields at every nesting level.
///
/// The top-level `signature` field is left in place; callers that need
/// the signed form go through [`canonicalize_value`].
pub fn strip_transport_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, v)| (key.clone(), strip_transport_fields(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_transport_fields).collect()),
        other => other.clone(),
    }
}

fn strip_signature(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != SIGNATURE_FIELD)
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Recursively encode a JSON value with sorted object keys.
fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => buf.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(buf, s),
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item);
            }
            buf.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();

            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(buf, key);
                buf.push(b':');
                write_value(buf, &map[key.as_str()]);
            }
            buf.push(b'}');
        }
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    // serde_json applies the standard JSON escaping rules; serializing a
    // plain string cannot fail.
    let escaped = serde_json::to_string(s).expect("string serialization is infallible");
    buf.extend_from_slice(escaped.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_str(value: &Value) -> String {
        String::from_utf8(canonicalize_value(value)).unwrap()
    }

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value: Value =
            serde_json::from_str(r#"{"b":1,"a":{"d":4,"c":3},"e":[{"z":0,"y":9}]}"#).unwrap();
        assert_eq!(
            canonical_str(&value),
            r#"{"a":{"c":3,"d":4},"b":1,"e":[{"y":9,"z":0}]}"#
        );
    }

    #[test]
    fn test_key_order_invariance() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":[{"p":1,"q":2}]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":[{"q":2,"p":1}],"x":1}"#).unwrap();
        assert_eq!(canonicalize_value(&a), canonicalize_value(&b));
    }

    #[test]
    fn test_array_order_preserved() {
        let value: Value = serde_json::from_str(r#"{"list":[3,1,2]}"#).unwrap();
        assert_eq!(canonical_str(&value), r#"{"list":[3,1,2]}"#);
    }

    #[test]
    fn test_signature_and_transport_fields_stripped() {
        let bare: Value = serde_json::from_str(r#"{"id":"a.b","version":"1.0.0"}"#).unwrap();
        let decorated: Value = serde_json::from_str(
            r#"{"id":"a.b","version":"1.0.0","signature":{"alg":"ed25519"},"_payload":"...","_overwrite":true}"#,
        )
        .unwrap();
        assert_eq!(canonicalize_value(&bare), canonicalize_value(&decorated));
    }

    #[test]
    fn test_nested_transport_fields_stripped() {
        let bare: Value = serde_json::from_str(r#"{"a":{"b":1},"c":[{"d":2}]}"#).unwrap();
        let decorated: Value =
            serde_json::from_str(r#"{"a":{"b":1,"_inline":"x"},"c":[{"d":2,"_tmp":0}]}"#).unwrap();
        assert_eq!(canonicalize_value(&bare), canonicalize_value(&decorated));
    }

    #[test]
    fn test_nested_signature_keys_preserved() {
        // Only the top-level signature field is a detached signature.
        let value: Value = serde_json::from_str(r#"{"meta":{"signature":"inner"}}"#).unwrap();
        assert_eq!(canonical_str(&value), r#"{"meta":{"signature":"inner"}}"#);
    }

    #[test]
    fn test_scalars_and_escapes() {
        let value: Value =
            serde_json::from_str(r#"{"n":null,"t":true,"f":false,"s":"a\"b\n","i":-42}"#).unwrap();
        assert_eq!(
            canonical_str(&value),
            r#"{"f":false,"i":-42,"n":null,"s":"a\"b\n","t":true}"#
        );
    }

    #[test]
    fn test_deterministic() {
        let value: Value = serde_json::from_str(r#"{"b":[1,2,{"z":1,"a":2}],"a":"x"}"#).unwrap();
        assert_eq!(canonicalize_value(&value), canonicalize_value(&value));
    }
}
