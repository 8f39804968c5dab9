//! Key encoding
//!
//! A wire key is a JSON array with one element per key part. Strings,
//! finite numbers and booleans are carried as bare JSON; everything JSON
//! cannot hold exactly is wrapped as `{"type": ..., "value": "<text>"}`.

use crate::error::{preview, CodecError};
use crate::types::{BigInteger, Key, KeyPart};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value as Json};

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Options for [`decode_key`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeKeyOptions {
    /// Accept `[]`. Only prefixes may be empty; the empty prefix selects
    /// the whole keyspace.
    pub allow_empty_key: bool,
}

impl DecodeKeyOptions {
    pub fn allow_empty() -> Self {
        Self {
            allow_empty_key: true,
        }
    }
}

/// Encode a key as a JSON array of wire parts
pub fn encode_key(key: &Key) -> Json {
    Json::Array(key.parts().iter().map(encode_key_part).collect())
}

/// Encode a single key part
pub fn encode_key_part(part: &KeyPart) -> Json {
    match part {
        KeyPart::String(s) => Json::String(s.clone()),
        KeyPart::Boolean(b) => Json::Bool(*b),
        KeyPart::Number(n) => match special_number_name(*n) {
            Some(name) => json!({ "type": "Number", "value": name }),
            None => number_to_json(*n),
        },
        KeyPart::BigInt(n) => json!({ "type": "BigInt", "value": n.as_str() }),
        KeyPart::Bytes(bytes) => json!({ "type": "Uint8Array", "value": encode_bytes(bytes) }),
    }
}

/// Decode a key from its JSON text form
pub fn decode_key(text: &str, options: DecodeKeyOptions) -> Result<Key, CodecError> {
    let parsed: Json = serde_json::from_str(text)
        .map_err(|e| CodecError::MalformedInput(format!("key is not valid JSON: {}", e)))?;
    decode_key_value(&parsed, options)
}

/// Decode a key that has already been parsed out of a JSON document
pub fn decode_key_value(value: &Json, options: DecodeKeyOptions) -> Result<Key, CodecError> {
    let parts = value
        .as_array()
        .ok_or_else(|| CodecError::MalformedInput(format!("key must be an array: {}", preview(value))))?;

    if parts.is_empty() && !options.allow_empty_key {
        return Err(CodecError::EmptyKey);
    }

    parts.iter().map(decode_key_part).collect()
}

fn decode_key_part(part: &Json) -> Result<KeyPart, CodecError> {
    match part {
        Json::String(s) => Ok(KeyPart::String(s.clone())),
        Json::Bool(b) => Ok(KeyPart::Boolean(*b)),
        Json::Number(n) => n
            .as_f64()
            .map(KeyPart::Number)
            .ok_or_else(|| CodecError::UnknownPartEncoding(n.to_string())),
        Json::Object(fields) => decode_wrapped_part(fields)
            .ok_or_else(|| CodecError::UnknownPartEncoding(preview(part))),
        Json::Null | Json::Array(_) => Err(CodecError::UnknownPartEncoding(preview(part))),
    }
}

fn decode_wrapped_part(fields: &Map<String, Json>) -> Option<KeyPart> {
    if fields.len() != 2 {
        return None;
    }
    let tag = fields.get("type")?.as_str()?;
    let text = fields.get("value")?.as_str()?;

    match tag {
        "Number" => parse_number_text(text).map(KeyPart::Number),
        "BigInt" => text.parse::<BigInteger>().ok().map(KeyPart::BigInt),
        "Uint8Array" => decode_bytes(text).map(KeyPart::Bytes),
        _ => None,
    }
}

// ============================================================================
// Shared scalar helpers
// ============================================================================

/// Wire name of a non-finite float, `None` for finite values
pub(crate) fn special_number_name(n: f64) -> Option<&'static str> {
    if n.is_nan() {
        Some("NaN")
    } else if n == f64::INFINITY {
        Some("Infinity")
    } else if n == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

/// Exact-match lookup of a non-finite float name
pub(crate) fn special_number_value(name: &str) -> Option<f64> {
    match name {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Number text inside a `Number` wrapper: a special name or finite decimal
fn parse_number_text(text: &str) -> Option<f64> {
    if let Some(n) = special_number_value(text) {
        return Some(n);
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Finite float as a JSON number, integral values as JSON integers
pub(crate) fn number_to_json(n: f64) -> Json {
    let is_negative_zero = n == 0.0 && n.is_sign_negative();
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER && !is_negative_zero {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}

pub(crate) fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode_bytes(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;

    #[test]
    fn test_encode_plain_parts() {
        let encoded = encode_key(&key!["users", 42.0, true]);
        assert_eq!(encoded, json!(["users", 42, true]));
    }

    #[test]
    fn test_encode_fractional_number() {
        assert_eq!(encode_key(&key![1.5]), json!([1.5]));
    }

    #[test]
    fn test_encode_negative_zero_keeps_sign() {
        let encoded = encode_key(&key![-0.0]);
        let decoded = decode_key_value(&encoded, DecodeKeyOptions::default()).unwrap();
        match &decoded.parts()[0] {
            KeyPart::Number(n) => assert!(*n == 0.0 && n.is_sign_negative()),
            other => panic!("unexpected part {:?}", other),
        }
    }

    #[test]
    fn test_encode_wrapped_parts() {
        let big: BigInteger = "123456789012345678901234567890".parse().unwrap();
        let key = key![f64::NEG_INFINITY, big, vec![0u8, 255]];
        assert_eq!(
            encode_key(&key),
            json!([
                {"type": "Number", "value": "-Infinity"},
                {"type": "BigInt", "value": "123456789012345678901234567890"},
                {"type": "Uint8Array", "value": "AP8="}
            ])
        );
    }

    #[test]
    fn test_decode_empty_key() {
        let strict = decode_key("[]", DecodeKeyOptions::default());
        assert_eq!(strict, Err(CodecError::EmptyKey));

        let lenient = decode_key("[]", DecodeKeyOptions::allow_empty()).unwrap();
        assert!(lenient.is_empty());
    }

    #[test]
    fn test_decode_malformed_input() {
        for text in ["", "not json", "{\"a\":1}", "\"users\"", "[1,"] {
            let err = decode_key(text, DecodeKeyOptions::default()).unwrap_err();
            assert!(
                matches!(err, CodecError::MalformedInput(_)),
                "{:?} gave {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_decode_unknown_part_encodings() {
        let rejected = [
            r#"[null]"#,
            r#"[[1]]"#,
            r#"[{"type":"Date","value":"2024-01-01"}]"#,
            r#"[{"type":"Number","value":"nan"}]"#,
            r#"[{"type":"Number","value":"inf"}]"#,
            r#"[{"type":"BigInt","value":"12n"}]"#,
            r#"[{"type":"BigInt","value":" 12"}]"#,
            r#"[{"type":"Uint8Array","value":"not base64!"}]"#,
            r#"[{"type":"BigInt","value":"1","extra":true}]"#,
            r#"[{"type":"BigInt","value":1}]"#,
        ];
        for text in rejected {
            let err = decode_key(text, DecodeKeyOptions::default()).unwrap_err();
            assert!(
                matches!(err, CodecError::UnknownPartEncoding(_)),
                "{} gave {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_decode_number_wrapper_with_finite_text() {
        let key = decode_key(r#"[{"type":"Number","value":"2.5"}]"#, DecodeKeyOptions::default())
            .unwrap();
        assert_eq!(key, key![2.5]);
    }

    #[test]
    fn test_number_to_json_large_values_stay_float() {
        assert_eq!(number_to_json(1e300), json!(1e300));
        assert_eq!(number_to_json(-7.0), json!(-7));
    }
}
