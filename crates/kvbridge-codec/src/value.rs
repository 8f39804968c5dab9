//! Value encoding
//!
//! Every value travels as a `{"type": <tag>, "data": <payload>}` envelope.
//! Composite values (`Array`, `Object`, `Map`, `Set`) hold nested envelopes
//! in their payload.

use crate::error::CodecError;
use crate::key::{decode_bytes, encode_bytes, number_to_json, special_number_name, special_number_value};
use crate::types::{BigInteger, RegExpLiteral, Value};
use chrono::format::{Fixed, Item, Numeric, Pad, Parsed};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value as Json};
use std::collections::BTreeMap;

/// Encode a value as a wire envelope
pub fn encode_value(value: &Value) -> Json {
    let data = match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Number(n) => match special_number_name(*n) {
            Some(name) => Json::String(name.to_string()),
            None => number_to_json(*n),
        },
        Value::Boolean(b) => Json::Bool(*b),
        Value::BigInt(n) => Json::String(n.as_str().to_string()),
        Value::Undefined | Value::Null => Json::String(String::new()),
        Value::Bytes(bytes) => Json::String(encode_bytes(bytes)),
        Value::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::RegExp(re) => Json::String(re.to_string()),
        Value::List(items) | Value::Set(items) => {
            Json::Array(items.iter().map(encode_value).collect())
        }
        Value::Record(fields) => Json::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), encode_value(v)))
                .collect::<Map<String, Json>>(),
        ),
        Value::Map(pairs) => Json::Array(
            pairs
                .iter()
                .map(|(k, v)| Json::Array(vec![encode_value(k), encode_value(v)]))
                .collect(),
        ),
    };

    json!({ "type": value.type_name(), "data": data })
}

/// Decode a wire envelope into a value
///
/// Only the declared JSON structure is inspected; string payloads are
/// parsed by their type's grammar and never interpreted otherwise.
pub fn decode_value(envelope: &Json) -> Result<Value, CodecError> {
    let fields = envelope.as_object().ok_or(CodecError::MissingType)?;
    let tag = fields
        .get("type")
        .and_then(Json::as_str)
        .filter(|tag| !tag.is_empty())
        .ok_or(CodecError::MissingType)?;
    let data = fields.get("data").ok_or(CodecError::MissingData)?;

    match tag {
        "String" => data
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| CodecError::mismatch("String", data)),
        "Number" => decode_number(data),
        "Boolean" => data
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| CodecError::mismatch("Boolean", data)),
        "BigInt" => data
            .as_str()
            .and_then(|s| s.parse::<BigInteger>().ok())
            .map(Value::BigInt)
            .ok_or_else(|| CodecError::mismatch("BigInt", data)),
        "Undefined" => decode_unit(data, "Undefined", Value::Undefined),
        "Null" => decode_unit(data, "Null", Value::Null),
        "Uint8Array" => data
            .as_str()
            .and_then(decode_bytes)
            .map(Value::Bytes)
            .ok_or_else(|| CodecError::mismatch("Uint8Array", data)),
        "Date" => data
            .as_str()
            .and_then(parse_timestamp)
            .map(Value::Timestamp)
            .ok_or_else(|| CodecError::mismatch("Date", data)),
        "RegExp" => {
            let literal = data.as_str().ok_or_else(|| CodecError::mismatch("RegExp", data))?;
            RegExpLiteral::parse(literal).map(Value::RegExp)
        }
        "Array" => decode_items(data, "Array").map(Value::List),
        "Set" => decode_items(data, "Set").map(Value::Set),
        "Object" => {
            let object = data.as_object().ok_or_else(|| CodecError::mismatch("Object", data))?;
            let mut record = BTreeMap::new();
            for (name, nested) in object {
                record.insert(name.clone(), decode_value(nested)?);
            }
            Ok(Value::Record(record))
        }
        "Map" => decode_pairs(data).map(Value::Map),
        other => Err(CodecError::UnsupportedType(other.to_string())),
    }
}

fn decode_number(data: &Json) -> Result<Value, CodecError> {
    let n = match data {
        Json::Number(n) => n.as_f64(),
        Json::String(name) => special_number_value(name),
        _ => None,
    };
    n.map(Value::Number)
        .ok_or_else(|| CodecError::mismatch("Number", data))
}

fn decode_unit(data: &Json, expected: &'static str, value: Value) -> Result<Value, CodecError> {
    match data {
        Json::Null => Ok(value),
        Json::String(s) if s.is_empty() => Ok(value),
        _ => Err(CodecError::mismatch(expected, data)),
    }
}

fn decode_items(data: &Json, expected: &'static str) -> Result<Vec<Value>, CodecError> {
    data.as_array()
        .ok_or_else(|| CodecError::mismatch(expected, data))?
        .iter()
        .map(decode_value)
        .collect()
}

fn decode_pairs(data: &Json) -> Result<Vec<(Value, Value)>, CodecError> {
    let pairs = data.as_array().ok_or_else(|| CodecError::mismatch("Map", data))?;
    pairs
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([k, v]) => Ok((decode_value(k)?, decode_value(v)?)),
            _ => Err(CodecError::mismatch("Map", pair)),
        })
        .collect()
}

/// RFC 3339 plus the signed extended-year form (`+10000-01-01T00:00:00Z`)
/// written for years outside `0..=9999`
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    const EXTENDED: &[Item<'static>] = &[
        Item::Numeric(Numeric::Year, Pad::Zero),
        Item::Literal("-"),
        Item::Numeric(Numeric::Month, Pad::Zero),
        Item::Literal("-"),
        Item::Numeric(Numeric::Day, Pad::Zero),
        Item::Literal("T"),
        Item::Numeric(Numeric::Hour, Pad::Zero),
        Item::Literal(":"),
        Item::Numeric(Numeric::Minute, Pad::Zero),
        Item::Literal(":"),
        Item::Numeric(Numeric::Second, Pad::Zero),
        Item::Fixed(Fixed::Nanosecond),
        Item::Fixed(Fixed::TimezoneOffsetColonZ),
    ];

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    let mut parsed = Parsed::default();
    chrono::format::parse(&mut parsed, text, EXTENDED.iter()).ok()?;
    parsed.to_datetime().ok().map(|ts| ts.with_timezone(&Utc))
}
