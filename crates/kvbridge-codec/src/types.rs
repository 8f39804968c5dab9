//! Key and value types carried across the bridge
//!
//! Both [`KeyPart`] and [`Value`] are closed enums. Equality is structural:
//! floats compare by bit pattern with all NaNs equal, so `-0.0` and `0.0`
//! are distinct parts, and map/set collections compare without regard to
//! insertion order.

use crate::error::{CodecError, ParseBigIntError};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn same_number(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

// ============================================================================
// BigInteger
// ============================================================================

/// Arbitrary precision signed integer, held in normalized decimal form
///
/// Only the strict digits grammar `-?[0-9]+` is accepted. Leading zeros are
/// dropped and `-0` collapses to `0`, so two equal integers always share one
/// representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigInteger(String);

impl BigInteger {
    /// Decimal digits, with a leading `-` for negative values
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.starts_with('-')
    }

    fn magnitude(&self) -> &str {
        self.0.trim_start_matches('-')
    }
}

impl FromStr for BigInteger {
    type Err = ParseBigIntError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseBigIntError(text.to_string()));
        }

        let significant = digits.trim_start_matches('0');
        let normalized = if significant.is_empty() {
            "0".to_string()
        } else if negative {
            format!("-{}", significant)
        } else {
            significant.to_string()
        };
        Ok(Self(normalized))
    }
}

impl Ord for BigInteger {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_negative(), other.is_negative()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (negative, _) => {
                let (a, b) = (self.magnitude(), other.magnitude());
                let by_magnitude = a.len().cmp(&b.len()).then_with(|| a.cmp(b));
                if negative {
                    by_magnitude.reverse()
                } else {
                    by_magnitude
                }
            }
        }
    }
}

impl PartialOrd for BigInteger {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for BigInteger {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for BigInteger {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<i128> for BigInteger {
    fn from(n: i128) -> Self {
        Self(n.to_string())
    }
}

// ============================================================================
// Keys
// ============================================================================

/// One ordered component of a key
#[derive(Debug, Clone)]
pub enum KeyPart {
    String(String),
    /// Any f64, including NaN and the infinities
    Number(f64),
    Boolean(bool),
    BigInt(BigInteger),
    Bytes(Vec<u8>),
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyPart::String(a), KeyPart::String(b)) => a == b,
            (KeyPart::Number(a), KeyPart::Number(b)) => same_number(*a, *b),
            (KeyPart::Boolean(a), KeyPart::Boolean(b)) => a == b,
            (KeyPart::BigInt(a), KeyPart::BigInt(b)) => a == b,
            (KeyPart::Bytes(a), KeyPart::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::String(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::String(s)
    }
}

impl From<f64> for KeyPart {
    fn from(n: f64) -> Self {
        KeyPart::Number(n)
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Boolean(b)
    }
}

impl From<BigInteger> for KeyPart {
    fn from(n: BigInteger) -> Self {
        KeyPart::BigInt(n)
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(bytes: Vec<u8>) -> Self {
        KeyPart::Bytes(bytes)
    }
}

/// Ordered sequence of key parts
///
/// Part order and count are meaningful to the storage engine; the codec
/// never reorders or truncates them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Key(Vec<KeyPart>);

impl Key {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn into_parts(self) -> Vec<KeyPart> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every part of `prefix` matches the leading parts of this key
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

impl From<Vec<KeyPart>> for Key {
    fn from(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }
}

impl FromIterator<KeyPart> for Key {
    fn from_iter<I: IntoIterator<Item = KeyPart>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Regular expressions
// ============================================================================

/// Flags a regex literal may carry, each at most once
pub const REGEXP_FLAGS: &str = "dgimsuyv";

fn literal_re() -> &'static Regex {
    static LITERAL_RE: OnceLock<Regex> = OnceLock::new();
    LITERAL_RE.get_or_init(|| Regex::new(r"(?s)\A/(.*)/([a-z]*)\z").expect("valid regex"))
}

/// Regular expression source and flags, kept as text
///
/// The pattern is never compiled here; it is carried verbatim so that the
/// receiving side can hand it to whatever engine it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpLiteral {
    pattern: String,
    flags: String,
}

impl RegExpLiteral {
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>) -> Result<Self, CodecError> {
        let flags = flags.into();
        let mut seen = String::new();
        for flag in flags.chars() {
            if !REGEXP_FLAGS.contains(flag) || seen.contains(flag) {
                return Err(CodecError::TypeMismatch {
                    expected: "RegExp",
                    found: format!("flags {:?}", flags),
                });
            }
            seen.push(flag);
        }
        Ok(Self {
            pattern: pattern.into(),
            flags,
        })
    }

    /// Parse literal text of the form `/pattern/flags`
    pub fn parse(literal: &str) -> Result<Self, CodecError> {
        let captures = literal_re()
            .captures(literal)
            .ok_or_else(|| CodecError::TypeMismatch {
                expected: "RegExp",
                found: format!("{:?}", literal),
            })?;
        Self::new(&captures[1], &captures[2])
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for RegExpLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}

// ============================================================================
// Values
// ============================================================================

/// Value stored under a key
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    BigInt(BigInteger),
    /// Absence of a value, distinct from `Null`
    Undefined,
    Null,
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    RegExp(RegExpLiteral),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
    /// Value-to-value mapping; insertion order is not significant
    Map(Vec<(Value, Value)>),
    /// Collection of values; insertion order is not significant
    Set(Vec<Value>),
}

impl Value {
    /// Tag used for this value on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::BigInt(_) => "BigInt",
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Bytes(_) => "Uint8Array",
            Value::Timestamp(_) => "Date",
            Value::RegExp(_) => "RegExp",
            Value::List(_) => "Array",
            Value::Record(_) => "Object",
            Value::Map(_) => "Map",
            Value::Set(_) => "Set",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => same_number(*a, *b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::RegExp(a), Value::RegExp(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => same_members(a, b),
            (Value::Set(a), Value::Set(b)) => same_members(a, b),
            _ => false,
        }
    }
}

/// Order-insensitive comparison where each element of `b` is matched once
fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut taken = vec![false; b.len()];
    a.iter().all(|item| {
        match (0..b.len()).find(|&i| !taken[i] && b[i] == *item) {
            Some(i) => {
                taken[i] = true;
                true
            }
            None => false,
        }
    })
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<BigInteger> for Value {
    fn from(n: BigInteger) -> Self {
        Value::BigInt(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

/// A stored entry as returned by the storage engine
///
/// The versionstamp is an opaque token; nothing in the bridge interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Key,
    pub value: Value,
    pub versionstamp: String,
}
