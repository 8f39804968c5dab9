//! Query parameter validation
//!
//! Query values arrive as raw strings. Keys are JSON text decoded through
//! the key codec; an empty string counts as an absent parameter.

use crate::error::{BridgeError, BridgeResult, ValidationError};
use kvbridge_codec::{decode_key, DecodeKeyOptions, Key};
use kvbridge_store::{ListOptions, Selector};
use serde::Deserialize;
use std::time::Duration;

/// Raw `/browse` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    pub limit: Option<String>,
    pub cursor: Option<String>,
    pub prefix: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Raw `/set` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuery {
    pub key: Option<String>,
    pub expires: Option<String>,
}

/// Raw query of endpoints that take only a key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// Validated browse parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeDescriptor {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub prefix: Option<Key>,
    pub start: Option<Key>,
    pub end: Option<Key>,
}

impl RangeDescriptor {
    /// Range when `start` or `end` is given, otherwise the prefix
    pub fn selector(&self) -> Selector {
        if self.start.is_some() || self.end.is_some() {
            Selector::Range {
                start: self.start.clone(),
                end: self.end.clone(),
            }
        } else {
            Selector::Prefix(self.prefix.clone().unwrap_or_default())
        }
    }

    pub fn list_options(&self, default_limit: usize) -> ListOptions {
        ListOptions {
            limit: self.limit.unwrap_or(default_limit),
            cursor: self.cursor.clone(),
        }
    }
}

/// Validated set parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SetParams {
    pub key: Key,
    /// Time to live, measured from the request
    pub expire_in: Option<Duration>,
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|s| !s.is_empty())
}

fn decode_param(
    raw: &Option<String>,
    context: &'static str,
    options: DecodeKeyOptions,
) -> BridgeResult<Option<Key>> {
    present(raw)
        .map(|text| decode_key(text, options).map_err(|e| BridgeError::serialization(context, e)))
        .transpose()
}

pub fn validate_browse_params(query: &BrowseQuery) -> BridgeResult<RangeDescriptor> {
    let limit = present(&query.limit)
        .map(|raw| match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ValidationError::InvalidLimit(raw.to_string())),
        })
        .transpose()?;

    Ok(RangeDescriptor {
        limit,
        cursor: present(&query.cursor).map(str::to_string),
        prefix: decode_param(&query.prefix, "prefix", DecodeKeyOptions::allow_empty())?,
        start: decode_param(&query.start, "start", DecodeKeyOptions::default())?,
        end: decode_param(&query.end, "end", DecodeKeyOptions::default())?,
    })
}

/// Longest accepted `expires`, in milliseconds (100 million days)
pub const MAX_EXPIRES_MS: f64 = 8.64e15;

pub fn validate_set_params(query: &SetQuery) -> BridgeResult<SetParams> {
    let key = required_key(&query.key, "set")?;

    let expire_in = present(&query.expires)
        .map(|raw| {
            raw.parse::<f64>()
                .ok()
                .filter(|ms| ms.is_finite() && *ms > 0.0 && *ms <= MAX_EXPIRES_MS)
                .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
                .ok_or_else(|| ValidationError::InvalidExpiration(raw.to_string()))
        })
        .transpose()?;

    Ok(SetParams { key, expire_in })
}

/// Decode a mandatory, non-empty key parameter
///
/// `action` names the operation in the error message.
pub fn required_key(raw: &Option<String>, action: &'static str) -> BridgeResult<Key> {
    decode_param(raw, "key", DecodeKeyOptions::default())?
        .ok_or_else(|| ValidationError::MissingKey(action).into())
}
