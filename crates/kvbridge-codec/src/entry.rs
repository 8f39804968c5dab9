//! Entry wire shape shared by browse, get and watch responses

use crate::error::CodecError;
use crate::key::{decode_key_value, encode_key, DecodeKeyOptions};
use crate::types::{Entry, Key};
use crate::value::{decode_value, encode_value};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// `{key, value, versionstamp}` as sent over the wire
///
/// An absent entry (watch frames for a missing key) carries `null` in both
/// `value` and `versionstamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEntry {
    pub key: Json,
    pub value: Json,
    pub versionstamp: Option<String>,
}

impl WireEntry {
    /// Frame describing a key that currently holds no entry
    pub fn absent(key: &Key) -> Self {
        Self {
            key: encode_key(key),
            value: Json::Null,
            versionstamp: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.versionstamp.is_none()
    }
}

impl From<&Entry> for WireEntry {
    fn from(entry: &Entry) -> Self {
        encode_entry(entry)
    }
}

pub fn encode_entry(entry: &Entry) -> WireEntry {
    WireEntry {
        key: encode_key(&entry.key),
        value: encode_value(&entry.value),
        versionstamp: Some(entry.versionstamp.clone()),
    }
}

pub fn encode_entries(entries: &[Entry]) -> Vec<WireEntry> {
    entries.iter().map(encode_entry).collect()
}

/// Decode a wire entry, `None` for the absent form
pub fn decode_entry(wire: &WireEntry) -> Result<Option<Entry>, CodecError> {
    let Some(versionstamp) = &wire.versionstamp else {
        return Ok(None);
    };

    Ok(Some(Entry {
        key: decode_key_value(&wire.key, DecodeKeyOptions::default())?,
        value: decode_value(&wire.value)?,
        versionstamp: versionstamp.clone(),
    }))
}
