//! Key ordering
//!
//! Parts compare first by kind, then by value:
//! bytes < strings < numbers < big integers < booleans.
//! Keys compare part by part; a key sorts before every key it prefixes.

use kvbridge_codec::{Key, KeyPart};
use std::cmp::Ordering;

fn kind_rank(part: &KeyPart) -> u8 {
    match part {
        KeyPart::Bytes(_) => 0,
        KeyPart::String(_) => 1,
        KeyPart::Number(_) => 2,
        KeyPart::BigInt(_) => 3,
        KeyPart::Boolean(_) => 4,
    }
}

pub fn compare_parts(a: &KeyPart, b: &KeyPart) -> Ordering {
    match (a, b) {
        (KeyPart::Bytes(x), KeyPart::Bytes(y)) => x.cmp(y),
        (KeyPart::String(x), KeyPart::String(y)) => x.cmp(y),
        (KeyPart::Number(x), KeyPart::Number(y)) => {
            // all NaNs are one key
            if x.is_nan() && y.is_nan() {
                Ordering::Equal
            } else {
                x.total_cmp(y)
            }
        }
        (KeyPart::BigInt(x), KeyPart::BigInt(y)) => x.cmp(y),
        (KeyPart::Boolean(x), KeyPart::Boolean(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

pub fn compare_keys(a: &Key, b: &Key) -> Ordering {
    a.parts()
        .iter()
        .zip(b.parts())
        .map(|(x, y)| compare_parts(x, y))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Key wrapper ordered by [`compare_keys`], usable in ordered collections
#[derive(Debug, Clone)]
pub struct OrderedKey(pub Key);

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedKey {}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(&self.0, &other.0)
    }
}
