//! Wire codec for the kvbridge protocol
//!
//! Converts store keys and values to and from a JSON-compatible form.
//!
//! # Wire shapes
//! - Keys are JSON arrays. Strings, finite numbers and booleans travel bare;
//!   big integers, byte strings and non-finite numbers are wrapped as
//!   `{"type": ..., "value": "..."}`.
//! - Values are `{"type": ..., "data": ...}` envelopes. Composite values nest
//!   further envelopes inside plain JSON arrays and objects.
//!
//! Decoding only walks declared JSON structure. Nothing in a payload is ever
//! evaluated.

pub mod entry;
pub mod error;
pub mod key;
pub mod types;
pub mod value;

pub use entry::{decode_entry, encode_entries, encode_entry, WireEntry};
pub use error::{CodecError, ParseBigIntError};
pub use key::{decode_key, decode_key_value, encode_key, DecodeKeyOptions};
pub use types::{BigInteger, Entry, Key, KeyPart, RegExpLiteral, Value};
pub use value::{decode_value, encode_value};

/// Build a [`Key`] from a list of parts.
///
/// ```
/// use kvbridge_codec::{key, KeyPart};
///
/// let key = key!["users", 42.0, true];
/// assert_eq!(key.parts()[0], KeyPart::String("users".to_string()));
/// ```
#[macro_export]
macro_rules! key {
    () => { $crate::Key::default() };
    ($($part:expr),+ $(,)?) => {
        $crate::Key::new(vec![$($crate::KeyPart::from($part)),+])
    };
}
