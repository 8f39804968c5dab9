//! Typed client for the kvbridge HTTP protocol
//!
//! Keys and values are encoded with `kvbridge-codec` on the way out and
//! decoded on the way back, so callers only see [`Key`](kvbridge_codec::Key),
//! [`Value`](kvbridge_codec::Value) and [`Entry`](kvbridge_codec::Entry).

pub mod client;
pub mod config;
pub mod error;

pub use client::{BridgeClient, BrowseOptions, CallOutcome, SetOptions};
pub use config::BridgeClientConfig;
pub use error::{ClientError, ClientErrorKind, ClientResult};
