//! Storage interface

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use kvbridge_codec::{Entry, Key, Value};
use std::time::Duration;

/// Which keys a list operation visits
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Every key strictly below `prefix`; the empty prefix selects all keys
    Prefix(Key),
    /// Keys in `[start, end)`, either side optional
    Range { start: Option<Key>, end: Option<Key> },
}

impl Selector {
    pub fn all() -> Self {
        Selector::Prefix(Key::default())
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Maximum number of entries in the page
    pub limit: usize,
    /// Token from a previous page; opaque to callers
    pub cursor: Option<String>,
}

/// One page of a list operation
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<Entry>,
    /// Resume token after the last entry, empty when the page is empty
    pub cursor: String,
}

/// Current state of a key followed by one item per change
pub type WatchStream = BoxStream<'static, StoreResult<Option<Entry>>>;

/// Trait for ordered key-value engines
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Read a single entry
    async fn get(&self, key: &Key) -> StoreResult<Option<Entry>>;

    /// Write a value, optionally expiring after `expire_in`; returns the new versionstamp
    async fn set(&self, key: &Key, value: Value, expire_in: Option<Duration>) -> StoreResult<String>;

    /// Remove a key; removing a missing key succeeds
    async fn delete(&self, key: &Key) -> StoreResult<()>;

    /// Scan entries in key order
    async fn list(&self, selector: &Selector, options: &ListOptions) -> StoreResult<ListPage>;

    /// Subscribe to changes of a single key
    async fn watch(&self, _key: &Key) -> StoreResult<WatchStream> {
        Err(StoreError::Unsupported("watch"))
    }
}
