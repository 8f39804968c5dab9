//! In-memory ordered storage engine
//!
//! All entries live in one `BTreeMap` behind a `RwLock`: reads run
//! concurrently, writes are serialized. Expired entries are hidden on read
//! and reclaimed by [`MemoryStore::cleanup_expired`].
//!
//! Every write publishes the changed key on a broadcast channel, which backs
//! [`KvStore::watch`].

use crate::error::{StoreError, StoreResult};
use crate::order::OrderedKey;
use crate::store::{KvStore, ListOptions, ListPage, Selector, WatchStream};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::StreamExt;
use kvbridge_codec::{decode_key_value, encode_key, DecodeKeyOptions, Entry, Key, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the change feed before slow watchers start lagging
const CHANGE_FEED_CAPACITY: usize = 1024;

/// Stored value with metadata
#[derive(Debug, Clone)]
struct StoredEntry {
    value: Value,
    versionstamp: String,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| Instant::now() >= exp).unwrap_or(false)
    }

    fn to_entry(&self, key: &Key) -> Entry {
        Entry {
            key: key.clone(),
            value: self.value.clone(),
            versionstamp: self.versionstamp.clone(),
        }
    }
}

#[derive(Default)]
struct State {
    entries: BTreeMap<OrderedKey, StoredEntry>,
    version: u64,
}

impl State {
    fn next_versionstamp(&mut self) -> String {
        self.version += 1;
        format!("{:020x}", self.version)
    }

    fn live(&self, key: &Key) -> Option<Entry> {
        let ordered = OrderedKey(key.clone());
        self.entries
            .get(&ordered)
            .filter(|stored| !stored.is_expired())
            .map(|stored| stored.to_entry(key))
    }
}

struct Inner {
    state: RwLock<State>,
    changes: broadcast::Sender<Key>,
}

/// In-process [`KvStore`]
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State::default()),
                changes,
            }),
        }
    }

    /// Number of stored entries, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.inner.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all expired entries, returns count removed
    pub fn cleanup_expired(&self) -> usize {
        let mut state = self.inner.state.write();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired());
        before - state.entries.len()
    }

    fn current(&self, key: &Key) -> Option<Entry> {
        self.inner.state.read().live(key)
    }

    fn publish(&self, key: &Key) {
        // no receivers is fine
        let _ = self.inner.changes.send(key.clone());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Cursors
// ============================================================================

fn encode_cursor(key: &Key) -> String {
    URL_SAFE_NO_PAD.encode(encode_key(key).to_string())
}

fn decode_cursor(cursor: &str) -> StoreResult<Key> {
    let invalid = || StoreError::InvalidCursor(cursor.to_string());
    let bytes = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| invalid())?;
    let json: serde_json::Value = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
    decode_key_value(&json, DecodeKeyOptions::default()).map_err(|_| invalid())
}

/// Lower bound of the scan: the selector's own bound, or just past the
/// cursor when that lies further along
fn scan_start(lower: Bound<OrderedKey>, resume_after: Option<OrderedKey>) -> Bound<OrderedKey> {
    let Some(after) = resume_after else {
        return lower;
    };
    let before_lower = match &lower {
        Bound::Included(start) | Bound::Excluded(start) => after < *start,
        Bound::Unbounded => false,
    };
    if before_lower {
        lower
    } else {
        Bound::Excluded(after)
    }
}

fn selector_bounds(selector: &Selector) -> (Bound<OrderedKey>, Option<&Key>) {
    match selector {
        Selector::Prefix(prefix) => (Bound::Excluded(OrderedKey(prefix.clone())), None),
        Selector::Range { start, end } => (
            start
                .as_ref()
                .map(|s| Bound::Included(OrderedKey(s.clone())))
                .unwrap_or(Bound::Unbounded),
            end.as_ref(),
        ),
    }
}

fn past_end(selector: &Selector, end: Option<&Key>, key: &OrderedKey) -> bool {
    match selector {
        Selector::Prefix(prefix) => !key.0.starts_with(prefix),
        Selector::Range { .. } => end
            .map(|end| *key >= OrderedKey(end.clone()))
            .unwrap_or(false),
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &Key) -> StoreResult<Option<Entry>> {
        Ok(self.current(key))
    }

    async fn set(&self, key: &Key, value: Value, expire_in: Option<Duration>) -> StoreResult<String> {
        let versionstamp = {
            let mut state = self.inner.state.write();
            let versionstamp = state.next_versionstamp();
            let stored = StoredEntry {
                value,
                versionstamp: versionstamp.clone(),
                // a deadline past the clock's range never expires
                expires_at: expire_in.and_then(|ttl| Instant::now().checked_add(ttl)),
            };
            state.entries.insert(OrderedKey(key.clone()), stored);
            versionstamp
        };

        debug!(parts = key.len(), %versionstamp, "Entry written");
        self.publish(key);
        Ok(versionstamp)
    }

    async fn delete(&self, key: &Key) -> StoreResult<()> {
        let removed = self
            .inner
            .state
            .write()
            .entries
            .remove(&OrderedKey(key.clone()))
            .is_some();

        if removed {
            self.publish(key);
        }
        Ok(())
    }

    async fn list(&self, selector: &Selector, options: &ListOptions) -> StoreResult<ListPage> {
        let resume_after = options
            .cursor
            .as_deref()
            .map(decode_cursor)
            .transpose()?
            .map(OrderedKey);

        let (lower, end) = selector_bounds(selector);
        let start = scan_start(lower, resume_after);

        let state = self.inner.state.read();
        let entries: Vec<Entry> = state
            .entries
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| !past_end(selector, end, key))
            .filter(|(_, stored)| !stored.is_expired())
            .take(options.limit)
            .map(|(key, stored)| stored.to_entry(&key.0))
            .collect();
        drop(state);

        let cursor = entries
            .last()
            .map(|entry| encode_cursor(&entry.key))
            .unwrap_or_default();

        Ok(ListPage { entries, cursor })
    }

    async fn watch(&self, key: &Key) -> StoreResult<WatchStream> {
        // subscribe before the first read so no change slips in between
        let mut changes = self.inner.changes.subscribe();
        let store = self.clone();
        let key = key.clone();

        let stream = async_stream::stream! {
            yield Ok(store.current(&key));

            loop {
                match changes.recv().await {
                    Ok(changed) if changed == key => {
                        yield Ok(store.current(&key));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Watcher lagged behind change feed");
                        yield Ok(store.current(&key));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(stream.boxed())
    }
}
