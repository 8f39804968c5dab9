//! Ordered key-value storage for kvbridge
//!
//! [`KvStore`] is the interface the bridge server drives. [`MemoryStore`]
//! implements it in process: entries live in a single ordered map, keyed by
//! the tuple ordering defined in [`order`].

pub mod error;
pub mod memory;
pub mod order;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use order::{compare_keys, OrderedKey};
pub use store::{KvStore, ListOptions, ListPage, Selector, WatchStream};
