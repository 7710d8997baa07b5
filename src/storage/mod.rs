//! Persistent Store Module
//!
//! Optional durable tier behind the in-memory cache. Every operation is
//! allowed to fail; the manager degrades failures to a cache miss.

mod file;
mod memory;

use async_trait::async_trait;

use crate::cache::{CacheEntry, InvalidatePattern};
use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Logical table name entries are grouped under.
pub const TABLE_NAME: &str = "cache";

// == Store Outcome ==
/// Result of reading one key from a persistent store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome<T> {
    /// The key is present
    Hit(T),
    /// The key is absent
    Miss,
    /// The store could not answer; the reason is for logging only
    Unavailable(String),
}

impl<T> StoreOutcome<T> {
    /// Collapses to `Some` for a hit and `None` otherwise.
    pub fn hit(self) -> Option<T> {
        match self {
            StoreOutcome::Hit(value) => Some(value),
            StoreOutcome::Miss | StoreOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreOutcome::Unavailable(_))
    }
}

// == Persistent Store Trait ==
/// Asynchronous key-value store keyed by cache key.
///
/// Write operations report failures as [`CacheError::Storage`](crate::CacheError::Storage).
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreOutcome<CacheEntry>;

    /// Stores an entry, replacing any previous value for its key.
    async fn put(&self, entry: &CacheEntry) -> Result<()>;

    /// Deletes every entry whose key matches, returning how many were removed.
    async fn remove_matching(&self, pattern: &InvalidatePattern) -> Result<usize>;

    async fn clear(&self) -> Result<()>;
}
