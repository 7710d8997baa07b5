//! Process-local persistent store.
//!
//! Outlives any single manager: clones share the same map, so a new manager
//! pointed at the same store sees earlier writes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{PersistentStore, StoreOutcome};
use crate::cache::{CacheEntry, InvalidatePattern};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreOutcome<CacheEntry> {
        match self.entries.lock().await.get(key) {
            Some(entry) => StoreOutcome::Hit(entry.clone()),
            None => StoreOutcome::Miss,
        }
    }

    async fn put(&self, entry: &CacheEntry) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn remove_matching(&self, pattern: &InvalidatePattern) -> Result<usize> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern.matches(key));
        Ok(before - entries.len())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
