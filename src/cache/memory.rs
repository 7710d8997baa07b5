//! Memory Tier Module
//!
//! Volatile in-memory map with approximate byte accounting and oldest-first
//! eviction once a size ceiling is crossed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, EvictionQueue};

// == Size Estimator ==
/// Estimates the in-memory footprint of a payload in bytes.
///
/// This is a heuristic, not a precise byte count.
pub type SizeEstimator = Arc<dyn Fn(&Value) -> usize + Send + Sync>;

/// Default estimator: length of the payload's JSON serialization.
pub fn serialized_len(data: &Value) -> usize {
    serde_json::to_string(data).map(|s| s.len()).unwrap_or(0)
}

// == Memory Tier ==
/// In-memory cache tier owned by one manager.
pub struct MemoryTier {
    entries: HashMap<String, CacheEntry>,
    order: EvictionQueue,
    stats: CacheStats,
    total_bytes: usize,
    max_bytes: usize,
    estimator: SizeEstimator,
}

impl fmt::Debug for MemoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTier")
            .field("entries", &self.entries.len())
            .field("total_bytes", &self.total_bytes)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl MemoryTier {
    // == Constructor ==
    /// Creates an empty tier with the given byte ceiling and default estimator.
    pub fn new(max_bytes: usize) -> Self {
        Self::with_estimator(max_bytes, Arc::new(serialized_len))
    }

    pub fn with_estimator(max_bytes: usize, estimator: SizeEstimator) -> Self {
        Self {
            entries: HashMap::new(),
            order: EvictionQueue::new(),
            stats: CacheStats::new(),
            total_bytes: 0,
            max_bytes,
            estimator,
        }
    }

    pub fn set_estimator(&mut self, estimator: SizeEstimator) {
        self.estimator = estimator;
    }

    // == Insert ==
    /// Stores an entry, replacing any previous entry for the same key, then
    /// evicts oldest entries until the tracked total is back under budget.
    ///
    /// Returns the keys evicted by this write.
    pub fn insert(&mut self, entry: CacheEntry) -> Vec<String> {
        let size = (self.estimator)(&entry.data);
        let key = entry.key.clone();

        if let Some(previous) = self.order.push(&key, size) {
            self.total_bytes = self.total_bytes.saturating_sub(previous);
        }
        self.total_bytes += size;
        self.entries.insert(key, entry);

        self.evict_over_budget()
    }

    fn evict_over_budget(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.total_bytes > self.max_bytes {
            let Some((key, size)) = self.order.pop_oldest() else {
                break;
            };
            self.entries.remove(&key);
            self.total_bytes = self.total_bytes.saturating_sub(size);
            self.stats.record_eviction();
            debug!(key = %key, size, "evicted entry from memory tier");
            evicted.push(key);
        }
        evicted
    }

    // == Get ==
    /// Returns the entry for `key` regardless of freshness.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        if let Some(size) = self.order.remove(key) {
            self.total_bytes = self.total_bytes.saturating_sub(size);
        }
        Some(entry)
    }

    /// Removes every entry whose key satisfies `matches`, returning the count.
    pub fn remove_matching<F>(&mut self, matches: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| matches(key))
            .cloned()
            .collect();

        for key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }

    // == Stats ==
    /// Returns counters with the current entry count and byte total filled in.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.memory_bytes = self.total_bytes;
        stats
    }

    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn entry(key: &str, data: Value) -> CacheEntry {
        CacheEntry::new(key, data, Duration::seconds(300), None)
    }

    #[test]
    fn test_insert_and_get() {
        let mut tier = MemoryTier::new(1024);
        tier.insert(entry("a", json!({"id": 1})));

        assert_eq!(tier.get("a").unwrap().data, json!({"id": 1}));
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.total_bytes(), serialized_len(&json!({"id": 1})));
    }

    #[test]
    fn test_overwrite_replaces_size() {
        let mut tier = MemoryTier::new(1024);
        tier.insert(entry("a", json!("xxxxxxxxxx")));
        tier.insert(entry("a", json!("x")));

        assert_eq!(tier.len(), 1);
        assert_eq!(tier.total_bytes(), serialized_len(&json!("x")));
    }

    #[test]
    fn test_eviction_drops_oldest_first() {
        let mut tier = MemoryTier::with_estimator(10, Arc::new(|_| 4));
        tier.insert(entry("a", json!(1)));
        tier.insert(entry("b", json!(2)));

        let evicted = tier.insert(entry("c", json!(3)));

        assert_eq!(evicted, vec!["a".to_string()]);
        assert!(!tier.contains("a"));
        assert!(tier.contains("b"));
        assert!(tier.contains("c"));
        assert_eq!(tier.stats().evictions, 1);
    }

    #[test]
    fn test_oversized_entry_evicts_everything_older() {
        let mut tier = MemoryTier::new(64);
        tier.insert(entry("small", json!("tiny")));

        let big = json!("x".repeat(100));
        let evicted = tier.insert(entry("big", big));

        assert!(evicted.contains(&"small".to_string()));
        assert!(tier.total_bytes() <= tier.max_bytes());
    }

    #[test]
    fn test_reads_do_not_reorder() {
        let mut tier = MemoryTier::with_estimator(8, Arc::new(|_| 4));
        tier.insert(entry("a", json!(1)));
        tier.insert(entry("b", json!(2)));
        let _ = tier.get("a");

        tier.insert(entry("c", json!(3)));

        assert!(!tier.contains("a"));
        assert!(tier.contains("b"));
    }

    #[test]
    fn test_remove_matching() {
        let mut tier = MemoryTier::new(1024);
        tier.insert(entry("/api/users/1", json!(1)));
        tier.insert(entry("/api/users/2", json!(2)));
        tier.insert(entry("/api/posts/1", json!(3)));

        let removed = tier.remove_matching(|key| key.contains("users"));

        assert_eq!(removed, 2);
        assert!(tier.contains("/api/posts/1"));
        assert_eq!(tier.total_bytes(), serialized_len(&json!(3)));
    }

    #[test]
    fn test_clear() {
        let mut tier = MemoryTier::new(1024);
        tier.insert(entry("a", json!(1)));
        tier.clear();
        tier.clear();

        assert!(tier.is_empty());
        assert_eq!(tier.total_bytes(), 0);
    }
}
