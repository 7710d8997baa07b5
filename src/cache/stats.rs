//! Cache Statistics Module
//!
//! Tracks hits per tier, misses, network traffic, evictions and storage failures.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters for one manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads answered by the in-memory tier
    pub memory_hits: u64,
    /// Reads answered by the persistent tier
    pub persistent_hits: u64,
    /// Reads that found nothing usable in either tier
    pub misses: u64,
    /// Requests handed to the transport, including background ones
    pub network_requests: u64,
    /// Background stale-while-revalidate refreshes started
    pub revalidations: u64,
    /// Entries dropped from memory to stay under the ceiling
    pub evictions: u64,
    /// Persistent store operations that failed
    pub storage_errors: u64,
    /// Current number of in-memory entries
    pub total_entries: usize,
    /// Estimated bytes held by in-memory entries
    pub memory_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses) across both tiers, or 0.0 with no reads.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.persistent_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn record_memory_hit(&mut self) {
        self.memory_hits += 1;
    }

    pub fn record_persistent_hit(&mut self) {
        self.persistent_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_network_request(&mut self) {
        self.network_requests += 1;
    }

    pub fn record_revalidation(&mut self) {
        self.revalidations += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_storage_error(&mut self) {
        self.storage_errors += 1;
    }
}
