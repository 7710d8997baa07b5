//! Cache Module
//!
//! Entry records, the in-memory tier with memory-bounded eviction, expiry
//! policy and key derivation.

mod entry;
mod eviction;
pub mod expiry;
pub mod key;
mod memory;
mod pattern;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use eviction::EvictionQueue;
pub use key::{default_key, CacheKeyFn};
pub use memory::{serialized_len, MemoryTier, SizeEstimator};
pub use pattern::InvalidatePattern;
pub use stats::CacheStats;

// == Public Constants ==
/// Default in-memory ceiling in estimated bytes
pub const DEFAULT_MAX_MEMORY_BYTES: usize = 50 * 1024 * 1024; // 50 MB
