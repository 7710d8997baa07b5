//! Fetch Cache - A client-side HTTP response cache
//!
//! Wraps an HTTP transport with network-only, cache-first, network-first and
//! stale-while-revalidate strategies over a two-tier store (memory plus an
//! optional persistent store), with TTL / `Cache-Control` / ETag expiry and
//! memory-bounded eviction.

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod reactive;
pub mod shared;
pub mod storage;
pub mod strategy;
pub mod transport;

pub use cache::{CacheEntry, CacheStats, InvalidatePattern};
pub use config::Config;
pub use error::{CacheError, Result};
pub use manager::{CacheManager, CacheManagerBuilder, WarmUpReport};
pub use reactive::{use_cached_fetch, CachedFetch, FetchState};
pub use shared::api_cache;
pub use storage::{FileStore, MemoryStore, PersistentStore, StoreOutcome};
pub use strategy::{CacheConfig, FetchOptions, Strategy};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
