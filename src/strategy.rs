//! Strategy Module
//!
//! Caching strategies, per-call cache configuration and request options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheKeyFn;
use crate::error::CacheError;

// == Strategy ==
/// Precedence of cache vs. network for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Always hit the network; never read or write the cache
    NetworkOnly,
    /// Serve a valid cached entry, otherwise fetch and cache
    CacheFirst,
    /// Fetch first; fall back to any cached entry on network failure
    NetworkFirst,
    /// Serve cached data immediately, refresh in the background when stale
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "network-only" => Ok(Strategy::NetworkOnly),
            "cache-first" => Ok(Strategy::CacheFirst),
            "network-first" => Ok(Strategy::NetworkFirst),
            "stale-while-revalidate" => Ok(Strategy::StaleWhileRevalidate),
            other => Err(CacheError::UnknownStrategy(other.to_string())),
        }
    }
}

// == Cache Config ==
/// Per-call cache configuration. Not persisted.
#[derive(Clone)]
pub struct CacheConfig {
    pub strategy: Strategy,
    /// How long a stored entry stays valid
    pub ttl: Duration,
    /// Age after which stale-while-revalidate refreshes in the background
    pub stale_time: Option<Duration>,
    /// Custom key derivation
    pub cache_key: Option<CacheKeyFn>,
}

impl CacheConfig {
    pub fn new(strategy: Strategy, ttl: Duration) -> Self {
        Self {
            strategy,
            ttl,
            stale_time: None,
            cache_key: None,
        }
    }

    /// Builds a config from a strategy name, failing on unknown names.
    pub fn parse(strategy: &str, ttl: Duration) -> Result<Self, CacheError> {
        Ok(Self::new(strategy.parse()?, ttl))
    }

    pub fn network_only() -> Self {
        Self::new(Strategy::NetworkOnly, Duration::ZERO)
    }

    pub fn cache_first(ttl: Duration) -> Self {
        Self::new(Strategy::CacheFirst, ttl)
    }

    pub fn network_first(ttl: Duration) -> Self {
        Self::new(Strategy::NetworkFirst, ttl)
    }

    pub fn stale_while_revalidate(ttl: Duration, stale_time: Duration) -> Self {
        Self::new(Strategy::StaleWhileRevalidate, ttl).with_stale_time(stale_time)
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn with_cache_key<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&str, &FetchOptions) -> String + Send + Sync + 'static,
    {
        self.cache_key = Some(Arc::new(key_fn));
        self
    }
}

impl Default for CacheConfig {
    /// Stale-while-revalidate, 5 minute TTL, refresh after 1 minute.
    fn default() -> Self {
        Self::stale_while_revalidate(Duration::from_secs(300), Duration::from_secs(60))
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("strategy", &self.strategy)
            .field("ttl", &self.ttl)
            .field("stale_time", &self.stale_time)
            .field("cache_key", &self.cache_key.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// == Fetch Options ==
/// Request options plus an optional cache config for one call.
///
/// Without a cache config the manager's default applies.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub cache: Option<CacheConfig>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
            cache: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self::get().method("POST").body(body)
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::get()
    }
}
