//! Configuration Module
//!
//! Loads cache manager configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_MAX_MEMORY_BYTES;
use crate::error::{CacheError, Result};
use crate::strategy::{CacheConfig, Strategy};

/// Cache manager configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL relative request paths are joined onto
    pub base_url: Option<String>,
    /// Strategy used when a call carries no cache config
    pub strategy: Strategy,
    /// Default TTL in seconds
    pub default_ttl: u64,
    /// Default stale time in seconds for stale-while-revalidate
    pub stale_time: u64,
    /// In-memory ceiling in estimated bytes
    pub max_memory_bytes: usize,
    /// Whether to enable the persistent tier
    pub persist: bool,
    /// Persistent store root; XDG cache directory when unset
    pub store_dir: Option<PathBuf>,
    /// Transport timeout in seconds
    pub request_timeout: u64,
    /// URLs the binary warms the cache with
    pub warmup_urls: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BASE_URL` - Base URL for relative paths (default: none)
    /// - `CACHE_STRATEGY` - Default strategy (default: stale-while-revalidate)
    /// - `CACHE_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_STALE_TIME` - Stale time in seconds (default: 60)
    /// - `CACHE_MAX_MEMORY_BYTES` - Memory ceiling (default: 50 MB)
    /// - `CACHE_PERSIST` - Enable the persistent tier (default: true)
    /// - `CACHE_STORE_DIR` - Persistent store directory (default: XDG cache dir)
    /// - `CACHE_REQUEST_TIMEOUT` - Request timeout in seconds (default: 30)
    /// - `CACHE_WARMUP_URLS` - Comma separated URLs to prefetch (default: none)
    ///
    /// Fails only when `CACHE_STRATEGY` names an unknown strategy.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let strategy = match env::var("CACHE_STRATEGY") {
            Ok(name) if !name.trim().is_empty() => name.parse()?,
            _ => defaults.strategy,
        };

        Ok(Self {
            base_url: non_empty_var("CACHE_BASE_URL"),
            strategy,
            default_ttl: parsed_var("CACHE_TTL").unwrap_or(defaults.default_ttl),
            stale_time: parsed_var("CACHE_STALE_TIME").unwrap_or(defaults.stale_time),
            max_memory_bytes: parsed_var("CACHE_MAX_MEMORY_BYTES")
                .unwrap_or(defaults.max_memory_bytes),
            persist: parsed_var("CACHE_PERSIST").unwrap_or(defaults.persist),
            store_dir: non_empty_var("CACHE_STORE_DIR").map(PathBuf::from),
            request_timeout: parsed_var("CACHE_REQUEST_TIMEOUT")
                .unwrap_or(defaults.request_timeout),
            warmup_urls: non_empty_var("CACHE_WARMUP_URLS")
                .map(|urls| {
                    urls.split(',')
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// The default per-call config derived from these settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.strategy, Duration::from_secs(self.default_ttl))
            .with_stale_time(Duration::from_secs(self.stale_time))
    }

    /// Rejects settings the manager cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_memory_bytes == 0 {
            return Err(CacheError::Config(
                "CACHE_MAX_MEMORY_BYTES must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(CacheError::Config(
                "CACHE_REQUEST_TIMEOUT must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            strategy: Strategy::StaleWhileRevalidate,
            default_ttl: 300,
            stale_time: 60,
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            persist: true,
            store_dir: None,
            request_timeout: 30,
            warmup_urls: Vec::new(),
        }
    }
}
