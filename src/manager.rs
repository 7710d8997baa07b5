//! Cache Manager
//!
//! Decides per call whether to hit the network, serve from cache, or both,
//! and keeps the two tiers up to date.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::expiry::{entry_lifetime, etag};
use crate::cache::key::resolve_key;
use crate::cache::{
    CacheEntry, CacheStats, InvalidatePattern, MemoryTier, SizeEstimator, DEFAULT_MAX_MEMORY_BYTES,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::storage::{FileStore, PersistentStore, StoreOutcome};
use crate::strategy::{CacheConfig, FetchOptions, Strategy};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

const NOT_MODIFIED: u16 = 304;

// == Builder ==
/// Assembles a [`CacheManager`].
pub struct CacheManagerBuilder {
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn PersistentStore>>,
    default_config: CacheConfig,
    max_memory_bytes: usize,
    estimator: Option<SizeEstimator>,
}

impl CacheManagerBuilder {
    /// Adds a persistent tier. Without one the manager is memory-only.
    pub fn store(mut self, store: impl PersistentStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Config applied to calls whose options carry none.
    pub fn default_config(mut self, config: CacheConfig) -> Self {
        self.default_config = config;
        self
    }

    pub fn max_memory_bytes(mut self, max_bytes: usize) -> Self {
        self.max_memory_bytes = max_bytes;
        self
    }

    /// Replaces the serialized-length size heuristic.
    pub fn size_estimator<F>(mut self, estimator: F) -> Self
    where
        F: Fn(&Value) -> usize + Send + Sync + 'static,
    {
        self.estimator = Some(Arc::new(estimator));
        self
    }

    pub fn build(self) -> CacheManager {
        let mut memory = MemoryTier::new(self.max_memory_bytes);
        if let Some(estimator) = self.estimator {
            memory.set_estimator(estimator);
        }

        CacheManager {
            inner: Arc::new(Inner {
                transport: self.transport,
                store: self.store,
                memory: RwLock::new(memory),
                default_config: self.default_config,
                background: Mutex::new(Vec::new()),
            }),
        }
    }
}

// == Warm-up Report ==
/// Outcome counts for [`CacheManager::warm_up`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    Memory,
    Persistent,
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn PersistentStore>>,
    memory: RwLock<MemoryTier>,
    default_config: CacheConfig,
    background: Mutex<Vec<JoinHandle<()>>>,
}

// == Cache Manager ==
/// HTTP fetch wrapper with pluggable caching strategies over a two-tier store.
///
/// Clones share the same tiers and background tasks.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("default_config", &self.inner.default_config)
            .field("persistent", &self.inner.store.is_some())
            .finish()
    }
}

impl CacheManager {
    // == Constructors ==
    /// Memory-only manager with the default stale-while-revalidate config.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: impl Transport + 'static) -> CacheManagerBuilder {
        Self::builder_with_transport(Arc::new(transport))
    }

    pub fn builder_with_transport(transport: Arc<dyn Transport>) -> CacheManagerBuilder {
        CacheManagerBuilder {
            transport,
            store: None,
            default_config: CacheConfig::default(),
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            estimator: None,
        }
    }

    /// Builds a reqwest-backed manager from loaded configuration.
    ///
    /// When persistence is enabled but no store directory can be resolved,
    /// the manager runs memory-only.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout),
        )?;

        let mut builder = Self::builder(transport)
            .default_config(config.cache_config())
            .max_memory_bytes(config.max_memory_bytes);

        if config.persist {
            let store = match &config.store_dir {
                Some(dir) => Some(FileStore::with_dir(dir)),
                None => FileStore::default_location(),
            };
            match store {
                Some(store) => {
                    debug!(dir = %store.dir().display(), "persistent tier enabled");
                    builder = builder.store(store);
                }
                None => warn!("no cache directory available, running memory-only"),
            }
        }

        Ok(builder.build())
    }

    pub fn default_config(&self) -> &CacheConfig {
        &self.inner.default_config
    }

    /// The key a request would be cached under.
    pub fn key_for(&self, url: &str, options: &FetchOptions) -> String {
        let config = options.cache.as_ref().unwrap_or(&self.inner.default_config);
        resolve_key(url, options, config.cache_key.as_ref())
    }

    // == Fetch ==
    /// Fetches `url` according to the options' cache config (or the default).
    ///
    /// Returns the parsed response body. Only 200 responses are cached;
    /// other statuses are returned as-is and never stored.
    pub async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Value> {
        let config = options
            .cache
            .clone()
            .unwrap_or_else(|| self.inner.default_config.clone());
        let key = resolve_key(url, &options, config.cache_key.as_ref());

        match config.strategy {
            Strategy::NetworkOnly => {
                let response = self.send(url, &options, None).await?;
                if response.status == 200 {
                    response.json()
                } else {
                    Ok(response.json_lenient())
                }
            }
            Strategy::CacheFirst => self.cache_first(url, &options, &key, &config).await,
            Strategy::NetworkFirst => self.network_first(url, &options, &key, &config).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(url, &options, &key, &config).await
            }
        }
    }

    /// [`fetch`](Self::fetch) and deserialize the body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str, options: FetchOptions) -> Result<T> {
        let value = self.fetch(url, options).await?;
        serde_json::from_value(value).map_err(|e| CacheError::Decode(e.to_string()))
    }

    async fn cache_first(
        &self,
        url: &str,
        options: &FetchOptions,
        key: &str,
        config: &CacheConfig,
    ) -> Result<Value> {
        let mut previous = None;
        if let Some((entry, tier)) = self.lookup(key).await {
            if entry.is_valid() {
                self.record_hit(tier).await;
                debug!(key, "cache-first hit");
                return Ok(entry.data);
            }
            previous = Some(entry);
        }

        self.record_miss().await;
        self.fetch_and_store(url, options, key, config.ttl, previous.as_ref())
            .await
    }

    async fn network_first(
        &self,
        url: &str,
        options: &FetchOptions,
        key: &str,
        config: &CacheConfig,
    ) -> Result<Value> {
        let previous = self.lookup(key).await;

        match self
            .fetch_and_store(url, options, key, config.ttl, previous.as_ref().map(|(e, _)| e))
            .await
        {
            Ok(data) => Ok(data),
            Err(err) => match previous {
                Some((entry, tier)) => {
                    warn!(key, error = %err, "network failed, serving cached data");
                    self.record_hit(tier).await;
                    Ok(entry.data)
                }
                None => {
                    self.record_miss().await;
                    Err(err)
                }
            },
        }
    }

    /// Serves a valid entry immediately, refreshing it in the background once
    /// it is older than `stale_time`. Only unexpired entries are served: an
    /// expired entry (always the case with a zero `ttl`) is re-fetched before
    /// returning, so stale-while-revalidate with `ttl == 0` never serves from cache.
    async fn stale_while_revalidate(
        &self,
        url: &str,
        options: &FetchOptions,
        key: &str,
        config: &CacheConfig,
    ) -> Result<Value> {
        let stale_time = chrono::Duration::from_std(config.stale_time.unwrap_or(Duration::ZERO))
            .unwrap_or_else(|_| chrono::Duration::zero());

        let mut previous = None;
        if let Some((entry, tier)) = self.lookup(key).await {
            if entry.is_valid() {
                self.record_hit(tier).await;
                if entry.is_stale(stale_time) {
                    self.spawn_revalidation(url, options, key, config.ttl, entry.clone())
                        .await;
                }
                return Ok(entry.data);
            }
            previous = Some(entry);
        }

        self.record_miss().await;
        self.fetch_and_store(url, options, key, config.ttl, previous.as_ref())
            .await
    }

    /// Refreshes `key` in the background. The caller's value is unaffected;
    /// a failure leaves the stale entry in place.
    async fn spawn_revalidation(
        &self,
        url: &str,
        options: &FetchOptions,
        key: &str,
        ttl: Duration,
        stale: CacheEntry,
    ) {
        let manager = self.clone();
        let url = url.to_string();
        let options = options.clone();
        let key = key.to_string();

        self.with_stats(|s| s.record_revalidation()).await;
        debug!(key = %key, "revalidating stale entry");

        let handle = tokio::spawn(async move {
            match manager
                .fetch_and_store(&url, &options, &key, ttl, Some(&stale))
                .await
            {
                Ok(_) => debug!(key = %key, "background revalidation complete"),
                Err(err) => warn!(key = %key, error = %err, "background revalidation failed"),
            }
        });

        let mut pending = self.inner.background.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    // == Network ==
    async fn send(
        &self,
        url: &str,
        options: &FetchOptions,
        previous: Option<&CacheEntry>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest {
            method: options.method.to_ascii_uppercase(),
            url: url.to_string(),
            headers: options.headers.clone(),
            body: options.body.clone(),
        };
        if let Some(tag) = previous.and_then(|entry| entry.etag.as_ref()) {
            request
                .headers
                .entry("if-none-match".to_string())
                .or_insert_with(|| tag.clone());
        }

        self.with_stats(|s| s.record_network_request()).await;
        self.inner.transport.send(request).await
    }

    /// Hits the network and caches a 200 (or a 304 against `previous`).
    async fn fetch_and_store(
        &self,
        url: &str,
        options: &FetchOptions,
        key: &str,
        ttl: Duration,
        previous: Option<&CacheEntry>,
    ) -> Result<Value> {
        let response = self.send(url, options, previous).await?;
        let lifetime = entry_lifetime(ttl, &response.headers);

        match (response.status, previous) {
            (200, _) => {
                let data = response.json()?;
                let entry = CacheEntry::new(key, data.clone(), lifetime, etag(&response.headers));
                self.write(entry).await;
                Ok(data)
            }
            (NOT_MODIFIED, Some(prev)) if prev.etag.is_some() => {
                debug!(key, "not modified, refreshing entry");
                let tag = etag(&response.headers).or_else(|| prev.etag.clone());
                let entry = CacheEntry::new(key, prev.data.clone(), lifetime, tag);
                self.write(entry).await;
                Ok(prev.data.clone())
            }
            (status, _) => {
                debug!(key, status, "response not cacheable");
                Ok(response.json_lenient())
            }
        }
    }

    // == Tiers ==
    /// Memory first, then the persistent store. Persistent hits are not
    /// promoted into memory.
    async fn lookup(&self, key: &str) -> Option<(CacheEntry, Tier)> {
        if let Some(entry) = self.inner.memory.read().await.get(key).cloned() {
            return Some((entry, Tier::Memory));
        }

        let store = self.inner.store.as_ref()?;
        match store.get(key).await {
            StoreOutcome::Hit(entry) => Some((entry, Tier::Persistent)),
            StoreOutcome::Miss => None,
            StoreOutcome::Unavailable(reason) => {
                warn!(key, %reason, "persistent store unavailable, treating as miss");
                self.with_stats(|s| s.record_storage_error()).await;
                None
            }
        }
    }

    async fn write(&self, entry: CacheEntry) {
        let evicted = self.inner.memory.write().await.insert(entry.clone());
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "memory ceiling exceeded, evicted oldest entries");
        }

        if let Some(store) = &self.inner.store {
            if let Err(err) = store.put(&entry).await {
                warn!(key = %entry.key, error = %err, "failed to persist entry");
                self.with_stats(|s| s.record_storage_error()).await;
            }
        }
    }

    // == Clear ==
    /// Removes every entry from both tiers.
    pub async fn clear(&self) {
        self.inner.memory.write().await.clear();

        if let Some(store) = &self.inner.store {
            if let Err(err) = store.clear().await {
                warn!(error = %err, "failed to clear persistent store");
                self.with_stats(|s| s.record_storage_error()).await;
            }
        }
        info!("cache cleared");
    }

    // == Invalidate ==
    /// Removes entries whose key matches `pattern` from both tiers.
    ///
    /// A string matches by substring, a `Regex` by search. Returns the number
    /// of in-memory entries removed.
    pub async fn invalidate(&self, pattern: impl Into<InvalidatePattern>) -> usize {
        let pattern = pattern.into();
        let removed = self
            .inner
            .memory
            .write()
            .await
            .remove_matching(|key| pattern.matches(key));

        if let Some(store) = &self.inner.store {
            match store.remove_matching(&pattern).await {
                Ok(count) => debug!(count, "invalidated persistent entries"),
                Err(err) => {
                    warn!(error = %err, "failed to invalidate persistent entries");
                    self.with_stats(|s| s.record_storage_error()).await;
                }
            }
        }

        info!(removed, pattern = ?pattern, "cache invalidated");
        removed
    }

    // == Warm Up ==
    /// Fetches every URL concurrently with the default config to prime the
    /// cache. Never fails; individual failures are logged.
    pub async fn warm_up<S: AsRef<str>>(&self, urls: &[S]) -> WarmUpReport {
        let results = join_all(
            urls.iter()
                .map(|url| async move { (url.as_ref(), self.fetch(url.as_ref(), FetchOptions::get()).await) }),
        )
        .await;

        let mut report = WarmUpReport::default();
        for (url, result) in results {
            match result {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    warn!(url, error = %err, "warm-up fetch failed");
                    report.failed += 1;
                }
            }
        }

        info!(succeeded = report.succeeded, failed = report.failed, "cache warm-up finished");
        report
    }

    // == Settle ==
    /// Waits for all outstanding background revalidations.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.background.lock().await);
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(error = %err, "background revalidation task aborted");
                }
            }
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        self.inner.memory.read().await.stats()
    }

    async fn with_stats<F: FnOnce(&mut CacheStats)>(&self, update: F) {
        update(self.inner.memory.write().await.stats_mut());
    }

    async fn record_hit(&self, tier: Tier) {
        self.with_stats(|s| match tier {
            Tier::Memory => s.record_memory_hit(),
            Tier::Persistent => s.record_persistent_hit(),
        })
        .await;
    }

    async fn record_miss(&self) {
        self.with_stats(|s| s.record_miss()).await;
    }
}
