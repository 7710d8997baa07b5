//! Fetch Cache - cache warm-up runner
//!
//! Builds a cache manager from the environment, prefetches the configured
//! URLs and reports cache statistics.

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetch_cache::{CacheManager, Config};

/// Entry point for the warm-up runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager (reqwest transport, optional file store)
/// 4. Warm the cache with `CACHE_WARMUP_URLS`
/// 5. Wait for background revalidations and log statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fetch cache warm-up");

    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: strategy={}, ttl={}s, stale_time={}s, max_memory_bytes={}, persist={}",
        config.strategy, config.default_ttl, config.stale_time, config.max_memory_bytes, config.persist
    );

    if config.warmup_urls.is_empty() {
        bail!("CACHE_WARMUP_URLS is empty, nothing to warm up");
    }

    let manager = CacheManager::from_config(&config).context("failed to build cache manager")?;

    let report = manager.warm_up(&config.warmup_urls).await;
    manager.settle().await;

    if report.failed > 0 {
        warn!("{} of {} URLs failed to prefetch", report.failed, config.warmup_urls.len());
    }

    let stats = manager.stats().await;
    info!(
        "Cache stats: entries={}, memory_bytes={}, network_requests={}, hit_rate={:.2}, storage_errors={}",
        stats.total_entries,
        stats.memory_bytes,
        stats.network_requests,
        stats.hit_rate(),
        stats.storage_errors
    );

    Ok(())
}
