//! Default shared manager.
//!
//! Opt-in convenience for call sites that want one process-wide cache.
//! Everything cached through it is shared state, so callers must choose
//! distinct keys or invalidate explicitly when they need isolation.

use std::sync::OnceLock;

use crate::config::Config;
use crate::error::Result;
use crate::manager::CacheManager;

static API_CACHE: OnceLock<CacheManager> = OnceLock::new();

/// Returns the process-wide manager, building it from the environment on
/// first use (stale-while-revalidate, 300 s TTL, 60 s stale time unless
/// overridden).
pub fn api_cache() -> Result<&'static CacheManager> {
    if let Some(manager) = API_CACHE.get() {
        return Ok(manager);
    }

    let config = Config::from_env()?;
    config.validate()?;
    let manager = CacheManager::from_config(&config)?;
    Ok(API_CACHE.get_or_init(|| manager))
}
