//! Error types for the fetch cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the fetch cache.
///
/// Only `UnknownStrategy`, `Network` and `Decode` ever reach a caller of
/// [`CacheManager::fetch`](crate::CacheManager::fetch). `Storage` is absorbed
/// by the persistent tier and logged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Strategy name is not one of the four recognized values
    #[error("Unknown cache strategy: {0}")]
    UnknownStrategy(String),

    /// Underlying transport rejected or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// A cacheable response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Persistent store open/read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CacheError::Network(format!("request timed out: {}", err))
        } else {
            CacheError::Network(err.to_string())
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fetch cache.
pub type Result<T> = std::result::Result<T, CacheError>;
