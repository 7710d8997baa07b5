//! Cache Entry Module
//!
//! Defines the record stored for each cached response, in both tiers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A cached response body with its expiration metadata.
///
/// Entries are replaced wholesale on rewrite and never mutated in place.
/// The persisted shape is `{ key, data, timestamp, expiresAt, etag }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Cache key this entry is stored under
    pub key: String,
    /// Parsed response body
    pub data: Value,
    /// When the response was stored
    #[serde(rename = "timestamp")]
    pub stored_at: DateTime<Utc>,
    /// When the entry stops being valid
    #[serde(alias = "expires_at")]
    pub expires_at: DateTime<Utc>,
    /// ETag returned with the response, if any
    #[serde(default)]
    pub etag: Option<String>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stored now that lives for `lifetime`.
    pub fn new(key: impl Into<String>, data: Value, lifetime: Duration, etag: Option<String>) -> Self {
        let stored_at = Utc::now();
        Self {
            key: key.into(),
            data,
            stored_at,
            expires_at: stored_at + lifetime,
            etag,
        }
    }

    // == Is Valid ==
    /// An entry is valid while `now < expires_at`.
    ///
    /// A zero lifetime therefore expires immediately.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Validity check against an explicit instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    // == Age ==
    /// Time elapsed since the entry was stored.
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }

    // == Is Stale ==
    /// Returns true once the entry is older than `stale_time`.
    ///
    /// A zero `stale_time` marks every entry as stale.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        stale_time <= Duration::zero() || self.age() > stale_time
    }

    /// Returns remaining lifetime, or zero if already expired.
    pub fn ttl_remaining(&self) -> Duration {
        let remaining = self.expires_at - Utc::now();
        remaining.max(Duration::zero())
    }
}
