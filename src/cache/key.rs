//! Cache Key Module
//!
//! Derives the key a request is cached under.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::strategy::FetchOptions;

/// Caller-supplied key derivation, overriding [`default_key`].
pub type CacheKeyFn = Arc<dyn Fn(&str, &FetchOptions) -> String + Send + Sync>;

/// Stable serialization of `{method, url, body}`.
///
/// Object keys are emitted in sorted order at every depth, so two requests
/// with equal method, URL and body always produce the same key, and
/// distinct bodies never collide. Headers are not part of the key.
pub fn default_key(url: &str, options: &FetchOptions) -> String {
    let descriptor = json!({
        "method": options.method.to_ascii_uppercase(),
        "url": url,
        "body": options.body.clone().unwrap_or(Value::Null),
    });
    descriptor.to_string()
}

/// Resolves the key for a request, preferring the config's custom function.
pub fn resolve_key(url: &str, options: &FetchOptions, custom: Option<&CacheKeyFn>) -> String {
    match custom {
        Some(key_fn) => key_fn(url, options),
        None => default_key(url, options),
    }
}
