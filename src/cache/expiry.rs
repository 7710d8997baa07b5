//! Expiry Policy Module
//!
//! Derives entry lifetimes from the caller's TTL and response headers.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::Duration;

/// Upper bound on any entry lifetime, keeps timestamp arithmetic in range.
const MAX_LIFETIME_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Parses the `max-age` directive out of a `Cache-Control` header value.
pub fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|part| {
            let (name, value) = part.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("max-age") {
                value.trim().trim_matches('"').parse::<u64>().ok()
            } else {
                None
            }
        })
}

/// Computes how long a freshly stored response stays valid.
///
/// With a `Cache-Control` header carrying `max-age`, the lifetime is the
/// larger of `ttl` and `max-age`; otherwise it is `ttl`.
pub fn entry_lifetime(ttl: StdDuration, headers: &HashMap<String, String>) -> Duration {
    let ttl_secs = ttl.as_secs();
    let secs = headers
        .get("cache-control")
        .and_then(|cc| parse_max_age(cc))
        .map(|max_age| max_age.max(ttl_secs))
        .unwrap_or(ttl_secs);

    Duration::seconds(secs.min(MAX_LIFETIME_SECS) as i64)
}

/// Returns the response ETag, if present and non-empty.
pub fn etag(headers: &HashMap<String, String>) -> Option<String> {
    headers
        .get("etag")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("max-age=3600"), Some(3600));
        assert_eq!(parse_max_age("public, max-age=7200"), Some(7200));
        assert_eq!(parse_max_age("private, MAX-AGE = 60 , must-revalidate"), Some(60));
        assert_eq!(parse_max_age("no-cache"), None);
        assert_eq!(parse_max_age("max-age=soon"), None);
        assert_eq!(parse_max_age("s-maxage=10"), None);
    }

    #[test]
    fn test_lifetime_without_cache_control() {
        let lifetime = entry_lifetime(StdDuration::from_secs(300), &HashMap::new());
        assert_eq!(lifetime, Duration::seconds(300));
    }

    #[test]
    fn test_lifetime_takes_larger_of_ttl_and_max_age() {
        let h = headers(&[("cache-control", "max-age=3600")]);
        assert_eq!(entry_lifetime(StdDuration::from_secs(60), &h), Duration::seconds(3600));

        let h = headers(&[("cache-control", "max-age=10")]);
        assert_eq!(entry_lifetime(StdDuration::from_secs(60), &h), Duration::seconds(60));
    }

    #[test]
    fn test_zero_ttl() {
        let lifetime = entry_lifetime(StdDuration::ZERO, &HashMap::new());
        assert_eq!(lifetime, Duration::zero());
    }

    #[test]
    fn test_etag() {
        assert_eq!(etag(&headers(&[("etag", "\"abc\"")])), Some("\"abc\"".to_string()));
        assert_eq!(etag(&headers(&[("etag", "  ")])), None);
        assert_eq!(etag(&HashMap::new()), None);
    }
}
