//! Invalidation patterns.

use regex::Regex;

/// Selects cache keys for [`CacheManager::invalidate`](crate::CacheManager::invalidate).
#[derive(Debug, Clone)]
pub enum InvalidatePattern {
    /// Matches keys containing the string
    Substring(String),
    /// Matches keys the expression finds a match in
    Regex(Regex),
}

impl InvalidatePattern {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            InvalidatePattern::Substring(needle) => key.contains(needle.as_str()),
            InvalidatePattern::Regex(re) => re.is_match(key),
        }
    }
}

impl From<&str> for InvalidatePattern {
    fn from(s: &str) -> Self {
        InvalidatePattern::Substring(s.to_string())
    }
}

impl From<String> for InvalidatePattern {
    fn from(s: String) -> Self {
        InvalidatePattern::Substring(s)
    }
}

impl From<Regex> for InvalidatePattern {
    fn from(re: Regex) -> Self {
        InvalidatePattern::Regex(re)
    }
}
