//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check memory accounting, eviction order and key derivation.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use crate::cache::{default_key, serialized_len, CacheEntry, MemoryTier};
use crate::strategy::FetchOptions;

// == Test Configuration ==
const TEST_TTL_SECS: i64 = 300;

// == Strategies ==
/// Generates cache keys shaped like request paths
fn key_strategy() -> impl Strategy<Value = String> {
    "/api/[a-z]{1,8}/[0-9]{1,4}".prop_map(|s| s)
}

/// Generates small JSON payloads
fn payload_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,128}".prop_map(Value::String),
        any::<i64>().prop_map(|n| json!(n)),
        ("[a-z]{1,8}", "[a-z0-9]{0,32}").prop_map(|(k, v)| json!({ k: v })),
    ]
}

fn entry(key: &str, data: Value) -> CacheEntry {
    CacheEntry::new(key, data, Duration::seconds(TEST_TTL_SECS), None)
}

/// Sum of estimated sizes for the entries still present
fn recount(tier: &MemoryTier, keys: &HashSet<String>) -> usize {
    keys.iter()
        .filter_map(|k| tier.get(k))
        .map(|e| serialized_len(&e.data))
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // After every write the tracked total stays within the ceiling and
    // equals the sum of the surviving entries' estimates.
    #[test]
    fn prop_memory_budget_enforced(
        writes in prop::collection::vec((key_strategy(), payload_strategy()), 1..100),
        max_bytes in 16usize..512
    ) {
        let mut tier = MemoryTier::new(max_bytes);
        let mut seen = HashSet::new();

        for (key, data) in writes {
            seen.insert(key.clone());
            tier.insert(entry(&key, data));

            prop_assert!(
                tier.total_bytes() <= max_bytes,
                "Tracked bytes {} exceed ceiling {}",
                tier.total_bytes(),
                max_bytes
            );
            prop_assert_eq!(tier.total_bytes(), recount(&tier, &seen), "Byte accounting drifted");
        }
    }

    // With a uniform size estimate, crossing the ceiling always drops the
    // oldest-inserted key.
    #[test]
    fn prop_eviction_drops_oldest(
        keys in prop::collection::vec(key_strategy(), 2..20),
        new_key in key_strategy()
    ) {
        let unique: Vec<String> = keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(unique.len() >= 2);
        prop_assume!(!unique.contains(&new_key));

        let mut tier = MemoryTier::with_estimator(unique.len() * 10, Arc::new(|_| 10));
        for key in &unique {
            tier.insert(entry(key, json!(key)));
        }
        prop_assert_eq!(tier.len(), unique.len());

        let evicted = tier.insert(entry(&new_key, json!(1)));

        prop_assert_eq!(evicted, vec![unique[0].clone()]);
        prop_assert!(!tier.contains(&unique[0]));
        prop_assert!(tier.contains(&new_key));
        prop_assert_eq!(tier.len(), unique.len());
    }

    // Overwriting a key leaves one entry holding the latest payload.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in payload_strategy(),
        second in payload_strategy()
    ) {
        let mut tier = MemoryTier::new(1024 * 1024);
        tier.insert(entry(&key, first));
        tier.insert(entry(&key, second.clone()));

        prop_assert_eq!(tier.len(), 1);
        prop_assert_eq!(&tier.get(&key).unwrap().data, &second);
        prop_assert_eq!(tier.total_bytes(), serialized_len(&second));
    }

    // Default keys are equal exactly when method, url and body are equal.
    #[test]
    fn prop_default_key_distinguishes_bodies(
        url in key_strategy(),
        a in payload_strategy(),
        b in payload_strategy()
    ) {
        let key_a = default_key(&url, &FetchOptions::post(a.clone()));
        let key_b = default_key(&url, &FetchOptions::post(b.clone()));

        prop_assert_eq!(key_a == key_b, a == b);
    }
}
