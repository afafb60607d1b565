//! # Offering Cache
//!
//! A staleness-bounded memoization layer, not a bounded cache: no capacity
//! limit, no LRU, no per-key expiry. The whole store is considered stale at
//! once. Eviction is a lazy sweep: the first `get` past the TTL deadline
//! clears every entry and reports a miss unconditionally, even for keys that
//! would otherwise have been present. There is no background timer.
//!
//! Concurrency: `DashMap` gives safe concurrent reads and writes from any
//! number of in-flight requests without external locking. The expiry-check
//! then clear sequence is not atomic with respect to concurrent `put`s; a
//! clear racing an insertion is accepted, and entries live at most roughly
//! TTL plus one request.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::model::Offering;

/// A fully-materialized, shareable result array
pub type CachedOfferings = Arc<[Offering]>;

/// Whole-store TTL cache of precomputed offering arrays keyed by canonical
/// filter key
pub struct OfferingCache {
    entries: DashMap<String, CachedOfferings>,

    /// Milliseconds since the Unix epoch of the first insertion into the
    /// currently-live store; 0 means unset (empty or just cleared)
    oldest_ms: AtomicU64,

    ttl: Duration,
}

impl OfferingCache {
    /// Create a cache whose whole store expires `ttl` after its first
    /// insertion
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            oldest_ms: AtomicU64::new(0),
            ttl,
        }
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Look up a key, sweeping the whole store first if it has gone stale
    ///
    /// An unset `oldest` counts as expired, so every `get` against an empty
    /// store takes the (no-op) sweep path and misses.
    pub fn get(&self, key: &str) -> Option<CachedOfferings> {
        let oldest = self.oldest_ms.load(Ordering::Relaxed);
        let deadline = oldest.saturating_add(self.ttl.as_millis() as u64);

        if Self::now_ms() > deadline {
            let swept = self.entries.len();
            self.entries.clear();
            self.oldest_ms.store(0, Ordering::Relaxed);
            if swept > 0 {
                debug!(swept, "offering cache expired, cleared whole store");
            }
            return None;
        }

        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Upsert a fully-materialized result array, returning the value the key
    /// previously held
    ///
    /// The first insertion into an empty store pins `oldest` to now, starting
    /// the TTL window for everything inserted after it.
    pub fn put(&self, key: impl Into<String>, offerings: CachedOfferings) -> Option<CachedOfferings> {
        let _ = self.oldest_ms.compare_exchange(
            0,
            Self::now_ms(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        self.entries.insert(key.into(), offerings)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured whole-store TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn offerings(instance_type: &str) -> CachedOfferings {
        Arc::from(vec![Offering {
            instance_type: Some(instance_type.to_string()),
            ..Default::default()
        }])
    }

    #[test]
    fn test_put_then_get_hits() {
        let cache = OfferingCache::new(Duration::from_secs(60));
        cache.put("key", offerings("t1.micro"));

        let hit = cache.get("key").expect("expected a hit");
        assert_eq!(hit[0].instance_type.as_deref(), Some("t1.micro"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cold_store_always_misses() {
        let cache = OfferingCache::new(Duration::from_secs(60));
        // oldest is unset, so the sweep path runs and reports a miss
        assert!(cache.get("anything").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_returns_previous_value() {
        let cache = OfferingCache::new(Duration::from_secs(60));
        assert!(cache.put("key", offerings("t1.micro")).is_none());

        let previous = cache.put("key", offerings("m1.small")).expect("expected previous");
        assert_eq!(previous[0].instance_type.as_deref(), Some("t1.micro"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let cache = OfferingCache::new(Duration::from_millis(200));
        cache.put("key", offerings("t1.micro"));

        // Well before the deadline: hit
        sleep(Duration::from_millis(50)).await;
        assert!(cache.get("key").is_some());

        // Past the deadline: miss
        sleep(Duration::from_millis(250)).await;
        assert!(cache.get("key").is_none());
    }

    #[tokio::test]
    async fn test_expiry_evicts_whole_store() {
        let cache = OfferingCache::new(Duration::from_millis(100));
        cache.put("first", offerings("t1.micro"));
        cache.put("second", offerings("m1.small"));

        sleep(Duration::from_millis(150)).await;

        // A get for one key past the deadline sweeps every key
        assert!(cache.get("first").is_none());
        assert!(cache.is_empty());
        assert!(cache.get("second").is_none());
    }

    #[tokio::test]
    async fn test_first_put_after_sweep_restarts_window() {
        let cache = OfferingCache::new(Duration::from_millis(150));
        cache.put("old", offerings("t1.micro"));

        sleep(Duration::from_millis(200)).await;
        assert!(cache.get("old").is_none());

        // The store transitioned back to empty, so this insertion pins a
        // fresh age reference rather than inheriting the stale one.
        cache.put("new", offerings("m1.small"));
        sleep(Duration::from_millis(50)).await;
        assert!(cache.get("new").is_some());
    }
}
