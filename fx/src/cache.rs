//! Cached rate tables, held in memory and written through to a persistent store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use travelrate_common::{age, Currency, Millis};

use crate::error::StoreError;
use crate::store::{keys, SharedStore};

/// A provider rate table for one base currency.
///
/// `rates` are units of quote currency per one unit of `base`. `base` and
/// `rates` always come from the same provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRateSet {
    /// Currency the table is expressed against.
    pub base: Currency,
    /// Quote currency -> rate.
    pub rates: HashMap<Currency, f64>,
    /// Local clock (ms) when the request producing this table was issued.
    pub fetched_at: Millis,
    /// Provider's own update timestamp (ms).
    pub provider_updated_at: Millis,
    /// Provider's date string, if it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl CachedRateSet {
    /// Rate for a quote currency.
    pub fn rate(&self, quote: &Currency) -> Option<f64> {
        self.rates.get(quote).copied()
    }

    /// Age of this table at `now`.
    pub fn age(&self, now: Millis) -> Duration {
        age(self.fetched_at, now)
    }

    /// Whether this table is younger than `threshold` at `now`.
    pub fn is_fresh(&self, now: Millis, threshold: Duration) -> bool {
        self.age(now) < threshold
    }

    /// Whether this table may replace `other`.
    pub fn supersedes(&self, other: &CachedRateSet) -> bool {
        self.fetched_at >= other.fetched_at
    }
}

/// Per-base rate cache.
///
/// Memory is the primary copy; the store is consulted when a base is first
/// requested after a restart.
pub struct RateCache {
    records: DashMap<Currency, Arc<CachedRateSet>>,
    store: Option<SharedStore>,
}

impl RateCache {
    /// Create a memory-only cache.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            store: None,
        }
    }

    /// Create a cache backed by a persistent store.
    pub fn with_store(store: SharedStore) -> Self {
        Self {
            records: DashMap::new(),
            store: Some(store),
        }
    }

    /// Get the record for `base`, hydrating from the store on a memory miss.
    pub fn get(&self, base: &Currency) -> Option<Arc<CachedRateSet>> {
        if let Some(entry) = self.records.get(base) {
            debug!(base = %base, "Cache hit");
            return Some(entry.clone());
        }

        let record = self.load_persisted(base)?;
        debug!(base = %base, fetched_at = record.fetched_at, "Hydrated from store");

        let record = Arc::new(record);
        // Another caller may have adopted a newer fetch meanwhile.
        let entry = self
            .records
            .entry(base.clone())
            .or_insert_with(|| record.clone());
        Some(entry.clone())
    }

    /// Adopt a freshly fetched record. Returns `false` if the held record for
    /// the same base is newer, in which case nothing changes.
    pub fn adopt(&self, record: Arc<CachedRateSet>) -> bool {
        // Make sure a persisted record takes part in the comparison.
        let _ = self.get(&record.base);

        let mut adopted = true;
        self.records
            .entry(record.base.clone())
            .and_modify(|held| {
                if record.supersedes(held) {
                    *held = record.clone();
                } else {
                    adopted = false;
                }
            })
            .or_insert_with(|| record.clone());

        if !adopted {
            debug!(base = %record.base, fetched_at = record.fetched_at, "Discarded older fetch");
        }
        adopted
    }

    /// Write a record through to the persistent store, unless the store already
    /// holds a newer one for that base.
    pub fn persist(&self, record: &CachedRateSet) -> Result<(), StoreError> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        if let Some(existing) = self.load_persisted(&record.base) {
            if !record.supersedes(&existing) {
                debug!(base = %record.base, "Persisted record is newer, skipping write");
                return Ok(());
            }
        }

        let raw = serde_json::to_string(record)?;
        store.set_string(&Self::store_key(&record.base), &raw)
    }

    /// Number of bases held in memory.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self, now: Millis, freshness: Duration) -> CacheStats {
        let total = self.records.len();
        let fresh = self
            .records
            .iter()
            .filter(|e| e.is_fresh(now, freshness))
            .count();

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            stale_entries: total - fresh,
        }
    }

    fn load_persisted(&self, base: &Currency) -> Option<CachedRateSet> {
        let store = self.store.as_ref()?;
        let raw = store.get_string(&Self::store_key(base))?;

        match serde_json::from_str::<CachedRateSet>(&raw) {
            Ok(record) if record.base == *base => Some(record),
            Ok(record) => {
                warn!(base = %base, stored_base = %record.base, "Ignoring persisted record with mismatched base");
                None
            }
            Err(e) => {
                warn!(base = %base, error = %e, "Ignoring unreadable persisted record");
                None
            }
        }
    }

    fn store_key(base: &Currency) -> String {
        format!("{}{}", keys::CACHED_RATES_PREFIX, base.code())
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};
    use travelrate_common::now_millis;

    fn make_record(base: &str, eur: f64, fetched_at: Millis) -> CachedRateSet {
        CachedRateSet {
            base: Currency::new(base),
            rates: HashMap::from([(Currency::eur(), eur), (Currency::gbp(), 0.79)]),
            fetched_at,
            provider_updated_at: fetched_at,
            date: None,
        }
    }

    #[test]
    fn test_cache_adopt_and_get() {
        let cache = RateCache::new();
        let record = make_record("USD", 0.92, now_millis());

        assert!(cache.adopt(Arc::new(record.clone())));

        let cached = cache.get(&Currency::usd()).unwrap();
        assert_eq!(*cached, record);
        assert!(cache.get(&Currency::eur()).is_none());
    }

    #[test]
    fn test_older_fetch_does_not_overwrite() {
        let cache = RateCache::new();
        let now = now_millis();

        assert!(cache.adopt(Arc::new(make_record("USD", 0.93, now))));
        assert!(!cache.adopt(Arc::new(make_record("USD", 0.90, now - 1_000))));

        assert_eq!(cache.get(&Currency::usd()).unwrap().rate(&Currency::eur()), Some(0.93));
    }

    #[test]
    fn test_bases_are_independent() {
        let cache = RateCache::new();
        let now = now_millis();

        cache.adopt(Arc::new(make_record("USD", 0.92, now)));
        cache.adopt(Arc::new(make_record("GBP", 1.16, now)));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&Currency::usd()).unwrap().rate(&Currency::eur()), Some(0.92));
    }

    #[test]
    fn test_persist_and_hydrate() {
        let store = Arc::new(MemoryStore::new());
        let record = make_record("USD", 0.92, now_millis());

        RateCache::with_store(store.clone()).persist(&record).unwrap();
        assert!(store.get_string("cached-rates/USD").is_some());

        let restarted = RateCache::with_store(store);
        assert_eq!(*restarted.get(&Currency::usd()).unwrap(), record);
    }

    #[test]
    fn test_persist_skips_older_record() {
        let store = Arc::new(MemoryStore::new());
        let cache = RateCache::with_store(store.clone());
        let now = now_millis();

        cache.persist(&make_record("USD", 0.93, now)).unwrap();
        cache.persist(&make_record("USD", 0.90, now - 5_000)).unwrap();

        let restarted = RateCache::with_store(store);
        assert_eq!(restarted.get(&Currency::usd()).unwrap().rate(&Currency::eur()), Some(0.93));
    }

    #[test]
    fn test_corrupt_persisted_record_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set_string("cached-rates/USD", "{broken").unwrap();

        let cache = RateCache::with_store(store);
        assert!(cache.get(&Currency::usd()).is_none());
    }

    #[test]
    fn test_stats() {
        let cache = RateCache::new();
        let now = now_millis();
        let freshness = Duration::minutes(5);

        cache.adopt(Arc::new(make_record("USD", 0.92, now)));
        cache.adopt(Arc::new(make_record("GBP", 1.16, now - 10 * 60 * 1000)));

        let stats = cache.stats(now, freshness);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.stale_entries, 1);
    }
}
