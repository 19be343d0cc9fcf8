//! End-to-end cache behaviour across managers sharing one persistent store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use travelrate_common::{now_millis, Currency};
use travelrate_fx::provider::MockRateFetcher;
use travelrate_fx::{
    CachedRateSet, JsonFileStore, RateCache, RateCacheConfig, RateCacheManager,
    RateError, SharedStore,
};

fn config() -> RateCacheConfig {
    RateCacheConfig {
        retry_base_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn manager(fetcher: Arc<MockRateFetcher>, store: SharedStore) -> RateCacheManager {
    RateCacheManager::new(fetcher, RateCache::with_store(store), config())
}

fn open_store(dir: &tempfile::TempDir) -> SharedStore {
    Arc::new(JsonFileStore::open(dir.path().join("store.json")).unwrap())
}

#[tokio::test]
async fn test_restart_serves_persisted_rates_without_fetching() {
    let dir = tempfile::tempdir().unwrap();

    let online = Arc::new(MockRateFetcher::new("online"));
    online.set_rates(Currency::usd(), &[("EUR", 0.92)]);
    manager(online, open_store(&dir))
        .load(&Currency::usd())
        .await
        .unwrap();

    let offline = Arc::new(MockRateFetcher::new("offline"));
    let restarted = manager(offline.clone(), open_store(&dir));

    let view = restarted.get_rates(&Currency::usd());
    assert_eq!(view.rate_for(&Currency::eur()), Some(0.92));
    assert!(!view.is_stale);
    assert_eq!(offline.calls(&Currency::usd()), 0);
}

#[tokio::test]
async fn test_old_persisted_rates_survive_failed_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let two_days_ago = now_millis() - 48 * 3_600_000;

    RateCache::with_store(store.clone())
        .persist(&CachedRateSet {
            base: Currency::usd(),
            rates: HashMap::from([(Currency::eur(), 0.88)]),
            fetched_at: two_days_ago,
            provider_updated_at: two_days_ago,
            date: Some("2024-04-29".to_string()),
        })
        .unwrap();

    let fetcher = Arc::new(MockRateFetcher::new("down"));
    fetcher.fail_next(Currency::usd(), 3, RateError::Fetch("HTTP 502".into()));

    let view = manager(fetcher.clone(), store.clone())
        .load(&Currency::usd())
        .await
        .unwrap();

    assert!(view.is_stale);
    assert_eq!(view.rate_for(&Currency::eur()), Some(0.88));
    assert_eq!(fetcher.calls(&Currency::usd()), 3);
    assert!(store.get_string("cached-rates/USD").is_some());
}

#[tokio::test]
async fn test_switching_base_keeps_rates_apart() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(MockRateFetcher::new("test"));
    fetcher.set_rates(Currency::usd(), &[("EUR", 0.92)]);
    fetcher.set_rates(Currency::eur(), &[("USD", 1.087)]);
    fetcher.set_delay(Duration::from_millis(20));

    let manager = manager(fetcher, open_store(&dir));
    manager.load(&Currency::usd()).await.unwrap();

    let eur = manager.get_rates(&Currency::eur());
    assert!(eur.rates.is_none());
    assert!(eur.is_stale);

    let usd = manager.get_rates(&Currency::usd());
    assert!(!usd.is_stale);

    let eur = manager.load(&Currency::eur()).await.unwrap();
    assert_eq!(eur.rates.unwrap().base, Currency::eur());
    assert_eq!(manager.get_rates(&Currency::usd()).rate_for(&Currency::eur()), Some(0.92));
}

#[tokio::test]
async fn test_slow_earlier_fetch_does_not_overwrite_newer() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let slow = Arc::new(MockRateFetcher::new("slow"));
    slow.set_rates(Currency::usd(), &[("EUR", 0.80)]);
    slow.set_delay(Duration::from_millis(100));

    let fast = Arc::new(MockRateFetcher::new("fast"));
    fast.set_rates(Currency::usd(), &[("EUR", 0.95)]);

    let slow_manager = manager(slow, store.clone());
    let fast_manager = manager(fast, store.clone());

    let slow_load = {
        let m = slow_manager.clone();
        tokio::spawn(async move { m.load(&Currency::usd()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    fast_manager.load(&Currency::usd()).await.unwrap();
    slow_load.await.unwrap().unwrap();

    let reader = manager(Arc::new(MockRateFetcher::new("idle")), store);
    assert_eq!(reader.get_rates(&Currency::usd()).rate_for(&Currency::eur()), Some(0.95));
}
