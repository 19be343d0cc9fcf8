//! Rate cache manager: stale-while-revalidate over a rate fetcher.
//!
//! Per base currency the manager is in one of three states:
//!
//! - **Cached**: a record younger than the freshness threshold is held and is
//!   served as-is, no network call.
//! - **Revalidating**: a refresh is in flight. Whatever record is held keeps
//!   being served.
//! - **Error**: the last refresh exhausted its retries. A held record is still
//!   served, flagged stale; without one the view carries
//!   [`RateError::NoCacheAvailable`].
//!
//! At most one refresh runs per base. Callers asking for the same base while
//! it runs join the running attempt.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use travelrate_common::{constants, now_millis, Currency, Millis};

use crate::cache::{CacheStats, CachedRateSet, RateCache};
use crate::error::{RateError, RateResult};
use crate::provider::RateFetcher;

/// Configuration for the rate cache manager.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Records younger than this are served without a refresh.
    pub freshness: Duration,
    /// Records older than this are flagged stale but still served.
    pub soft_expiry: Duration,
    /// Additional attempts after a failed fetch.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt.
    pub retry_base_delay: StdDuration,
    /// Upper bound for the retry delay.
    pub retry_max_delay: StdDuration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            freshness: constants::freshness_threshold(),
            soft_expiry: constants::soft_expiry(),
            max_retries: 2,
            retry_base_delay: StdDuration::from_secs(1),
            retry_max_delay: StdDuration::from_secs(30),
        }
    }
}

impl RateCacheConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn retry_delay(&self, attempt: u32) -> StdDuration {
        self.retry_base_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.retry_max_delay)
    }
}

/// What a caller sees for one base currency.
#[derive(Debug, Clone)]
pub struct RatesView {
    /// Requested base.
    pub base: Currency,
    /// Best available table for `base`, if any.
    pub rates: Option<Arc<CachedRateSet>>,
    /// Provider update time of the served table.
    pub last_updated_at: Option<Millis>,
    /// Local fetch time of the served table.
    pub fetched_at: Option<Millis>,
    /// Nothing to show yet and a refresh is running.
    pub is_loading: bool,
    /// A refresh is running.
    pub is_revalidating: bool,
    /// The served data may be outdated, or there is none.
    pub is_stale: bool,
    /// Hard error: nothing can be shown.
    pub error: Option<RateError>,
}

impl RatesView {
    fn unselected() -> Self {
        Self {
            base: Currency::new(""),
            rates: None,
            last_updated_at: None,
            fetched_at: None,
            is_loading: false,
            is_revalidating: false,
            is_stale: false,
            error: None,
        }
    }

    /// Rate for a quote currency in the served table.
    pub fn rate_for(&self, quote: &Currency) -> Option<f64> {
        self.rates.as_ref().and_then(|r| r.rate(quote))
    }
}

type RefreshFuture = Shared<BoxFuture<'static, RateResult<Arc<CachedRateSet>>>>;

struct Inner {
    fetcher: Arc<dyn RateFetcher>,
    cache: RateCache,
    failures: DashMap<Currency, RateError>,
    in_flight: Mutex<HashMap<Currency, RefreshFuture>>,
    config: RateCacheConfig,
}

/// Serves cached rate tables and keeps them fresh in the background.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RateCacheManager {
    inner: Arc<Inner>,
}

impl RateCacheManager {
    /// Create a new manager over `fetcher` and `cache`.
    pub fn new(fetcher: Arc<dyn RateFetcher>, cache: RateCache, config: RateCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                cache,
                failures: DashMap::new(),
                in_flight: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Current view for `base`, starting a background refresh if the held
    /// record is missing or past the freshness threshold. Never waits on the
    /// network.
    pub fn get_rates(&self, base: &Currency) -> RatesView {
        if base.is_empty() {
            return RatesView::unselected();
        }

        let now = now_millis();
        let record = self.inner.cache.get(base);

        if self.needs_refresh(record.as_deref(), now) {
            let _refresh = self.start_refresh(base);
        }

        self.view(base, record, now)
    }

    /// Like [`get_rates`](Self::get_rates), but waits for a needed refresh to
    /// settle. Fails only when there is nothing to show.
    #[instrument(skip(self), fields(base = %base))]
    pub async fn load(&self, base: &Currency) -> RateResult<RatesView> {
        if base.is_empty() {
            return Err(RateError::MissingBaseCurrency);
        }

        let record = self.inner.cache.get(base);
        if !self.needs_refresh(record.as_deref(), now_millis()) {
            debug!("Serving fresh cached rates");
            return Ok(self.view(base, record, now_millis()));
        }

        self.settle(base).await
    }

    /// Force a refresh for `base` (joining one already running) and wait for it.
    #[instrument(skip(self), fields(base = %base))]
    pub async fn refresh(&self, base: &Currency) -> RateResult<RatesView> {
        if base.is_empty() {
            return Err(RateError::MissingBaseCurrency);
        }

        self.settle(base).await
    }

    /// Query handle bound to one base.
    pub fn query(&self, base: Currency) -> RatesQuery {
        RatesQuery {
            manager: self.clone(),
            base,
        }
    }

    /// Whether a refresh for `base` is running.
    pub fn is_refreshing(&self, base: &Currency) -> bool {
        self.inner.in_flight.lock().contains_key(base)
    }

    /// Get manager statistics.
    pub fn stats(&self) -> RateCacheStats {
        RateCacheStats {
            cache_stats: self
                .inner
                .cache
                .stats(now_millis(), self.inner.config.freshness),
            in_flight: self.inner.in_flight.lock().len(),
            failing_bases: self.inner.failures.len(),
        }
    }

    fn needs_refresh(&self, record: Option<&CachedRateSet>, now: Millis) -> bool {
        match record {
            Some(r) => !r.is_fresh(now, self.inner.config.freshness),
            None => true,
        }
    }

    async fn settle(&self, base: &Currency) -> RateResult<RatesView> {
        let outcome = self.start_refresh(base).await;
        let record = self.inner.cache.get(base);

        match (outcome, record) {
            (Ok(_), record) | (Err(_), record @ Some(_)) => {
                Ok(self.view(base, record, now_millis()))
            }
            (Err(e), None) => {
                warn!(base = %base, error = %e, "No cached rates to fall back on");
                Err(RateError::NoCacheAvailable(base.clone()))
            }
        }
    }

    /// Join the running refresh for `base` or start one. The refresh is driven
    /// by a spawned task, so it completes even if every caller stops waiting.
    fn start_refresh(&self, base: &Currency) -> RefreshFuture {
        let mut in_flight = self.inner.in_flight.lock();
        if let Some(running) = in_flight.get(base) {
            debug!(base = %base, "Joining in-flight refresh");
            return running.clone();
        }

        let inner = self.inner.clone();
        let key = base.clone();
        let refresh = async move {
            let outcome = inner.refresh_with_retry(&key).await;
            inner.in_flight.lock().remove(&key);
            outcome
        }
        .boxed()
        .shared();

        in_flight.insert(base.clone(), refresh.clone());
        drop(in_flight);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(refresh.clone().map(|_| ()));
            }
            Err(_) => warn!(base = %base, "No async runtime, refresh runs only when awaited"),
        }

        refresh
    }

    fn view(&self, base: &Currency, record: Option<Arc<CachedRateSet>>, now: Millis) -> RatesView {
        let failure = self.inner.failures.get(base).map(|e| e.clone());
        let revalidating = self.is_refreshing(base);

        match record {
            Some(record) => RatesView {
                base: base.clone(),
                last_updated_at: Some(record.provider_updated_at),
                fetched_at: Some(record.fetched_at),
                is_loading: false,
                is_revalidating: revalidating,
                is_stale: failure.is_some() || record.age(now) >= self.inner.config.soft_expiry,
                error: None,
                rates: Some(record),
            },
            None => RatesView {
                base: base.clone(),
                rates: None,
                last_updated_at: None,
                fetched_at: None,
                is_loading: revalidating,
                is_revalidating: revalidating,
                is_stale: true,
                error: failure.map(|_| RateError::NoCacheAvailable(base.clone())),
            },
        }
    }
}

impl Inner {
    async fn refresh_with_retry(&self, base: &Currency) -> RateResult<Arc<CachedRateSet>> {
        let mut attempt = 0;

        let error = loop {
            let outcome = self
                .fetcher
                .fetch(base)
                .await
                .and_then(|record| self.accept(base, record));

            match outcome {
                Ok(record) => return Ok(record),
                Err(e) => {
                    warn!(
                        fetcher = self.fetcher.name(),
                        base = %base,
                        attempt,
                        error = %e,
                        "Rate fetch failed"
                    );

                    if !e.is_retryable() || attempt >= self.config.max_retries {
                        break e;
                    }

                    tokio::time::sleep(self.config.retry_delay(attempt)).await;
                    attempt += 1;
                }
            }
        };

        self.failures.insert(base.clone(), error.clone());
        Err(error)
    }

    /// Persist and adopt a fetched record. A record for another base than
    /// the requested one is kept under its own base but counts as a failed
    /// attempt for `base`.
    fn accept(&self, base: &Currency, record: CachedRateSet) -> RateResult<Arc<CachedRateSet>> {
        if let Err(e) = self.cache.persist(&record) {
            warn!(base = %record.base, error = %e, "Failed to persist rates");
        }

        let record = Arc::new(record);
        let adopted = self.cache.adopt(record.clone());

        info!(
            base = %record.base,
            rates = record.rates.len(),
            adopted,
            "Rates refreshed"
        );

        if record.base != *base {
            return Err(RateError::Parse(format!(
                "provider returned {} rates",
                record.base
            )));
        }

        self.failures.remove(base);
        Ok(record)
    }
}

/// Rates for one base, plus a way to refresh them.
#[derive(Clone)]
pub struct RatesQuery {
    manager: RateCacheManager,
    base: Currency,
}

impl RatesQuery {
    /// Base currency of this query.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// Current view, revalidating in the background when needed.
    pub fn current(&self) -> RatesView {
        self.manager.get_rates(&self.base)
    }

    /// Force a refresh and wait for it.
    pub async fn refresh(&self) -> RateResult<RatesView> {
        self.manager.refresh(&self.base).await
    }
}

/// Manager statistics.
#[derive(Debug, Clone)]
pub struct RateCacheStats {
    pub cache_stats: CacheStats,
    pub in_flight: usize,
    pub failing_bases: usize,
}
