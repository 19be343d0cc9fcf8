//! Rate fetchers: the network side of the rate cache.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use travelrate_common::{now_millis, secs_to_millis, Currency, Millis};

use crate::cache::CachedRateSet;
use crate::error::{RateError, RateResult};

/// Trait for exchange-rate sources.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Get the fetcher name.
    fn name(&self) -> &str;

    /// Fetch the full rate table for `base`.
    async fn fetch(&self, base: &Currency) -> RateResult<CachedRateSet>;
}

/// Configuration for the HTTP rate provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Endpoint prefix; the base code is appended as the last path segment.
    pub base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.exchangerate-api.com/v4/latest".to_string(),
            user_agent: concat!("travelrate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Provider response body.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: String,
    #[serde(default)]
    date: Option<String>,
    time_last_updated: i64,
    rates: HashMap<String, f64>,
}

/// Map a provider body to a cache record.
///
/// The provider's `base` is authoritative for the record. Entries that are not
/// positive finite numbers are dropped; a table with nothing left is malformed.
pub fn parse_response(
    requested: &Currency,
    body: &str,
    fetched_at: Millis,
) -> RateResult<CachedRateSet> {
    let response: RatesResponse =
        serde_json::from_str(body).map_err(|e| RateError::Parse(e.to_string()))?;

    let base = Currency::new(&response.base);
    if base.is_empty() {
        return Err(RateError::Parse("missing base currency".to_string()));
    }
    if base != *requested {
        warn!(requested = %requested, reported = %base, "Provider reported a different base");
    }

    let mut rates = HashMap::with_capacity(response.rates.len());
    for (code, rate) in response.rates {
        if rate.is_finite() && rate > 0.0 {
            rates.insert(Currency::new(code), rate);
        } else {
            warn!(base = %base, code = %code, rate, "Dropping invalid rate");
        }
    }

    if rates.is_empty() {
        return Err(RateError::Parse("empty rate table".to_string()));
    }

    Ok(CachedRateSet {
        base,
        rates,
        fetched_at,
        provider_updated_at: secs_to_millis(response.time_last_updated),
        date: response.date,
    })
}

/// Fetches rate tables over HTTP.
pub struct HttpRateFetcher {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpRateFetcher {
    /// Create a new HTTP fetcher.
    pub fn new(config: ProviderConfig) -> RateResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RateError::Fetch(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url_for(&self, base: &Currency) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), base.code())
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip(self), fields(base = %base))]
    async fn fetch(&self, base: &Currency) -> RateResult<CachedRateSet> {
        let fetched_at = now_millis();
        let url = self.url_for(base);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RateError::Fetch(format!("HTTP {}", status)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RateError::Fetch(e.to_string()))?;

        let record = parse_response(base, &body, fetched_at)?;
        debug!(rates = record.rates.len(), "Fetched rate table");
        Ok(record)
    }
}

/// Mock rate fetcher for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateFetcher {
    name: String,
    tables: dashmap::DashMap<Currency, HashMap<Currency, f64>>,
    failures: dashmap::DashMap<Currency, std::collections::VecDeque<RateError>>,
    calls: dashmap::DashMap<Currency, usize>,
    delay: parking_lot::Mutex<Option<std::time::Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateFetcher {
    /// Create a new mock fetcher.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            failures: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
            delay: parking_lot::Mutex::new(None),
        }
    }

    /// Serve `rates` for `base` on every successful fetch.
    pub fn set_rates(&self, base: Currency, rates: &[(&str, f64)]) {
        let table = rates
            .iter()
            .map(|(code, rate)| (Currency::new(code), *rate))
            .collect();
        self.tables.insert(base, table);
    }

    /// Fail the next `times` fetches for `base` with `error`.
    pub fn fail_next(&self, base: Currency, times: usize, error: RateError) {
        let mut queue = self.failures.entry(base).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
    }

    /// Delay every fetch by `delay`.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of fetches issued for `base`.
    pub fn calls(&self, base: &Currency) -> usize {
        self.calls.get(base).map(|c| *c).unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateFetcher for MockRateFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, base: &Currency) -> RateResult<CachedRateSet> {
        let fetched_at = now_millis();
        *self.calls.entry(base.clone()).or_insert(0) += 1;

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self
            .failures
            .get_mut(base)
            .and_then(|mut queue| queue.pop_front())
        {
            return Err(error);
        }

        let rates = self
            .tables
            .get(base)
            .map(|t| t.clone())
            .ok_or_else(|| RateError::Fetch("HTTP 404 Not Found".to_string()))?;

        Ok(CachedRateSet {
            base: base.clone(),
            rates,
            fetched_at,
            provider_updated_at: fetched_at,
            date: None,
        })
    }
}
