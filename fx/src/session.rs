//! One converter screen: selections, keypad input and the rendered result.

use travelrate_common::{catalog, now_millis, Currency};

use crate::conversion::ConversionRequest;
use crate::engine::{RateCacheManager, RatesView};
use crate::error::{RateError, RateResult, StoreError};
use crate::format::{self, DecimalSeparator};
use crate::input::{InputBuffer, Key};
use crate::settings::Settings;

/// Everything the screen shows.
#[derive(Debug, Clone)]
pub struct ScreenState {
    pub home_currency: Option<Currency>,
    pub travel_currency: Currency,
    /// Typed amount, e.g. `1.234,5`.
    pub input_text: String,
    /// Converted amount, e.g. `€1.134,20`, or the zero placeholder.
    pub result_text: String,
    /// `1 USD = 0,9200 EUR`, when a rate is known.
    pub rate_label: Option<String>,
    /// `12m ago`, when rates are shown.
    pub last_updated: Option<String>,
    pub is_loading: bool,
    pub is_stale: bool,
    /// Hard error: no amount can be shown.
    pub error: Option<RateError>,
}

/// Converter screen state machine.
pub struct ConverterSession {
    settings: Settings,
    manager: RateCacheManager,
    input: InputBuffer,
}

impl ConverterSession {
    /// Create a new session over stored settings and a rate manager.
    pub fn new(settings: Settings, manager: RateCacheManager) -> Self {
        Self {
            settings,
            manager,
            input: InputBuffer::new(),
        }
    }

    /// Stored settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current keypad input.
    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Choose the home currency. Clears the typed amount and starts loading
    /// rates for the new base.
    pub fn select_home(&mut self, currency: &Currency) -> Result<(), StoreError> {
        self.settings.set_home_currency(currency)?;
        self.input.clear();
        self.manager.get_rates(currency);
        Ok(())
    }

    /// Choose the travel currency. Clears the typed amount.
    pub fn select_travel(&mut self, currency: &Currency) -> Result<(), StoreError> {
        self.settings.set_travel_currency(currency)?;
        self.input.clear();
        Ok(())
    }

    /// Persist the display separator. The typed amount is kept.
    pub fn set_decimal_separator(&self, sep: DecimalSeparator) -> Result<(), StoreError> {
        self.settings.set_decimal_separator(sep)
    }

    /// Apply one keystroke.
    pub fn press(&mut self, key: Key) -> bool {
        self.input.apply(key)
    }

    /// Apply every recognised character of `keys`, ignoring the rest. The
    /// decimal key is the configured separator.
    pub fn type_str(&mut self, keys: &str) {
        let sep = self.settings.decimal_separator();
        for key in keys.chars().filter_map(|c| Key::from_char(c, sep)) {
            self.input.apply(key);
        }
    }

    /// Wait until rates for the home currency are settled.
    pub async fn load(&self) -> RateResult<RatesView> {
        let home = self.home()?;
        self.manager.load(&home).await
    }

    /// Force a rate refresh for the home currency.
    pub async fn refresh(&self) -> RateResult<RatesView> {
        let home = self.home()?;
        self.manager.refresh(&home).await
    }

    /// Render the screen from current state.
    pub fn display(&self) -> ScreenState {
        let sep = self.settings.decimal_separator();
        let travel = self.settings.travel_currency();
        let input_text = format::render_input(self.input.as_str(), sep);

        let Some(home) = self.settings.home_currency() else {
            return ScreenState {
                home_currency: None,
                travel_currency: travel,
                input_text,
                result_text: format::render_amount(None, sep),
                rate_label: None,
                last_updated: None,
                is_loading: false,
                is_stale: false,
                error: Some(RateError::MissingBaseCurrency),
            };
        };

        let view = self.manager.get_rates(&home);

        let conversion = view.rates.as_deref().and_then(|rates| {
            ConversionRequest::from_input(&self.input, home.clone(), travel.clone())?
                .execute(rates)
        });

        let symbol = catalog::find(&home).map(|c| c.symbol).unwrap_or("");
        let result_text = format!(
            "{}{}",
            symbol,
            format::render_amount(conversion.map(|c| c.home_amount), sep)
        );

        let rate_label = view
            .rate_for(&travel)
            .map(|rate| format::render_rate_label(&home, &travel, rate, sep));
        let last_updated = view
            .last_updated_at
            .map(|ts| format::render_last_updated(ts, now_millis()));

        ScreenState {
            home_currency: Some(home),
            travel_currency: travel,
            input_text,
            result_text,
            rate_label,
            last_updated,
            is_loading: view.is_loading,
            is_stale: view.is_stale,
            error: view.error,
        }
    }

    fn home(&self) -> RateResult<Currency> {
        self.settings
            .home_currency()
            .ok_or(RateError::MissingBaseCurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RateCache;
    use crate::engine::RateCacheConfig;
    use crate::provider::MockRateFetcher;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn setup() -> (Arc<MockRateFetcher>, ConverterSession) {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(MockRateFetcher::new("test"));
        fetcher.set_rates(Currency::usd(), &[("EUR", 0.5), ("JPY", 150.0)]);

        let manager = RateCacheManager::new(
            fetcher.clone(),
            RateCache::with_store(store.clone()),
            RateCacheConfig {
                retry_base_delay: std::time::Duration::ZERO,
                ..Default::default()
            },
        );
        (fetcher, ConverterSession::new(Settings::new(store), manager))
    }

    #[tokio::test]
    async fn test_display_without_home_currency() {
        let (_fetcher, session) = setup();

        let screen = session.display();
        assert!(screen.home_currency.is_none());
        assert_eq!(screen.result_text, "0,00");
        assert!(matches!(screen.error, Some(RateError::MissingBaseCurrency)));
    }

    #[tokio::test]
    async fn test_full_conversion() {
        let (_fetcher, mut session) = setup();
        session.select_home(&Currency::usd()).unwrap();
        session.load().await.unwrap();

        session.type_str("1.234,5");
        let screen = session.display();

        assert_eq!(screen.input_text, "1.234,5");
        assert_eq!(screen.result_text, "$2.469,00");
        assert_eq!(screen.rate_label.as_deref(), Some("1 USD = 0,5000 EUR"));
        assert_eq!(screen.last_updated.as_deref(), Some("just now"));
        assert!(!screen.is_stale);
    }

    #[tokio::test]
    async fn test_selection_change_clears_input() {
        let (_fetcher, mut session) = setup();
        session.select_home(&Currency::usd()).unwrap();
        session.load().await.unwrap();
        session.type_str("15000");

        session.select_travel(&Currency::jpy()).unwrap();
        assert!(session.input().is_empty());

        session.type_str("15000");
        session.set_decimal_separator(DecimalSeparator::Dot).unwrap();
        let screen = session.display();
        assert_eq!(screen.input_text, "15,000");
        assert_eq!(screen.result_text, "$100.00");
    }

    #[tokio::test]
    async fn test_typing_follows_configured_separator() {
        let (_fetcher, mut session) = setup();
        session.select_home(&Currency::usd()).unwrap();
        session.set_decimal_separator(DecimalSeparator::Dot).unwrap();
        session.load().await.unwrap();

        session.type_str("1,234.5");
        assert_eq!(session.input().as_str(), "1234.5");

        let screen = session.display();
        assert_eq!(screen.input_text, "1,234.5");
        assert_eq!(screen.result_text, "$2,469.00");
    }

    #[tokio::test]
    async fn test_unknown_quote_shows_placeholder() {
        let (_fetcher, mut session) = setup();
        session.select_home(&Currency::usd()).unwrap();
        session.select_travel(&Currency::new("CHF")).unwrap();
        session.load().await.unwrap();
        session.type_str("10");

        let screen = session.display();
        assert_eq!(screen.result_text, "$0,00");
        assert!(screen.rate_label.is_none());
    }

    #[tokio::test]
    async fn test_no_rates_surfaces_error() {
        let (fetcher, mut session) = setup();
        session.select_home(&Currency::gbp()).unwrap();

        // No GBP table in the mock: every attempt fails.
        assert!(matches!(
            session.load().await,
            Err(RateError::NoCacheAvailable(_))
        ));

        session.type_str("5");
        let screen = session.display();
        assert_eq!(screen.result_text, "£0,00");
        assert!(screen.is_stale);
        assert!(matches!(screen.error, Some(RateError::NoCacheAvailable(_))));
        assert!(fetcher.calls(&Currency::gbp()) >= 3);
    }
}
