//! TravelRate FX Engine
//!
//! Exchange-rate cache and conversion engine behind the travel converter.
//!
//! # Features
//!
//! - Rate fetching over HTTP with write-through persistence
//! - Stale-while-revalidate caching with one refresh in flight per base
//! - Bounded retries that fall back to the last good table
//! - Keypad input handling and locale-aware amount rendering
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use travelrate_fx::{HttpRateFetcher, ProviderConfig, RateCache, RateCacheConfig, RateCacheManager};
//! use travelrate_common::Currency;
//!
//! let fetcher = Arc::new(HttpRateFetcher::new(ProviderConfig::default())?);
//! let manager = RateCacheManager::new(fetcher, RateCache::new(), RateCacheConfig::default());
//!
//! let view = manager.load(&Currency::usd()).await?;
//! let eur_per_usd = view.rate_for(&Currency::eur());
//! ```

pub mod error;
pub mod store;
pub mod cache;
pub mod provider;
pub mod engine;
pub mod conversion;
pub mod input;
pub mod format;
pub mod settings;
pub mod session;

pub use cache::{CachedRateSet, RateCache};
pub use conversion::{convert, Conversion, ConversionRequest};
pub use engine::{RateCacheConfig, RateCacheManager, RatesQuery, RatesView};
pub use error::{RateError, RateResult, StoreError};
pub use format::DecimalSeparator;
pub use input::{InputBuffer, Key};
pub use provider::{HttpRateFetcher, ProviderConfig, RateFetcher};
pub use session::{ConverterSession, ScreenState};
pub use settings::Settings;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, SharedStore};
