//! Persisted user selections.

use travelrate_common::Currency;

use crate::error::StoreError;
use crate::format::DecimalSeparator;
use crate::store::{keys, SharedStore};

/// Travel currency used until the user picks one.
pub fn default_travel_currency() -> Currency {
    Currency::eur()
}

/// User settings stored as scalar keys in a [`KeyValueStore`](crate::store::KeyValueStore).
#[derive(Clone)]
pub struct Settings {
    store: SharedStore,
}

impl Settings {
    /// Create settings backed by `store`.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Home currency, absent until chosen.
    pub fn home_currency(&self) -> Option<Currency> {
        self.read_currency(keys::HOME_CURRENCY)
    }

    /// Persist the home currency.
    pub fn set_home_currency(&self, currency: &Currency) -> Result<(), StoreError> {
        self.store.set_string(keys::HOME_CURRENCY, currency.code())
    }

    /// Travel currency, EUR until chosen.
    pub fn travel_currency(&self) -> Currency {
        self.read_currency(keys::TRAVEL_CURRENCY)
            .unwrap_or_else(default_travel_currency)
    }

    /// Persist the travel currency.
    pub fn set_travel_currency(&self, currency: &Currency) -> Result<(), StoreError> {
        self.store.set_string(keys::TRAVEL_CURRENCY, currency.code())
    }

    /// Display separator, comma until chosen.
    pub fn decimal_separator(&self) -> DecimalSeparator {
        DecimalSeparator::from_stored(self.store.get_string(keys::DECIMAL_SEPARATOR).as_deref())
    }

    /// Persist the display separator.
    pub fn set_decimal_separator(&self, sep: DecimalSeparator) -> Result<(), StoreError> {
        self.store.set_string(keys::DECIMAL_SEPARATOR, sep.as_str())
    }

    fn read_currency(&self, key: &str) -> Option<Currency> {
        self.store
            .get_string(key)
            .map(Currency::new)
            .filter(|c| !c.is_empty())
    }
}
