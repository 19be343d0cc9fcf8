//! Currency conversion types and operations.

use travelrate_common::Currency;

use crate::cache::CachedRateSet;
use crate::input::InputBuffer;

/// Convert an amount typed in `quote` currency into the table's base currency.
///
/// The table holds quote-per-base rates, so dividing recovers the base amount.
/// Returns `None` for a non-finite or zero amount, or when `quote` has no
/// usable rate. No rounding happens here.
pub fn convert(foreign_amount: f64, rates: &CachedRateSet, quote: &Currency) -> Option<f64> {
    if !foreign_amount.is_finite() || foreign_amount == 0.0 {
        return None;
    }

    let rate = rates.rate(quote)?;
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }

    Some(foreign_amount / rate)
}

/// A conversion the user asked for. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// Parsed input amount, in the travel currency.
    pub foreign_amount: f64,
    /// Travel currency.
    pub quote_currency: Currency,
    /// Home currency.
    pub base_currency: Currency,
}

impl ConversionRequest {
    /// Build a request from the input buffer. `None` while the buffer does not
    /// hold a finite non-zero number.
    pub fn from_input(input: &InputBuffer, base: Currency, quote: Currency) -> Option<Self> {
        let foreign_amount = input.value()?;
        if !foreign_amount.is_finite() || foreign_amount == 0.0 {
            return None;
        }

        Some(Self {
            foreign_amount,
            quote_currency: quote,
            base_currency: base,
        })
    }

    /// Run the request against a rate table.
    ///
    /// A table for another base yields `None`: its rates are not
    /// quote-per-`base_currency`.
    pub fn execute(&self, rates: &CachedRateSet) -> Option<Conversion> {
        if rates.base != self.base_currency {
            return None;
        }

        let home_amount = convert(self.foreign_amount, rates, &self.quote_currency)?;
        let rate = rates.rate(&self.quote_currency)?;

        Some(Conversion {
            foreign_amount: self.foreign_amount,
            home_amount,
            rate,
        })
    }
}

/// Result of a conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Amount typed, in the travel currency.
    pub foreign_amount: f64,
    /// Equivalent in the home currency, unrounded.
    pub home_amount: f64,
    /// Quote-per-base rate used.
    pub rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn usd_table() -> CachedRateSet {
        CachedRateSet {
            base: Currency::usd(),
            rates: HashMap::from([(Currency::eur(), 0.92), (Currency::jpy(), 155.0)]),
            fetched_at: 0,
            provider_updated_at: 0,
            date: None,
        }
    }

    #[test]
    fn test_convert() {
        let table = usd_table();

        assert_eq!(convert(92.0, &table, &Currency::eur()), Some(100.0));
        assert_eq!(convert(15_500.0, &table, &Currency::jpy()), Some(100.0));
    }

    #[test]
    fn test_convert_no_result() {
        let table = usd_table();

        assert_eq!(convert(0.0, &table, &Currency::eur()), None);
        assert_eq!(convert(f64::NAN, &table, &Currency::eur()), None);
        assert_eq!(convert(f64::INFINITY, &table, &Currency::eur()), None);
        assert_eq!(convert(10.0, &table, &Currency::gbp()), None);
    }

    #[test]
    fn test_request_from_input() {
        let mut input = InputBuffer::new();
        assert!(ConversionRequest::from_input(&input, Currency::usd(), Currency::eur()).is_none());

        input.apply(Key::Decimal);
        assert!(ConversionRequest::from_input(&input, Currency::usd(), Currency::eur()).is_none());

        for key in [Key::Digit(4), Key::Digit(6)] {
            input.apply(key);
        }
        let request =
            ConversionRequest::from_input(&input, Currency::usd(), Currency::eur()).unwrap();
        assert_eq!(request.foreign_amount, 0.46);

        let conversion = request.execute(&usd_table()).unwrap();
        assert!((conversion.home_amount - 0.5).abs() < 1e-12);
        assert_eq!(conversion.rate, 0.92);
    }

    #[test]
    fn test_request_rejects_foreign_table() {
        let request = ConversionRequest {
            foreign_amount: 10.0,
            quote_currency: Currency::eur(),
            base_currency: Currency::gbp(),
        };

        assert!(request.execute(&usd_table()).is_none());
    }

    proptest! {
        #[test]
        fn prop_convert_round_trips(amount in 0.01f64..1e12, rate in 1e-6f64..1e6) {
            let table = CachedRateSet {
                base: Currency::usd(),
                rates: HashMap::from([(Currency::eur(), rate)]),
                fetched_at: 0,
                provider_updated_at: 0,
                date: None,
            };

            let home = convert(amount, &table, &Currency::eur()).unwrap();
            let back = home * rate;
            prop_assert!((back - amount).abs() <= amount * 1e-12);
        }
    }
}
