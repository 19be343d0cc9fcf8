//! Built-in catalog of currencies offered in the pickers.

use crate::Currency;

/// Display metadata for a supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub country: &'static str,
}

impl CurrencyInfo {
    const fn new(
        code: &'static str,
        name: &'static str,
        symbol: &'static str,
        country: &'static str,
    ) -> Self {
        Self {
            code,
            name,
            symbol,
            country,
        }
    }

    /// The currency code as a `Currency`.
    pub fn currency(&self) -> Currency {
        Currency::new(self.code)
    }
}

const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo::new("AED", "UAE Dirham", "د.إ", "United Arab Emirates"),
    CurrencyInfo::new("AUD", "Australian Dollar", "A$", "Australia"),
    CurrencyInfo::new("BRL", "Brazilian Real", "R$", "Brazil"),
    CurrencyInfo::new("CAD", "Canadian Dollar", "C$", "Canada"),
    CurrencyInfo::new("CHF", "Swiss Franc", "Fr", "Switzerland"),
    CurrencyInfo::new("CNY", "Chinese Yuan", "¥", "China"),
    CurrencyInfo::new("COP", "Colombian Peso", "$", "Colombia"),
    CurrencyInfo::new("CZK", "Czech Koruna", "Kč", "Czech Republic"),
    CurrencyInfo::new("DKK", "Danish Krone", "kr", "Denmark"),
    CurrencyInfo::new("EUR", "Euro", "€", "Eurozone"),
    CurrencyInfo::new("GBP", "British Pound", "£", "United Kingdom"),
    CurrencyInfo::new("HKD", "Hong Kong Dollar", "HK$", "Hong Kong"),
    CurrencyInfo::new("IDR", "Indonesian Rupiah", "Rp", "Indonesia"),
    CurrencyInfo::new("ILS", "Israeli Shekel", "₪", "Israel"),
    CurrencyInfo::new("INR", "Indian Rupee", "₹", "India"),
    CurrencyInfo::new("JPY", "Japanese Yen", "¥", "Japan"),
    CurrencyInfo::new("KRW", "South Korean Won", "₩", "South Korea"),
    CurrencyInfo::new("MXN", "Mexican Peso", "$", "Mexico"),
    CurrencyInfo::new("NOK", "Norwegian Krone", "kr", "Norway"),
    CurrencyInfo::new("NZD", "New Zealand Dollar", "NZ$", "New Zealand"),
    CurrencyInfo::new("PHP", "Philippine Peso", "₱", "Philippines"),
    CurrencyInfo::new("PLN", "Polish Zloty", "zł", "Poland"),
    CurrencyInfo::new("RUB", "Russian Ruble", "₽", "Russia"),
    CurrencyInfo::new("SEK", "Swedish Krona", "kr", "Sweden"),
    CurrencyInfo::new("SGD", "Singapore Dollar", "S$", "Singapore"),
    CurrencyInfo::new("THB", "Thai Baht", "฿", "Thailand"),
    CurrencyInfo::new("TRY", "Turkish Lira", "₺", "Turkey"),
    CurrencyInfo::new("TWD", "Taiwan Dollar", "NT$", "Taiwan"),
    CurrencyInfo::new("USD", "US Dollar", "$", "United States"),
    CurrencyInfo::new("VND", "Vietnamese Dong", "₫", "Vietnam"),
    CurrencyInfo::new("ZAR", "South African Rand", "R", "South Africa"),
];

/// All supported currencies, sorted by code.
pub fn all() -> &'static [CurrencyInfo] {
    CURRENCIES
}

/// Look up a currency by code.
pub fn find(currency: &Currency) -> Option<&'static CurrencyInfo> {
    CURRENCIES.iter().find(|c| c.code == currency.code())
}
