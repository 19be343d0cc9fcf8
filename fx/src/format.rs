//! Display formatting for typed input and converted amounts.

use std::fmt;
use std::str::FromStr;

use travelrate_common::{to_datetime, Currency, Millis};

/// Decimal separator choice. The thousands separator is always the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalSeparator {
    /// `1.234,56`
    #[default]
    Comma,
    /// `1,234.56`
    Dot,
}

impl DecimalSeparator {
    /// The decimal separator character.
    pub fn decimal(self) -> char {
        match self {
            DecimalSeparator::Comma => ',',
            DecimalSeparator::Dot => '.',
        }
    }

    /// The thousands separator character.
    pub fn thousands(self) -> char {
        self.opposite().decimal()
    }

    /// The other choice.
    pub fn opposite(self) -> Self {
        match self {
            DecimalSeparator::Comma => DecimalSeparator::Dot,
            DecimalSeparator::Dot => DecimalSeparator::Comma,
        }
    }

    /// Read a stored setting. Anything but `"."` means comma.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some(".") => DecimalSeparator::Dot,
            _ => DecimalSeparator::Comma,
        }
    }

    /// Value to store for this choice.
    pub fn as_str(self) -> &'static str {
        match self {
            DecimalSeparator::Comma => ",",
            DecimalSeparator::Dot => ".",
        }
    }
}

impl fmt::Display for DecimalSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecimalSeparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "," | "comma" => Ok(DecimalSeparator::Comma),
            "." | "dot" => Ok(DecimalSeparator::Dot),
            other => Err(format!("unknown decimal separator '{}'", other)),
        }
    }
}

/// Insert `sep` between every group of three digits, counting from the right.
pub fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Render a raw input buffer. Only separators change; digits are kept as typed.
pub fn render_input(raw: &str, sep: DecimalSeparator) -> String {
    if raw.is_empty() {
        return "0".to_string();
    }

    match raw.split_once('.') {
        Some((int_part, fraction)) => format!(
            "{}{}{}",
            group_thousands(int_part, sep.thousands()),
            sep.decimal(),
            fraction
        ),
        None => group_thousands(raw, sep.thousands()),
    }
}

/// Render a converted amount with exactly two fractional digits. A missing
/// result renders as zero.
pub fn render_amount(amount: Option<f64>, sep: DecimalSeparator) -> String {
    match amount.filter(|a| a.is_finite()) {
        Some(amount) => render_fixed(amount, 2, sep),
        None => format!("0{}00", sep.decimal()),
    }
}

/// `"1 USD = 0,9200 EUR"`.
pub fn render_rate_label(
    base: &Currency,
    quote: &Currency,
    rate: f64,
    sep: DecimalSeparator,
) -> String {
    format!("1 {} = {} {}", base, render_fixed(rate, 4, sep), quote)
}

/// Relative age of a timestamp: `just now`, `12m ago`, `3h ago`, or the
/// calendar date once a day old.
pub fn render_last_updated(timestamp: Millis, now: Millis) -> String {
    let diff_ms = now.saturating_sub(timestamp).max(0);
    let minutes = diff_ms / 60_000;
    let hours = diff_ms / 3_600_000;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        to_datetime(timestamp)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

fn render_fixed(value: f64, places: usize, sep: DecimalSeparator) -> String {
    let fixed = format!("{:.*}", places, value.abs());
    let (int_part, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    format!(
        "{}{}{}{}",
        sign,
        group_thousands(int_part, sep.thousands()),
        sep.decimal(),
        fraction
    )
}
