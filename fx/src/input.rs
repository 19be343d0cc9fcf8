//! Keypad input buffer.

use crate::format::DecimalSeparator;

/// Maximum number of characters in the buffer.
pub const MAX_INPUT_LEN: usize = 12;

/// Maximum number of digits after the decimal point.
pub const MAX_FRACTION_DIGITS: usize = 2;

/// A keypad key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Digit 0-9.
    Digit(u8),
    /// Decimal point, whatever the display separator.
    Decimal,
    Backspace,
}

impl Key {
    /// Map a typed character to a key. Only the configured decimal separator
    /// counts as the decimal key; the grouping character is not a key.
    pub fn from_char(c: char, sep: DecimalSeparator) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Key::Digit(d as u8)),
            c if c == sep.decimal() => Some(Key::Decimal),
            '\u{8}' | '\u{7f}' | '⌫' => Some(Key::Backspace),
            _ => None,
        }
    }
}

/// Raw keypad input, always using `.` as the decimal point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    raw: String,
}

impl InputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw buffer.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Drop everything typed so far.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Apply one keystroke. Returns whether the buffer changed.
    pub fn apply(&mut self, key: Key) -> bool {
        match key {
            Key::Backspace => self.raw.pop().is_some(),
            Key::Decimal if self.raw.contains('.') => false,
            Key::Decimal if self.raw.is_empty() => {
                self.raw.push_str("0.");
                true
            }
            Key::Decimal => self.push('.'),
            Key::Digit(d) if d <= 9 => self.push(char::from(b'0' + d)),
            Key::Digit(_) => false,
        }
    }

    /// Parsed value, `None` while empty.
    pub fn value(&self) -> Option<f64> {
        self.raw.parse().ok()
    }

    fn push(&mut self, c: char) -> bool {
        if self.raw.len() >= MAX_INPUT_LEN {
            return false;
        }

        if let Some((_, fraction)) = self.raw.split_once('.') {
            if fraction.len() >= MAX_FRACTION_DIGITS {
                return false;
            }
        }

        self.raw.push(c);
        true
    }
}
