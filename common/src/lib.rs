//! TravelRate Common Types
//!
//! Shared types used across TravelRate crates: currency codes, the built-in
//! currency catalog and timestamp helpers.

pub mod currency;
pub mod catalog;
pub mod time;

pub use currency::*;
pub use catalog::CurrencyInfo;
pub use time::*;
