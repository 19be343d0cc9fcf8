//! Rate engine error types.

use travelrate_common::Currency;
use thiserror::Error;

/// Errors that can occur while obtaining rates.
///
/// `Clone` so a single in-flight refresh outcome can be handed to every caller
/// that joined it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// Transport failure or non-success HTTP status.
    #[error("Failed to fetch rates: {0}")]
    Fetch(String),

    /// Response body did not match the provider shape.
    #[error("Malformed rate response: {0}")]
    Parse(String),

    /// Nothing was ever fetched for this base and the latest attempt failed.
    #[error("No rates available for {0}")]
    NoCacheAvailable(Currency),

    /// No base currency was selected.
    #[error("No base currency selected")]
    MissingBaseCurrency,
}

impl RateError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RateError::Fetch(_) | RateError::Parse(_))
    }
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;

/// Errors raised by a persistent key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(RateError::Fetch("503".into()).is_retryable());
        assert!(RateError::Parse("eof".into()).is_retryable());
        assert!(!RateError::NoCacheAvailable(Currency::usd()).is_retryable());
        assert!(!RateError::MissingBaseCurrency.is_retryable());
    }
}
