//! Upstream data source contract.
//!
//! A [`MarketDataSource`] answers two questions for a single symbol: what is the latest
//! intraday quote, and what are the recent daily closes. Every failure is a [`FetchError`],
//! which the resolver matches on to decide whether to advance to the next tier.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::Symbol;

/// Why a single fetch tier failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout, refused connection or non-success status.
    #[error("network error: {message}")]
    Network { message: String },
    /// The payload could not be decoded.
    #[error("malformed payload: {message}")]
    Parse { message: String },
    /// The payload decoded but lacks a field the engine requires.
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub const fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "fetch.network",
            Self::Parse { .. } => "fetch.parse",
            Self::MissingField { .. } => "fetch.missing_field",
        }
    }
}

/// Raw intraday quote as reported upstream, before provenance is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntradayQuote {
    pub current_price: f64,
    pub previous_close: f64,
    pub volume: u64,
}

pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Upstream adapter contract.
///
/// Implementations perform exactly one upstream attempt per call; retries and fallbacks
/// belong to the resolver.
pub trait MarketDataSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Latest price, previous close and volume.
    ///
    /// # Errors
    ///
    /// [`FetchError::MissingField`] when the current price is absent or the previous close
    /// is absent or zero.
    fn intraday_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a, IntradayQuote>;

    /// Daily closes, oldest first, with null entries dropped.
    fn daily_closes<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a, Vec<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(FetchError::network("timeout").code(), "fetch.network");
        assert_eq!(FetchError::parse("eof").code(), "fetch.parse");
        assert_eq!(
            FetchError::missing("previousClose").code(),
            "fetch.missing_field"
        );
    }

    #[test]
    fn missing_field_message_names_the_field() {
        assert_eq!(
            FetchError::missing("regularMarketPrice").to_string(),
            "missing required field 'regularMarketPrice'"
        );
    }
}
