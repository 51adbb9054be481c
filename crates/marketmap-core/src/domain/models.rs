use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::classification::WeatherLabel;
use crate::{Symbol, UtcDateTime, ValidationError};

/// Which tier of the fetch chain produced a piece of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    RealPrimary,
    RealFallback,
    Simulated,
}

impl Provenance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RealPrimary => "real_primary",
            Self::RealFallback => "real_fallback",
            Self::Simulated => "simulated",
        }
    }

    pub const fn is_real(self) -> bool {
        !matches!(self, Self::Simulated)
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest quote for one market, as produced by a single fetch tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub resolved_symbol: Symbol,
    pub current_price: f64,
    pub previous_close: f64,
    pub volume: u64,
    pub fetched_at: UtcDateTime,
    pub provenance: Provenance,
}

impl QuoteSnapshot {
    pub fn new(
        resolved_symbol: Symbol,
        current_price: f64,
        previous_close: f64,
        volume: u64,
        fetched_at: UtcDateTime,
        provenance: Provenance,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("current_price", current_price)?;
        validate_positive("previous_close", previous_close)?;

        Ok(Self {
            resolved_symbol,
            current_price,
            previous_close,
            volume,
            fetched_at,
            provenance,
        })
    }
}

/// Daily closes, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub resolved_symbol: Symbol,
    pub provenance: Provenance,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(resolved_symbol: Symbol, provenance: Provenance, closes: Vec<f64>) -> Self {
        Self {
            resolved_symbol,
            provenance,
            closes,
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Up to `n` most recent closes, oldest first.
    pub fn tail(&self, n: usize) -> &[f64] {
        let start = self.closes.len().saturating_sub(n);
        &self.closes[start..]
    }
}

/// Direction of the current price relative to its moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Unavailable,
}

impl Trend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Indicators derived from a quote and its price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedIndicators {
    pub change_pct: Option<f64>,
    pub moving_average: Option<f64>,
    pub trend: Trend,
    pub volatility_range_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    ClosedWeekend,
    PreMarket,
    PostMarket,
    Error,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::ClosedWeekend => "closed_weekend",
            Self::PreMarket => "pre_market",
            Self::PostMarket => "post_market",
            Self::Error => "error",
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub local_time: String,
    pub next_transition_hint: String,
}

/// Normalized per-market output record.
///
/// Field names and types are a stable contract for presentation consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub symbol: Symbol,
    pub resolved_symbol: Symbol,
    pub display_name: String,
    pub country: String,
    pub currency_code: String,
    pub price: f64,
    pub previous_close: f64,
    pub change_pct: Option<f64>,
    pub volume: u64,
    pub moving_average: Option<f64>,
    pub trend: Trend,
    pub volatility_range_pct: Option<f64>,
    pub session_state: SessionState,
    pub local_time: String,
    pub eur_price: Option<f64>,
    pub provenance: Provenance,
    pub classification_label: WeatherLabel,
    pub fetched_at: UtcDateTime,
}

pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

pub(crate) fn validate_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

pub(crate) fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_currency() {
        assert_eq!(
            validate_currency_code("usd").expect("must normalize"),
            "USD"
        );
        assert!(matches!(
            validate_currency_code("USDT"),
            Err(ValidationError::InvalidCurrency { .. })
        ));
    }

    #[test]
    fn quote_rejects_zero_previous_close() {
        let symbol = Symbol::parse("^GSPC").expect("valid");
        let err = QuoteSnapshot::new(
            symbol,
            5975.0,
            0.0,
            0,
            UtcDateTime::now(),
            Provenance::RealPrimary,
        )
        .expect_err("zero previous close must fail");
        assert_eq!(
            err,
            ValidationError::NonPositiveValue {
                field: "previous_close"
            }
        );
    }

    #[test]
    fn series_tail_clamps_to_length() {
        let series = PriceSeries::new(
            Symbol::parse("SPY").expect("valid"),
            Provenance::RealFallback,
            vec![1.0, 2.0, 3.0],
        );
        assert_eq!(series.tail(2), &[2.0, 3.0]);
        assert_eq!(series.tail(10), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn provenance_serializes_snake_case() {
        let json = serde_json::to_string(&Provenance::RealFallback).expect("serialize");
        assert_eq!(json, "\"real_fallback\"");
        assert!(!Provenance::Simulated.is_real());
    }
}
