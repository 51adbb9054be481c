//! Derived indicators computed from a close series and the current quote.
//!
//! All functions are pure. An indicator that cannot be computed is `None` (or
//! [`Trend::Unavailable`]), never zero.

use crate::config::IndicatorConfig;
use crate::domain::{DerivedIndicators, PriceSeries, Trend};

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent change from `previous_close`, rounded to two decimals.
///
/// `None` when the previous close is zero or not finite.
pub fn change_pct(current: f64, previous_close: f64) -> Option<f64> {
    if previous_close == 0.0 || !previous_close.is_finite() || !current.is_finite() {
        return None;
    }
    Some(round2((current - previous_close) / previous_close * 100.0))
}

/// Mean of the last `window` closes; `None` unless the series holds a full window.
pub fn moving_average(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Bullish only when strictly above the average. A tie is bearish.
pub fn trend(current: f64, moving_average: Option<f64>) -> Trend {
    match moving_average {
        None => Trend::Unavailable,
        Some(ma) if current > ma => Trend::Bullish,
        Some(_) => Trend::Bearish,
    }
}

/// `(max - min) / last * 100` over the trailing `window` closes, unrounded so the
/// volatility threshold compares against the exact range.
///
/// Needs at least two samples in the window and a non-zero last close.
pub fn volatility_range_pct(closes: &[f64], window: usize) -> Option<f64> {
    let start = closes.len().saturating_sub(window);
    let tail = &closes[start..];
    if tail.len() < 2 {
        return None;
    }

    let last = *tail.last()?;
    if last == 0.0 {
        return None;
    }

    let max = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = tail.iter().copied().fold(f64::INFINITY, f64::min);
    Some((max - min) / last * 100.0)
}

pub fn compute(
    current: f64,
    previous_close: f64,
    series: Option<&PriceSeries>,
    config: &IndicatorConfig,
) -> DerivedIndicators {
    let closes = series.map(|series| series.closes.as_slice()).unwrap_or(&[]);
    let moving_average = moving_average(closes, config.moving_average_window);

    DerivedIndicators {
        change_pct: change_pct(current, previous_close),
        moving_average: moving_average.map(round2),
        trend: trend(current, moving_average),
        volatility_range_pct: volatility_range_pct(closes, config.volatility_window),
    }
}
