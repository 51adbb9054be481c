//! Process-wide engine parameters.
//!
//! Every tunable lives here: upstream endpoints, per-operation TTLs, indicator windows,
//! classification thresholds, politeness limits and the FX ticker table. Values come from
//! [`EngineConfig::default`] and can be overridden through `MARKETMAP_*` environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MARKETMAP_CHART_BASE_URL` | `upstream.chart_base_url` |
//! | `MARKETMAP_USER_AGENT` | `upstream.user_agent` |
//! | `MARKETMAP_HTTP_TIMEOUT_MS` | `upstream.timeout` |
//! | `MARKETMAP_QUOTE_TTL_SECS` | `ttl.quote` |
//! | `MARKETMAP_HISTORY_TTL_SECS` | `ttl.history` |
//! | `MARKETMAP_FX_TTL_SECS` | `ttl.fx` |
//! | `MARKETMAP_FAILURE_TTL_SECS` | `ttl.failure` |
//! | `MARKETMAP_MA_WINDOW` | `indicators.moving_average_window` |
//! | `MARKETMAP_VOLATILITY_WINDOW` | `indicators.volatility_window` |
//! | `MARKETMAP_VOLATILITY_THRESHOLD_PCT` | `classification.volatility_threshold_pct` |
//! | `MARKETMAP_WORKER_POOL_SIZE` | `politeness.worker_pool_size` |
//! | `MARKETMAP_MAX_CONCURRENT_PER_HOST` | `politeness.max_concurrent_per_host` |
//! | `MARKETMAP_MIN_REQUEST_INTERVAL_MS` | `politeness.min_request_interval` |

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::classification::ClassificationThresholds;
use crate::http_client::DEFAULT_USER_AGENT;
use crate::{Symbol, ValidationError};

pub const DEFAULT_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Chart endpoint location and request shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub chart_base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub intraday_range: String,
    pub intraday_interval: String,
    pub history_range: String,
    pub history_interval: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            chart_base_url: String::from(DEFAULT_CHART_BASE_URL),
            user_agent: String::from(DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(12),
            intraday_range: String::from("1d"),
            intraday_interval: String::from("1m"),
            history_range: String::from("6mo"),
            history_interval: String::from("1d"),
        }
    }
}

/// Time-to-live per data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub quote: Duration,
    pub history: Duration,
    pub fx: Duration,
    /// Lifetime of a failed-tier marker. Zero disables failure caching.
    pub failure: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(300),
            history: Duration::from_secs(300),
            fx: Duration::from_secs(600),
            failure: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub moving_average_window: usize,
    pub volatility_window: usize,
    /// Length of the generated series when the synthetic tier answers a history request.
    pub synthetic_history_len: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            moving_average_window: 50,
            volatility_window: 21,
            synthetic_history_len: 126,
        }
    }
}

/// Resource-protection limits for upstream hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessPolicy {
    pub worker_pool_size: usize,
    pub max_concurrent_per_host: usize,
    pub min_request_interval: Duration,
}

impl Default for PolitenessPolicy {
    fn default() -> Self {
        Self {
            worker_pool_size: 4,
            max_concurrent_per_host: 2,
            min_request_interval: Duration::from_millis(250),
        }
    }
}

/// FX ticker quoting EUR in the local currency (e.g. `EURUSD=X`).
#[derive(Debug, Clone, PartialEq)]
pub struct FxTicker {
    pub symbol: Symbol,
    /// Rate used by the synthetic tier. Without one, an unreachable ticker yields no EUR price.
    pub reference_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FxConfig {
    pub tickers: BTreeMap<String, FxTicker>,
}

impl FxConfig {
    pub fn ticker_for(&self, currency_code: &str) -> Option<&FxTicker> {
        self.tickers.get(currency_code)
    }
}

impl Default for FxConfig {
    fn default() -> Self {
        let tickers = [
            ("USD", "EURUSD=X"),
            ("GBP", "EURGBP=X"),
            ("JPY", "EURJPY=X"),
            ("CAD", "EURCAD=X"),
            ("HKD", "EURHKD=X"),
            ("AUD", "EURAUD=X"),
            ("CNY", "EURCNY=X"),
            ("BRL", "EURBRL=X"),
            ("MXN", "EURMXN=X"),
        ]
        .into_iter()
        .map(|(currency, ticker)| {
            (
                currency.to_owned(),
                FxTicker {
                    symbol: Symbol::parse(ticker).expect("bundled FX tickers are valid"),
                    reference_rate: None,
                },
            )
        })
        .collect();

        Self { tickers }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub upstream: UpstreamConfig,
    pub ttl: CacheTtls,
    pub indicators: IndicatorConfig,
    pub classification: ClassificationThresholds,
    pub politeness: PolitenessPolicy,
    pub fx: FxConfig,
}

impl EngineConfig {
    /// Defaults overridden by `MARKETMAP_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `MARKETMAP_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MARKETMAP_CHART_BASE_URL") {
            config.upstream.chart_base_url = url;
        }
        if let Some(agent) = lookup("MARKETMAP_USER_AGENT") {
            config.upstream.user_agent = agent;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "MARKETMAP_HTTP_TIMEOUT_MS")? {
            config.upstream.timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "MARKETMAP_QUOTE_TTL_SECS")? {
            config.ttl.quote = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "MARKETMAP_HISTORY_TTL_SECS")? {
            config.ttl.history = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "MARKETMAP_FX_TTL_SECS")? {
            config.ttl.fx = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "MARKETMAP_FAILURE_TTL_SECS")? {
            config.ttl.failure = Duration::from_secs(secs);
        }
        if let Some(window) = parse_var::<usize>(&lookup, "MARKETMAP_MA_WINDOW")? {
            config.indicators.moving_average_window = window;
        }
        if let Some(window) = parse_var::<usize>(&lookup, "MARKETMAP_VOLATILITY_WINDOW")? {
            config.indicators.volatility_window = window;
        }
        if let Some(pct) = parse_var::<f64>(&lookup, "MARKETMAP_VOLATILITY_THRESHOLD_PCT")? {
            config.classification.volatility_threshold_pct = pct;
        }
        if let Some(size) = parse_var::<usize>(&lookup, "MARKETMAP_WORKER_POOL_SIZE")? {
            config.politeness.worker_pool_size = size;
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "MARKETMAP_MAX_CONCURRENT_PER_HOST")? {
            config.politeness.max_concurrent_per_host = limit;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "MARKETMAP_MIN_REQUEST_INTERVAL_MS")? {
            config.politeness.min_request_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.upstream.chart_base_url.trim().is_empty() {
            return Err(invalid("chart_base_url", "must not be empty"));
        }
        if self.upstream.timeout.is_zero() {
            return Err(invalid("http_timeout", "must be greater than zero"));
        }
        if self.indicators.moving_average_window == 0 {
            return Err(invalid("moving_average_window", "must be at least 1"));
        }
        if self.indicators.volatility_window < 2 {
            return Err(invalid("volatility_window", "must be at least 2"));
        }
        if self.politeness.worker_pool_size == 0 {
            return Err(invalid("worker_pool_size", "must be at least 1"));
        }
        if self.politeness.max_concurrent_per_host == 0 {
            return Err(invalid("max_concurrent_per_host", "must be at least 1"));
        }
        self.classification.validate()?;

        for (currency, ticker) in &self.fx.tickers {
            if let Some(rate) = ticker.reference_rate {
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(invalid(
                        "fx.reference_rate",
                        format!("rate for {currency} must be a positive number"),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ValidationError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(key, format!("'{raw}': {e}"))),
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidConfig {
        key,
        reason: reason.into(),
    }
}
