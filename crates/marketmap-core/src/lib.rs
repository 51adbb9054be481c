//! # Marketmap Core
//!
//! Acquisition and normalization engine for a fixed catalog of world stock indices.
//!
//! ## Overview
//!
//! For every requested market the engine:
//!
//! - resolves a quote and a daily close history through an ordered fallback chain
//!   (primary symbol, fallback symbol, synthetic generator),
//! - derives change, moving average, trend and volatility range from the history,
//! - classifies the trading session from the market's timezone and hours,
//! - optionally converts the price to EUR,
//! - assembles one [`MarketRecord`] with a weather-style classification label.
//!
//! The synthetic tier never fails, so every catalog entry always yields a record. The
//! record's `provenance` field is the only signal separating real from fabricated data.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Upstream chart adapter |
//! | [`cache`] | TTL cache with an injectable clock |
//! | [`catalog`] | Immutable market catalog |
//! | [`classification`] | Ordered weather classification table |
//! | [`config`] | Engine parameters and `MARKETMAP_*` overrides |
//! | [`data_source`] | Adapter trait and fetch errors |
//! | [`domain`] | Symbols, timestamps, quotes, records |
//! | [`engine`] | Engine facade and record assembly |
//! | [`fx`] | EUR conversion |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`indicators`] | Derived indicator math |
//! | [`resolver`] | Fetch tier resolver |
//! | [`session`] | Session status state machine |
//! | [`summary`] | Aggregate KPIs |
//! | [`synthetic`] | Synthetic data tier |
//! | [`throttling`] | Per-host politeness policy |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marketmap_core::{MarketEngine, RecordOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = MarketEngine::builder().build()?;
//!     for record in engine.get_all_records(RecordOptions::default()).await {
//!         println!("{} {:.2} ({})", record.display_name, record.price, record.provenance);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Market Engine  │────▶│ Session / FX /   │
//! └────────┬────────┘     │ Classification   │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Tier Resolver  │────▶│ TTL Cache        │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Chart Adapter   │────▶│ Throttled HTTP   │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod adapters;
pub mod cache;
pub mod catalog;
pub mod classification;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fx;
pub mod http_client;
pub mod indicators;
pub mod resolver;
pub mod session;
pub mod summary;
pub mod synthetic;
pub mod throttling;

pub use adapters::YahooChartSource;

pub use cache::{CacheKey, CacheStore, Clock, ManualClock, SystemClock};

pub use catalog::MarketCatalog;

pub use classification::{BandRule, ClassificationTable, ClassificationThresholds, WeatherLabel};

pub use config::{
    CacheTtls, EngineConfig, FxConfig, FxTicker, IndicatorConfig, PolitenessPolicy, UpstreamConfig,
};

pub use data_source::{FetchError, IntradayQuote, MarketDataSource};

pub use domain::{
    Coordinates, DerivedIndicators, MarketDefinition, MarketRecord, PriceSeries, Provenance,
    QuoteSnapshot, Region, SessionState, SessionStatus, Symbol, Trend, UtcDateTime,
};

pub use engine::{assemble_record, MarketEngine, MarketEngineBuilder, RecordOptions};

pub use error::{CoreError, ValidationError};

pub use fx::CurrencyConverter;

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, OfflineHttpClient, ReqwestHttpClient,
};

pub use resolver::{ResolvedMarket, TierResolver};

pub use summary::{MarketSummary, Performer};

pub use synthetic::SyntheticGenerator;

pub use throttling::{HostThrottle, ThrottledHttpClient};
