//! Record assembly and the engine facade.
//!
//! [`MarketEngine`] is the only type the presentation layer needs. It validates the requested
//! symbols against the catalog before any I/O, resolves each market on a bounded worker pool,
//! and returns records in request order.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use crate::adapters::YahooChartSource;
use crate::cache::{CacheStore, Clock, SystemClock};
use crate::catalog::MarketCatalog;
use crate::classification::{ClassificationTable, WeatherLabel};
use crate::config::EngineConfig;
use crate::data_source::MarketDataSource;
use crate::domain::{
    DerivedIndicators, MarketDefinition, MarketRecord, QuoteSnapshot, Region, SessionStatus,
};
use crate::fx::CurrencyConverter;
use crate::http_client::{HttpClient, OfflineHttpClient, ReqwestHttpClient};
use crate::indicators;
use crate::resolver::TierResolver;
use crate::session;
use crate::summary::{self, MarketSummary};
use crate::synthetic::SyntheticGenerator;
use crate::throttling::{HostThrottle, ThrottledHttpClient};
use crate::{Symbol, UtcDateTime, ValidationError};

/// Per-call switches for [`MarketEngine::get_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// Resolve FX rates and fill `eur_price`.
    pub include_eur: bool,
    /// Instant used for session status. Defaults to the current time.
    pub at: Option<UtcDateTime>,
}

impl RecordOptions {
    pub fn with_eur(mut self) -> Self {
        self.include_eur = true;
        self
    }

    pub fn at(mut self, now: UtcDateTime) -> Self {
        self.at = Some(now);
        self
    }
}

/// Composes one output record from already-resolved parts.
pub fn assemble_record(
    market: &MarketDefinition,
    quote: &QuoteSnapshot,
    indicators: &DerivedIndicators,
    session: SessionStatus,
    eur_price: Option<f64>,
    classification_label: WeatherLabel,
) -> MarketRecord {
    MarketRecord {
        symbol: market.symbol.clone(),
        resolved_symbol: quote.resolved_symbol.clone(),
        display_name: market.display_name.clone(),
        country: market.country.clone(),
        currency_code: market.currency_code.clone(),
        price: quote.current_price,
        previous_close: quote.previous_close,
        change_pct: indicators.change_pct,
        volume: quote.volume,
        moving_average: indicators.moving_average,
        trend: indicators.trend,
        volatility_range_pct: indicators.volatility_range_pct,
        session_state: session.state,
        local_time: session.local_time,
        eur_price,
        provenance: quote.provenance,
        classification_label,
        fetched_at: quote.fetched_at,
    }
}

pub struct MarketEngine {
    catalog: Arc<MarketCatalog>,
    config: EngineConfig,
    resolver: Arc<TierResolver>,
    converter: CurrencyConverter,
    classifier: ClassificationTable,
}

impl MarketEngine {
    pub fn builder() -> MarketEngineBuilder {
        MarketEngineBuilder::new()
    }

    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One record per requested symbol, in request order.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownMarket`] when a symbol is not in the catalog. Nothing is
    /// fetched in that case.
    pub async fn get_records(
        &self,
        symbols: &[Symbol],
        options: RecordOptions,
    ) -> Result<Vec<MarketRecord>, ValidationError> {
        let markets = symbols
            .iter()
            .map(|symbol| self.catalog.require(symbol))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.collect_records(markets, options).await)
    }

    pub async fn get_all_records(&self, options: RecordOptions) -> Vec<MarketRecord> {
        self.collect_records(self.catalog.iter().collect(), options)
            .await
    }

    pub async fn get_region_records(
        &self,
        region: Region,
        options: RecordOptions,
    ) -> Vec<MarketRecord> {
        let markets = self
            .catalog
            .iter()
            .filter(|market| market.region == region)
            .collect();
        self.collect_records(markets, options).await
    }

    /// Session status for every catalog entry. No I/O.
    pub fn sessions(&self, now: UtcDateTime) -> Vec<(&MarketDefinition, SessionStatus)> {
        self.catalog
            .iter()
            .map(|market| (market, session::market_status(market, now)))
            .collect()
    }

    pub async fn eur_multiplier(&self, currency_code: &str) -> Option<f64> {
        self.converter.eur_multiplier(currency_code).await
    }

    /// Drops every cached tier outcome so the next pass refetches.
    pub async fn refresh(&self) {
        self.resolver.refresh().await;
    }

    pub fn summarize(&self, records: &[MarketRecord]) -> MarketSummary {
        summary::summarize(records)
    }

    async fn collect_records(
        &self,
        markets: Vec<&MarketDefinition>,
        options: RecordOptions,
    ) -> Vec<MarketRecord> {
        tracing::debug!(
            markets = markets.len(),
            workers = self.config.politeness.worker_pool_size,
            "resolving records"
        );

        stream::iter(markets)
            .map(|market| self.build_record(market, options))
            .buffered(self.config.politeness.worker_pool_size)
            .collect()
            .await
    }

    async fn build_record(
        &self,
        market: &MarketDefinition,
        options: RecordOptions,
    ) -> MarketRecord {
        let resolved = self.resolver.resolve(market).await;
        let quote = &resolved.quote;

        let indicators = indicators::compute(
            quote.current_price,
            quote.previous_close,
            Some(&resolved.history),
            &self.config.indicators,
        );
        let session = session::market_status(market, options.at.unwrap_or_else(UtcDateTime::now));

        let eur_price = if options.include_eur {
            self.converter
                .to_eur(quote.current_price, &market.currency_code)
                .await
        } else {
            None
        };

        let label = self
            .classifier
            .classify(indicators.change_pct, indicators.volatility_range_pct);

        assemble_record(market, quote, &indicators, session, eur_price, label)
    }
}

enum Transport {
    Reqwest,
    Offline,
    Custom(Arc<dyn HttpClient>),
}

/// Builder for [`MarketEngine`].
///
/// By default the engine talks to the live chart endpoint through reqwest, with the
/// politeness policy from the config wrapped around the transport.
///
/// # Example
///
/// ```rust,ignore
/// use marketmap_core::{EngineConfig, MarketEngine, RecordOptions};
///
/// let engine = MarketEngine::builder()
///     .with_config(EngineConfig::from_env()?)
///     .build()?;
/// let records = engine.get_all_records(RecordOptions::default().with_eur()).await;
/// ```
pub struct MarketEngineBuilder {
    catalog: Option<MarketCatalog>,
    config: EngineConfig,
    transport: Transport,
    clock: Arc<dyn Clock>,
    synthetic: Option<SyntheticGenerator>,
}

impl Default for MarketEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketEngineBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            config: EngineConfig::default(),
            transport: Transport::Reqwest,
            clock: Arc::new(SystemClock),
            synthetic: None,
        }
    }

    pub fn with_catalog(mut self, catalog: MarketCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Never touch the network; every market resolves to synthetic data.
    pub fn with_offline_mode(mut self) -> Self {
        self.transport = Transport::Offline;
        self
    }

    /// Custom transport, still wrapped in the politeness policy.
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.transport = Transport::Custom(client);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_synthetic_seed(mut self, seed: u64) -> Self {
        self.synthetic = Some(SyntheticGenerator::with_seed(seed));
        self
    }

    pub fn build(self) -> Result<MarketEngine, ValidationError> {
        self.config.validate()?;

        let config = self.config;
        let catalog = Arc::new(self.catalog.unwrap_or_default());

        let transport: Arc<dyn HttpClient> = match self.transport {
            Transport::Offline => Arc::new(OfflineHttpClient),
            Transport::Reqwest => Arc::new(ThrottledHttpClient::new(
                Arc::new(ReqwestHttpClient::new(&config.upstream.user_agent)),
                HostThrottle::from_policy(&config.politeness),
            )),
            Transport::Custom(client) => Arc::new(ThrottledHttpClient::new(
                client,
                HostThrottle::from_policy(&config.politeness),
            )),
        };
        let source: Arc<dyn MarketDataSource> =
            Arc::new(YahooChartSource::new(transport, config.upstream.clone()));

        let resolver = Arc::new(TierResolver::new(
            source,
            CacheStore::with_clock(self.clock),
            Arc::new(self.synthetic.unwrap_or_default()),
            &config,
        ));
        let converter = CurrencyConverter::new(resolver.clone(), config.fx.clone());
        let classifier = ClassificationTable::from_thresholds(&config.classification);

        tracing::debug!(markets = catalog.len(), "market engine ready");

        Ok(MarketEngine {
            catalog,
            config,
            resolver,
            converter,
            classifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Provenance, SessionState, Trend};

    fn offline_engine() -> MarketEngine {
        MarketEngine::builder()
            .with_offline_mode()
            .with_synthetic_seed(9)
            .build()
            .expect("default config is valid")
    }

    #[tokio::test]
    async fn unknown_symbol_is_rejected() {
        let engine = offline_engine();
        let symbols = vec![
            Symbol::parse("^GSPC").expect("valid"),
            Symbol::parse("^NOPE").expect("valid"),
        ];

        let err = engine
            .get_records(&symbols, RecordOptions::default())
            .await
            .expect_err("unknown market");

        assert!(matches!(err, ValidationError::UnknownMarket { .. }));
    }

    #[tokio::test]
    async fn records_keep_request_order() {
        let engine = offline_engine();
        let symbols: Vec<Symbol> = ["^N225", "^GSPC", "^FTSE"]
            .iter()
            .map(|s| Symbol::parse(s).expect("valid"))
            .collect();

        let records = engine
            .get_records(&symbols, RecordOptions::default())
            .await
            .expect("known markets");

        let got: Vec<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(got, vec!["^N225", "^GSPC", "^FTSE"]);
        assert!(records.iter().all(|r| r.provenance == Provenance::Simulated));
    }

    #[tokio::test]
    async fn offline_records_still_carry_indicators() {
        let engine = offline_engine();
        let records = engine.get_all_records(RecordOptions::default()).await;

        assert_eq!(records.len(), engine.catalog().len());
        for record in &records {
            assert!(record.change_pct.is_some());
            assert!(record.moving_average.is_some());
            assert_ne!(record.trend, Trend::Unavailable);
        }
    }

    #[tokio::test]
    async fn eur_records_price_euro_markets_at_par() {
        let engine = offline_engine();
        let dax = Symbol::parse("^GDAXI").expect("valid");
        let sp = Symbol::parse("^GSPC").expect("valid");

        let records = engine
            .get_records(&[dax, sp], RecordOptions::default().with_eur())
            .await
            .expect("known markets");

        assert_eq!(records[0].eur_price, Some(indicators::round2(records[0].price)));
        // No reference rate is configured, so an unreachable USD ticker yields no EUR price.
        assert_eq!(records[1].eur_price, None);
    }

    #[test]
    fn assemble_copies_every_part() {
        let catalog = MarketCatalog::world_indices();
        let market = catalog
            .get(&Symbol::parse("^FTSE").expect("valid"))
            .expect("bundled");
        let quote = SyntheticGenerator::with_seed(1).quote(market, UtcDateTime::now());
        let indicators = indicators::compute(
            quote.current_price,
            quote.previous_close,
            None,
            &Default::default(),
        );
        let status = SessionStatus {
            state: SessionState::PreMarket,
            local_time: String::from("07:15"),
            next_transition_hint: String::from("opens at 08:00"),
        };

        let record = assemble_record(
            market,
            &quote,
            &indicators,
            status,
            Some(1.0),
            WeatherLabel::Sunny,
        );

        assert_eq!(record.symbol, market.symbol);
        assert_eq!(record.currency_code, "GBP");
        assert_eq!(record.session_state, SessionState::PreMarket);
        assert_eq!(record.local_time, "07:15");
        assert_eq!(record.eur_price, Some(1.0));
        assert_eq!(record.provenance, Provenance::Simulated);
        assert_eq!(record.classification_label, WeatherLabel::Sunny);
    }
}
