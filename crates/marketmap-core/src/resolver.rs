//! Fetch tier resolver.
//!
//! Tiers are tried in strict order and the first success wins:
//!
//! 1. the market's primary symbol,
//! 2. its fallback symbol, when configured,
//! 3. the synthetic generator, which cannot fail.
//!
//! Each upstream tier is cached under its own key, successes for the per-kind TTL and
//! failures for the shorter failure TTL, so a failing primary is not retried on every call
//! while it keeps failing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, CacheStore};
use crate::config::{CacheTtls, EngineConfig, FxTicker, UpstreamConfig};
use crate::data_source::{FetchError, IntradayQuote, MarketDataSource};
use crate::domain::{MarketDefinition, PriceSeries, Provenance, QuoteSnapshot};
use crate::synthetic::SyntheticGenerator;
use crate::{Symbol, UtcDateTime};

/// Cached payload. Tier outcomes are stored before provenance is attached, since one symbol
/// can be primary for one market and fallback for another.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Quote {
        quote: IntradayQuote,
        fetched_at: UtcDateTime,
    },
    Closes(Arc<Vec<f64>>),
    Synthetic(QuoteSnapshot),
    Failed(FetchError),
}

/// Quote and close history for one market.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMarket {
    pub quote: QuoteSnapshot,
    pub history: PriceSeries,
}

pub struct TierResolver {
    source: Arc<dyn MarketDataSource>,
    cache: CacheStore<CachedValue>,
    synthetic: Arc<SyntheticGenerator>,
    ttl: CacheTtls,
    quote_params: String,
    history_params: String,
    synthetic_history_len: usize,
}

impl TierResolver {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        cache: CacheStore<CachedValue>,
        synthetic: Arc<SyntheticGenerator>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            source,
            cache,
            synthetic,
            ttl: config.ttl,
            quote_params: request_params(&config.upstream, RequestKind::Intraday),
            history_params: request_params(&config.upstream, RequestKind::History),
            synthetic_history_len: config.indicators.synthetic_history_len,
        }
    }

    pub fn cache(&self) -> &CacheStore<CachedValue> {
        &self.cache
    }

    /// Latest quote for `market`. Never fails.
    pub async fn resolve_quote(&self, market: &MarketDefinition) -> QuoteSnapshot {
        for (symbol, provenance) in upstream_tiers(market) {
            let outcome = self
                .fetch_quote(symbol, "quote", self.ttl.quote)
                .await
                .and_then(|payload| snapshot(symbol, payload, provenance));

            match outcome {
                Ok(quote) => return quote,
                Err(e) => tracing::warn!(
                    market = %market.symbol,
                    symbol = %symbol,
                    tier = provenance.as_str(),
                    code = e.code(),
                    error = %e,
                    "quote tier failed"
                ),
            }
        }

        self.synthetic_quote(market).await
    }

    /// Quote plus history. History is fetched only for the symbol the quote resolved to. A
    /// simulated quote gets synthetic closes ending at its price; a real quote whose history
    /// fails gets an empty series so its indicators read as unavailable.
    pub async fn resolve(&self, market: &MarketDefinition) -> ResolvedMarket {
        let quote = self.resolve_quote(market).await;
        let history = self.history_for(market, &quote).await;

        ResolvedMarket { quote, history }
    }

    /// EUR-to-local FX quote. Only the primary tier is tried; the synthetic tier answers only
    /// when the ticker carries a reference rate.
    pub async fn resolve_fx_quote(&self, ticker: &FxTicker) -> Option<QuoteSnapshot> {
        let outcome = self
            .fetch_quote(&ticker.symbol, "fx", self.ttl.fx)
            .await
            .and_then(|payload| snapshot(&ticker.symbol, payload, Provenance::RealPrimary));

        match outcome {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!(
                    symbol = %ticker.symbol,
                    code = e.code(),
                    error = %e,
                    "fx tier failed"
                );
                ticker
                    .reference_rate
                    .map(|rate| self.synthetic.fx_quote(&ticker.symbol, rate, UtcDateTime::now()))
            }
        }
    }

    /// Clears every cached tier outcome.
    pub async fn refresh(&self) {
        self.cache.invalidate_all().await;
        tracing::info!("cache invalidated");
    }

    async fn history_for(&self, market: &MarketDefinition, quote: &QuoteSnapshot) -> PriceSeries {
        if quote.provenance == Provenance::Simulated {
            tracing::debug!(
                market = %market.symbol,
                anchor = quote.current_price,
                "serving synthetic history"
            );
            return self.synthetic.series(
                &market.symbol,
                quote.current_price,
                market.synthetic_volatility_pct,
                self.synthetic_history_len,
            );
        }

        let symbol = &quote.resolved_symbol;
        match self.fetch_closes(symbol).await {
            Ok(closes) => {
                PriceSeries::new(symbol.clone(), quote.provenance, closes.as_ref().clone())
            }
            Err(e) => {
                tracing::warn!(
                    market = %market.symbol,
                    symbol = %symbol,
                    tier = quote.provenance.as_str(),
                    code = e.code(),
                    error = %e,
                    "history unavailable"
                );
                PriceSeries::new(symbol.clone(), quote.provenance, Vec::new())
            }
        }
    }

    async fn synthetic_quote(&self, market: &MarketDefinition) -> QuoteSnapshot {
        let key = CacheKey::new("quote", market.symbol.as_str(), "synthetic");
        if let Some(CachedValue::Synthetic(quote)) = self.cache.get(&key).await {
            return quote;
        }

        tracing::info!(
            market = %market.symbol,
            "all upstream tiers failed, serving synthetic quote"
        );
        let quote = self.synthetic.quote(market, UtcDateTime::now());
        self.cache
            .put(key, CachedValue::Synthetic(quote.clone()), self.ttl.quote)
            .await;
        quote
    }

    async fn fetch_quote(
        &self,
        symbol: &Symbol,
        operation: &'static str,
        ttl: Duration,
    ) -> Result<QuotePayload, FetchError> {
        let key = CacheKey::new(operation, symbol.as_str(), self.quote_params.as_str());
        self.cached_tier(
            key,
            ttl,
            |value| match value {
                CachedValue::Quote { quote, fetched_at } => {
                    Some(QuotePayload { quote, fetched_at })
                }
                _ => None,
            },
            |payload| CachedValue::Quote {
                quote: payload.quote,
                fetched_at: payload.fetched_at,
            },
            async {
                self.source
                    .intraday_quote(symbol)
                    .await
                    .map(|quote| QuotePayload {
                        quote,
                        fetched_at: UtcDateTime::now(),
                    })
            },
        )
        .await
    }

    async fn fetch_closes(&self, symbol: &Symbol) -> Result<Arc<Vec<f64>>, FetchError> {
        let key = CacheKey::new("history", symbol.as_str(), self.history_params.as_str());
        self.cached_tier(
            key,
            self.ttl.history,
            |value| match value {
                CachedValue::Closes(closes) => Some(closes),
                _ => None,
            },
            CachedValue::Closes,
            async { self.source.daily_closes(symbol).await.map(Arc::new) },
        )
        .await
    }

    async fn cached_tier<T, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        from_cache: impl FnOnce(CachedValue) -> Option<T>,
        into_cache: impl FnOnce(T) -> CachedValue,
        fetch: Fut,
    ) -> Result<T, FetchError>
    where
        T: Clone,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        match self.cache.get(&key).await {
            Some(CachedValue::Failed(e)) => {
                tracing::debug!(key = %key, "cached tier failure");
                return Err(e);
            }
            Some(value) => {
                if let Some(hit) = from_cache(value) {
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(hit);
                }
            }
            None => {}
        }

        tracing::debug!(key = %key, source = self.source.name(), "cache miss");
        match fetch.await {
            Ok(value) => {
                self.cache.put(key, into_cache(value.clone()), ttl).await;
                Ok(value)
            }
            Err(e) => {
                self.cache
                    .put(key, CachedValue::Failed(e.clone()), self.ttl.failure)
                    .await;
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QuotePayload {
    quote: IntradayQuote,
    fetched_at: UtcDateTime,
}

#[derive(Debug, Clone, Copy)]
enum RequestKind {
    Intraday,
    History,
}

fn request_params(upstream: &UpstreamConfig, kind: RequestKind) -> String {
    match kind {
        RequestKind::Intraday => format!(
            "range={}&interval={}",
            upstream.intraday_range, upstream.intraday_interval
        ),
        RequestKind::History => format!(
            "range={}&interval={}",
            upstream.history_range, upstream.history_interval
        ),
    }
}

fn upstream_tiers(market: &MarketDefinition) -> impl Iterator<Item = (&Symbol, Provenance)> {
    market
        .upstream_symbols()
        .zip([Provenance::RealPrimary, Provenance::RealFallback])
}

fn snapshot(
    symbol: &Symbol,
    payload: QuotePayload,
    provenance: Provenance,
) -> Result<QuoteSnapshot, FetchError> {
    QuoteSnapshot::new(
        symbol.clone(),
        payload.quote.current_price,
        payload.quote.previous_close,
        payload.quote.volume,
        payload.fetched_at,
        provenance,
    )
    .map_err(|e| FetchError::parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::catalog::MarketCatalog;
    use crate::data_source::FetchFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source answering from fixed per-symbol tables; unknown symbols fail.
    #[derive(Default)]
    struct TableSource {
        quotes: HashMap<String, IntradayQuote>,
        closes: HashMap<String, Vec<f64>>,
        calls: AtomicUsize,
    }

    impl TableSource {
        fn with_quote(mut self, symbol: &str, current: f64, previous: f64) -> Self {
            self.quotes.insert(
                symbol.to_owned(),
                IntradayQuote {
                    current_price: current,
                    previous_close: previous,
                    volume: 1_000,
                },
            );
            self
        }

        fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
            self.closes.insert(symbol.to_owned(), closes);
            self
        }
    }

    impl MarketDataSource for TableSource {
        fn name(&self) -> &'static str {
            "table"
        }

        fn intraday_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a, IntradayQuote> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.quotes
                    .get(symbol.as_str())
                    .copied()
                    .ok_or_else(|| FetchError::network("connection refused"))
            })
        }

        fn daily_closes<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a, Vec<f64>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.closes
                    .get(symbol.as_str())
                    .cloned()
                    .ok_or(FetchError::missing("indicators.quote.close"))
            })
        }
    }

    fn market(symbol: &str) -> MarketDefinition {
        MarketCatalog::world_indices()
            .get(&Symbol::parse(symbol).expect("valid"))
            .cloned()
            .expect("bundled market")
    }

    fn resolver(source: Arc<TableSource>, clock: Arc<ManualClock>) -> TierResolver {
        TierResolver::new(
            source,
            CacheStore::with_clock(clock),
            Arc::new(SyntheticGenerator::with_seed(3)),
            &EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn primary_success_is_tagged_real_primary() {
        let source = Arc::new(
            TableSource::default()
                .with_quote("^GSPC", 5975.0, 5960.0)
                .with_closes("^GSPC", vec![5900.0, 5960.0]),
        );
        let resolver = resolver(source, Arc::new(ManualClock::new()));

        let resolved = resolver.resolve(&market("^GSPC")).await;

        assert_eq!(resolved.quote.provenance, Provenance::RealPrimary);
        assert_eq!(resolved.quote.current_price, 5975.0);
        assert_eq!(resolved.history.provenance, Provenance::RealPrimary);
        assert_eq!(resolved.history.closes, vec![5900.0, 5960.0]);
    }

    #[tokio::test]
    async fn history_follows_the_fallback_quote_symbol() {
        let source = Arc::new(
            TableSource::default()
                .with_quote("SPY", 600.0, 598.0)
                .with_closes("^GSPC", vec![1.0, 2.0])
                .with_closes("SPY", vec![590.0, 598.0]),
        );
        let resolver = resolver(source, Arc::new(ManualClock::new()));

        let resolved = resolver.resolve(&market("^GSPC")).await;

        assert_eq!(resolved.quote.provenance, Provenance::RealFallback);
        assert_eq!(resolved.quote.resolved_symbol.as_str(), "SPY");
        assert_eq!(resolved.history.provenance, Provenance::RealFallback);
        assert_eq!(resolved.history.closes, vec![590.0, 598.0]);
    }

    #[tokio::test]
    async fn failed_history_never_borrows_another_symbol() {
        let source = Arc::new(
            TableSource::default()
                .with_quote("^GSPC", 5975.0, 5960.0)
                .with_closes("SPY", vec![590.0, 598.0]),
        );
        let resolver = resolver(source.clone(), Arc::new(ManualClock::new()));

        let resolved = resolver.resolve(&market("^GSPC")).await;

        assert_eq!(resolved.quote.provenance, Provenance::RealPrimary);
        assert_eq!(resolved.history.resolved_symbol.as_str(), "^GSPC");
        assert_eq!(resolved.history.provenance, Provenance::RealPrimary);
        assert!(resolved.history.closes.is_empty());
        // One quote and one history call, both for ^GSPC.
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn simulated_quote_gets_simulated_history() {
        let source = Arc::new(TableSource::default().with_closes("^FTSE", vec![1.0, 2.0]));
        let resolver = resolver(source.clone(), Arc::new(ManualClock::new()));
        let ftse = market("^FTSE");

        let resolved = resolver.resolve(&ftse).await;

        assert_eq!(resolved.quote.provenance, Provenance::Simulated);
        assert_eq!(resolved.history.provenance, Provenance::Simulated);
        assert_eq!(
            resolved.history.closes.last().copied(),
            Some(resolved.quote.current_price)
        );
        // Only the primary quote was attempted; ^FTSE has no fallback.
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_tier_is_cached_for_failure_ttl() {
        let source = Arc::new(TableSource::default());
        let clock = Arc::new(ManualClock::new());
        let resolver = resolver(source.clone(), clock.clone());
        let ftse = market("^FTSE");

        resolver.resolve_quote(&ftse).await;
        resolver.resolve_quote(&ftse).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(30));
        resolver.resolve_quote(&ftse).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn synthetic_quote_is_stable_within_ttl() {
        let resolver = resolver(Arc::new(TableSource::default()), Arc::new(ManualClock::new()));
        let ftse = market("^FTSE");

        let first = resolver.resolve_quote(&ftse).await;
        let second = resolver.resolve_quote(&ftse).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn zero_previous_close_fails_the_tier() {
        let source = Arc::new(TableSource::default().with_quote("^FTSE", 8200.0, 0.0));
        let resolver = resolver(source, Arc::new(ManualClock::new()));

        let quote = resolver.resolve_quote(&market("^FTSE")).await;

        assert_eq!(quote.provenance, Provenance::Simulated);
    }

    #[tokio::test]
    async fn fx_without_reference_rate_is_unavailable() {
        let resolver = resolver(Arc::new(TableSource::default()), Arc::new(ManualClock::new()));
        let ticker = FxTicker {
            symbol: Symbol::parse("EURUSD=X").expect("valid"),
            reference_rate: None,
        };

        assert!(resolver.resolve_fx_quote(&ticker).await.is_none());

        let with_reference = FxTicker {
            reference_rate: Some(1.08),
            ..ticker
        };
        let quote = resolver
            .resolve_fx_quote(&with_reference)
            .await
            .expect("reference rate applies");
        assert_eq!(quote.provenance, Provenance::Simulated);
        assert_eq!(quote.current_price, 1.08);
    }

    #[tokio::test]
    async fn refresh_forces_refetch() {
        let source = Arc::new(TableSource::default().with_quote("^FTSE", 8200.0, 8150.0));
        let resolver = resolver(source.clone(), Arc::new(ManualClock::new()));
        let ftse = market("^FTSE");

        resolver.resolve_quote(&ftse).await;
        resolver.resolve_quote(&ftse).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        resolver.refresh().await;
        resolver.resolve_quote(&ftse).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
