use std::sync::Arc;

use serde::Deserialize;

use crate::config::UpstreamConfig;
use crate::data_source::{FetchError, FetchFuture, IntradayQuote, MarketDataSource};
use crate::http_client::{HttpClient, HttpRequest, OfflineHttpClient};
use crate::Symbol;

/// Yahoo Finance chart endpoint adapter.
///
/// One endpoint serves both operations: a short intraday range for the quote and a longer
/// daily range for the close history.
#[derive(Clone)]
pub struct YahooChartSource {
    http_client: Arc<dyn HttpClient>,
    upstream: UpstreamConfig,
}

impl Default for YahooChartSource {
    fn default() -> Self {
        Self::new(Arc::new(OfflineHttpClient), UpstreamConfig::default())
    }
}

impl YahooChartSource {
    pub fn new(http_client: Arc<dyn HttpClient>, upstream: UpstreamConfig) -> Self {
        Self {
            http_client,
            upstream,
        }
    }

    pub fn chart_url(&self, symbol: &Symbol, range: &str, interval: &str) -> String {
        format!(
            "{}/{}?range={}&interval={}",
            self.upstream.chart_base_url.trim_end_matches('/'),
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(range),
            urlencoding::encode(interval)
        )
    }

    async fn fetch_chart(
        &self,
        symbol: &Symbol,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, FetchError> {
        let request = HttpRequest::get(self.chart_url(symbol, range, interval))
            .with_header("user-agent", self.upstream.user_agent.as_str())
            .with_timeout_ms(self.upstream.timeout.as_millis().min(u128::from(u64::MAX)) as u64);

        let response = self.http_client.execute(request).await.map_err(|e| {
            if e.timed_out() {
                FetchError::network(format!("yahoo chart timeout for {symbol}: {}", e.message()))
            } else {
                FetchError::network(format!("yahoo transport error for {symbol}: {}", e.message()))
            }
        })?;

        if !response.is_success() {
            return Err(FetchError::network(format!(
                "yahoo chart returned status {} for {symbol}",
                response.status
            )));
        }

        parse_chart(&response.body)
    }
}

impl MarketDataSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo_chart"
    }

    fn intraday_quote<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a, IntradayQuote> {
        Box::pin(async move {
            let result = self
                .fetch_chart(
                    symbol,
                    &self.upstream.intraday_range,
                    &self.upstream.intraday_interval,
                )
                .await?;
            extract_intraday(&result)
        })
    }

    fn daily_closes<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a, Vec<f64>> {
        Box::pin(async move {
            let result = self
                .fetch_chart(
                    symbol,
                    &self.upstream.history_range,
                    &self.upstream.history_interval,
                )
                .await?;
            extract_closes(&result)
        })
    }
}

fn parse_chart(body: &str) -> Result<ChartResult, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::parse(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error.filter(|value| !value.is_null()) {
        return Err(FetchError::parse(format!("yahoo chart reported error: {error}")));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(FetchError::missing("chart.result"))
}

/// Current price, previous close and volume from a chart result.
///
/// Missing meta prices fall back to the last intraday closes: the newest close becomes the
/// current price and the one before it the previous close.
fn extract_intraday(result: &ChartResult) -> Result<IntradayQuote, FetchError> {
    let meta = &result.meta;
    let mut current = meta.regular_market_price;
    let mut previous = meta.previous_close.or(meta.chart_previous_close);

    if current.is_none() {
        let closes = valid_closes(result);
        if let Some(last) = closes.last().copied() {
            current = Some(last);
            previous = Some(if closes.len() > 1 {
                closes[closes.len() - 2]
            } else {
                last
            });
        }
    }

    let current_price = current.ok_or(FetchError::missing("regularMarketPrice"))?;
    let previous_close = previous
        .filter(|value| *value != 0.0)
        .ok_or(FetchError::missing("previousClose"))?;

    if !current_price.is_finite() || !previous_close.is_finite() {
        return Err(FetchError::parse("yahoo chart prices must be finite"));
    }

    let volume = meta
        .regular_market_volume
        .filter(|value| value.is_finite() && *value > 0.0)
        .map(|value| value as u64)
        .unwrap_or(0);

    Ok(IntradayQuote {
        current_price,
        previous_close,
        volume,
    })
}

fn extract_closes(result: &ChartResult) -> Result<Vec<f64>, FetchError> {
    let closes = valid_closes(result);
    if closes.is_empty() {
        return Err(FetchError::missing("indicators.quote.close"));
    }
    Ok(closes)
}

fn valid_closes(result: &ChartResult) -> Vec<f64> {
    result
        .indicators
        .quote
        .first()
        .map(|quote| {
            quote
                .close
                .iter()
                .filter_map(|close| close.filter(|value| value.is_finite()))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<f64>,
    #[serde(rename = "previousClose", default)]
    previous_close: Option<f64>,
    #[serde(rename = "chartPreviousClose", default)]
    chart_previous_close: Option<f64>,
    #[serde(rename = "regularMarketVolume", default)]
    regular_market_volume: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
