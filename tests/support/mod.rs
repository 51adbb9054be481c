//! Shared fixtures for behaviour tests: a scripted transport that counts calls per URL and a
//! helper for building chart payloads.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use marketmap_core::http_client::HttpFuture;
use marketmap_core::{
    EngineConfig, HttpClient, HttpError, HttpRequest, HttpResponse, ManualClock, MarketEngine,
};

#[derive(Debug, Clone)]
enum Reply {
    Body(u16, String),
    Fail(String),
}

/// Transport that answers by URL substring, first matching rule wins. Unmatched URLs fail
/// like a refused connection.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    rules: Mutex<Vec<(String, Reply)>>,
    requests: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, url_fragment: impl Into<String>, body: impl Into<String>) {
        self.push(url_fragment.into(), Reply::Body(200, body.into()));
    }

    pub fn reply_status(
        &self,
        url_fragment: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) {
        self.push(url_fragment.into(), Reply::Body(status, body.into()));
    }

    pub fn fail(&self, url_fragment: impl Into<String>) {
        self.push(url_fragment.into(), Reply::Fail(String::from("connection refused")));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_matching(&self, url_fragment: &str) -> usize {
        self.requests
            .lock()
            .expect("request log lock")
            .iter()
            .filter(|url| url.contains(url_fragment))
            .count()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }

    fn push(&self, fragment: String, reply: Reply) {
        self.rules.lock().expect("rules lock").push((fragment, reply));
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("request log lock")
                .push(request.url.clone());

            let reply = self
                .rules
                .lock()
                .expect("rules lock")
                .iter()
                .find(|(fragment, _)| request.url.contains(fragment.as_str()))
                .map(|(_, reply)| reply.clone());

            match reply {
                Some(Reply::Body(status, body)) => Ok(HttpResponse::with_status(status, body)),
                Some(Reply::Fail(message)) => Err(HttpError::new(message)),
                None => Err(HttpError::new(format!("no route to {}", request.url))),
            }
        })
    }
}

/// URL fragment of an intraday quote request for `symbol`.
pub fn quote_path(symbol: &str) -> String {
    format!("/{}?range=1d&interval=1m", urlencoding::encode(symbol))
}

/// URL fragment of a daily history request for `symbol`.
pub fn history_path(symbol: &str) -> String {
    format!("/{}?range=6mo&interval=1d", urlencoding::encode(symbol))
}

/// Chart payload with the given meta prices and close series.
pub fn chart_json(price: Option<f64>, previous_close: Option<f64>, closes: &[f64]) -> String {
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": price,
                    "previousClose": previous_close,
                    "regularMarketVolume": 1_250_000
                },
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    })
    .to_string()
}

/// Ascending closes `start, start + step, ...`.
pub fn ramp(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}

/// Default config without request spacing, so tests do not sleep.
pub fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.politeness.min_request_interval = Duration::ZERO;
    config
}

pub fn engine_with(client: Arc<ScriptedHttpClient>, clock: Arc<ManualClock>) -> MarketEngine {
    engine_with_config(client, clock, fast_config())
}

pub fn engine_with_config(
    client: Arc<ScriptedHttpClient>,
    clock: Arc<ManualClock>,
    config: EngineConfig,
) -> MarketEngine {
    MarketEngine::builder()
        .with_config(config)
        .with_http_client(client)
        .with_clock(clock)
        .with_synthetic_seed(2024)
        .build()
        .expect("test engine config is valid")
}
