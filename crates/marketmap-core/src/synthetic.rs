//! Terminal fetch tier.
//!
//! Fabricates plausible data from a market's base price and volatility. It never fails, which
//! is what guarantees every catalog entry yields a record. Everything it returns is tagged
//! [`Provenance::Simulated`].

use std::sync::Mutex;

use crate::domain::{MarketDefinition, PriceSeries, Provenance, QuoteSnapshot};
use crate::{Symbol, UtcDateTime};

#[derive(Debug)]
pub struct SyntheticGenerator {
    rng: Mutex<fastrand::Rng>,
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Reproducible generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    /// Quote with `previous_close = base` and a current price within `base ± volatility%`.
    pub fn quote(&self, market: &MarketDefinition, now: UtcDateTime) -> QuoteSnapshot {
        let base = market.synthetic_base_price;
        let current = self.jitter(base, market.synthetic_volatility_pct);
        let volume = self.with_rng(|rng| rng.u64(100_000..5_000_000));

        QuoteSnapshot {
            resolved_symbol: market.symbol.clone(),
            current_price: current,
            previous_close: base,
            volume,
            fetched_at: now,
            provenance: Provenance::Simulated,
        }
    }

    /// `len` daily closes scattered within `anchor ± volatility%`, ending exactly at `anchor`.
    pub fn series(
        &self,
        symbol: &Symbol,
        anchor: f64,
        volatility_pct: f64,
        len: usize,
    ) -> PriceSeries {
        let mut closes = Vec::with_capacity(len);
        for _ in 1..len {
            closes.push(self.jitter(anchor, volatility_pct));
        }
        if len > 0 {
            closes.push(anchor);
        }

        PriceSeries::new(symbol.clone(), Provenance::Simulated, closes)
    }

    /// FX quote held flat at the reference rate.
    pub fn fx_quote(
        &self,
        symbol: &Symbol,
        reference_rate: f64,
        now: UtcDateTime,
    ) -> QuoteSnapshot {
        QuoteSnapshot {
            resolved_symbol: symbol.clone(),
            current_price: reference_rate,
            previous_close: reference_rate,
            volume: 0,
            fetched_at: now,
            provenance: Provenance::Simulated,
        }
    }

    fn jitter(&self, base: f64, volatility_pct: f64) -> f64 {
        let unit = self.with_rng(|rng| rng.f64() * 2.0 - 1.0);
        (base * (1.0 + unit * volatility_pct / 100.0)).max(0.0)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut fastrand::Rng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .expect("synthetic rng lock should not be poisoned");
        f(&mut rng)
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}
