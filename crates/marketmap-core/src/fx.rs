use std::sync::Arc;

use crate::config::FxConfig;
use crate::resolver::TierResolver;

/// Local-currency to EUR conversion.
///
/// FX tickers quote EUR in the local currency, so the multiplier is the reciprocal of the quote.
pub struct CurrencyConverter {
    resolver: Arc<TierResolver>,
    fx: FxConfig,
}

impl CurrencyConverter {
    pub fn new(resolver: Arc<TierResolver>, fx: FxConfig) -> Self {
        Self { resolver, fx }
    }

    /// Multiplier turning a `currency_code` amount into EUR.
    ///
    /// EUR is exactly `1.0` without touching the network. `None` when the currency has no
    /// configured ticker or its quote is zero or unavailable.
    pub async fn eur_multiplier(&self, currency_code: &str) -> Option<f64> {
        let code = currency_code.trim().to_ascii_uppercase();
        if code == "EUR" {
            return Some(1.0);
        }

        let Some(ticker) = self.fx.ticker_for(&code) else {
            tracing::debug!(currency = %code, "no fx ticker configured");
            return None;
        };

        let quote = self.resolver.resolve_fx_quote(ticker).await?;
        multiplier_from_quote(quote.current_price)
    }

    /// `amount` in EUR, rounded to two decimals.
    pub async fn to_eur(&self, amount: f64, currency_code: &str) -> Option<f64> {
        let multiplier = self.eur_multiplier(currency_code).await?;
        Some(crate::indicators::round2(amount * multiplier))
    }
}

fn multiplier_from_quote(rate: f64) -> Option<f64> {
    if rate == 0.0 || !rate.is_finite() {
        return None;
    }
    Some(1.0 / rate)
}
