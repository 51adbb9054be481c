//! # Domain Models
//!
//! Canonical domain types for marketmap.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MarketDefinition`] | Immutable catalog entry for one market |
//! | [`QuoteSnapshot`] | Latest quote plus the tier that produced it |
//! | [`PriceSeries`] | Daily closes, oldest first |
//! | [`DerivedIndicators`] | Change, moving average, trend, volatility range |
//! | [`SessionStatus`] | Trading-session state in the market's local time |
//! | [`MarketRecord`] | The engine's output unit |
//! | [`Symbol`] | Validated upstream ticker |
//! | [`UtcDateTime`] | UTC timestamp |

mod market;
mod models;
mod symbol;
mod timestamp;

pub use market::{Coordinates, MarketDefinition, Region};
pub use models::{
    validate_currency_code, DerivedIndicators, MarketRecord, PriceSeries, Provenance,
    QuoteSnapshot, SessionState, SessionStatus, Trend,
};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
