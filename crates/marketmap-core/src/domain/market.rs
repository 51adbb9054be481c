use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::models::{validate_currency_code, validate_non_negative, validate_positive};
use crate::{Symbol, ValidationError};

/// Geographic grouping used to select subsets of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    AsiaPacific,
    LatinAmerica,
}

impl Region {
    pub const ALL: [Self; 4] = [
        Self::NorthAmerica,
        Self::Europe,
        Self::AsiaPacific,
        Self::LatinAmerica,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NorthAmerica => "north_america",
            Self::Europe => "europe",
            Self::AsiaPacific => "asia_pacific",
            Self::LatinAmerica => "latin_america",
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|region| region.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidConfig {
                key: "region",
                reason: format!("unknown region '{value}'"),
            })
    }
}

/// Location of the exchange floor, for map consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Static description of one market in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDefinition {
    pub symbol: Symbol,
    #[serde(default)]
    pub fallback_symbol: Option<Symbol>,
    pub display_name: String,
    pub country: String,
    pub region: Region,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub currency_code: String,
    pub timezone_id: String,
    pub session_open_hour: u32,
    pub session_close_hour: u32,
    pub synthetic_base_price: f64,
    /// Half-width of the synthetic price band, in percent of the base price.
    pub synthetic_volatility_pct: f64,
}

impl MarketDefinition {
    /// Checks the invariants every catalog entry must hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_currency_code(&self.currency_code)?;
        validate_positive("synthetic_base_price", self.synthetic_base_price)?;
        validate_non_negative("synthetic_volatility_pct", self.synthetic_volatility_pct)?;

        if self.session_open_hour >= self.session_close_hour || self.session_close_hour > 24 {
            return Err(ValidationError::InvalidSessionHours {
                symbol: self.symbol.to_string(),
                open: self.session_open_hour,
                close: self.session_close_hour,
            });
        }

        Ok(())
    }

    /// Rewrites the currency code to its canonical uppercase form, then validates.
    pub fn normalize(&mut self) -> Result<(), ValidationError> {
        self.currency_code = validate_currency_code(&self.currency_code)?;
        self.validate()
    }

    /// Symbols to try against the upstream, primary first.
    pub fn upstream_symbols(&self) -> impl Iterator<Item = &Symbol> {
        std::iter::once(&self.symbol).chain(self.fallback_symbol.as_ref())
    }
}
