//! Immutable market catalog.
//!
//! The catalog is built once (from the bundled world indices or a JSON file), validated, and
//! then shared read-only with every component that needs market metadata.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{Coordinates, MarketDefinition, Region, Symbol};
use crate::{CoreError, ValidationError};

#[derive(Debug, Clone)]
pub struct MarketCatalog {
    markets: Vec<MarketDefinition>,
    index: HashMap<Symbol, usize>,
}

impl MarketCatalog {
    /// Builds a catalog, normalizing every definition and rejecting duplicate symbols.
    pub fn new(mut markets: Vec<MarketDefinition>) -> Result<Self, ValidationError> {
        if markets.is_empty() {
            return Err(ValidationError::EmptyCatalog);
        }

        let mut index = HashMap::with_capacity(markets.len());
        for (position, market) in markets.iter_mut().enumerate() {
            market.normalize()?;
            if index.insert(market.symbol.clone(), position).is_some() {
                return Err(ValidationError::DuplicateMarket {
                    symbol: market.symbol.to_string(),
                });
            }
        }

        Ok(Self { markets, index })
    }

    /// Parses a JSON array of market definitions.
    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        let markets: Vec<MarketDefinition> = serde_json::from_str(input)?;
        Ok(Self::new(markets)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let body = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&body)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&MarketDefinition> {
        self.index.get(symbol).map(|position| &self.markets[*position])
    }

    /// Looks up a market, failing with [`ValidationError::UnknownMarket`].
    pub fn require(&self, symbol: &Symbol) -> Result<&MarketDefinition, ValidationError> {
        self.get(symbol).ok_or_else(|| ValidationError::UnknownMarket {
            symbol: symbol.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarketDefinition> {
        self.markets.iter()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.markets.iter().map(|market| market.symbol.clone()).collect()
    }

    pub fn symbols_in_region(&self, region: Region) -> Vec<Symbol> {
        self.markets
            .iter()
            .filter(|market| market.region == region)
            .map(|market| market.symbol.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// The bundled catalog of world stock indices.
    pub fn world_indices() -> Self {
        let markets = WORLD_INDICES
            .iter()
            .map(CatalogEntry::to_definition)
            .collect::<Vec<_>>();
        Self::new(markets).expect("bundled catalog entries are valid")
    }
}

impl Default for MarketCatalog {
    fn default() -> Self {
        Self::world_indices()
    }
}

struct CatalogEntry {
    symbol: &'static str,
    fallback: Option<&'static str>,
    name: &'static str,
    country: &'static str,
    region: Region,
    currency: &'static str,
    timezone: &'static str,
    open: u32,
    close: u32,
    lat: f64,
    lon: f64,
    base_price: f64,
}

impl CatalogEntry {
    fn to_definition(&self) -> MarketDefinition {
        MarketDefinition {
            symbol: Symbol::parse(self.symbol).expect("catalog symbols are valid"),
            fallback_symbol: self
                .fallback
                .map(|raw| Symbol::parse(raw).expect("catalog symbols are valid")),
            display_name: self.name.to_owned(),
            country: self.country.to_owned(),
            region: self.region,
            coordinates: Some(Coordinates {
                lat: self.lat,
                lon: self.lon,
            }),
            currency_code: self.currency.to_owned(),
            timezone_id: self.timezone.to_owned(),
            session_open_hour: self.open,
            session_close_hour: self.close,
            synthetic_base_price: self.base_price,
            synthetic_volatility_pct: DEFAULT_SYNTHETIC_VOLATILITY_PCT,
        }
    }
}

const DEFAULT_SYNTHETIC_VOLATILITY_PCT: f64 = 1.5;

#[rustfmt::skip]
const WORLD_INDICES: [CatalogEntry; 13] = [
    CatalogEntry { symbol: "^GSPC", fallback: Some("SPY"), name: "S&P 500", country: "United States", region: Region::NorthAmerica, currency: "USD", timezone: "America/New_York", open: 9, close: 16, lat: 40.7069, lon: -74.0113, base_price: 5_960.0 },
    CatalogEntry { symbol: "^IXIC", fallback: None, name: "NASDAQ", country: "United States", region: Region::NorthAmerica, currency: "USD", timezone: "America/New_York", open: 9, close: 16, lat: 40.7549, lon: -73.9840, base_price: 19_500.0 },
    CatalogEntry { symbol: "^GSPTSE", fallback: None, name: "TSX", country: "Canada", region: Region::NorthAmerica, currency: "CAD", timezone: "America/Toronto", open: 9, close: 16, lat: 43.6487, lon: -79.3817, base_price: 25_000.0 },
    CatalogEntry { symbol: "^FTSE", fallback: None, name: "FTSE 100", country: "United Kingdom", region: Region::Europe, currency: "GBP", timezone: "Europe/London", open: 8, close: 16, lat: 51.5136, lon: -0.0890, base_price: 8_300.0 },
    CatalogEntry { symbol: "^GDAXI", fallback: None, name: "DAX", country: "Germany", region: Region::Europe, currency: "EUR", timezone: "Europe/Berlin", open: 9, close: 17, lat: 50.1109, lon: 8.6821, base_price: 20_000.0 },
    CatalogEntry { symbol: "^FCHI", fallback: None, name: "CAC 40", country: "France", region: Region::Europe, currency: "EUR", timezone: "Europe/Paris", open: 9, close: 17, lat: 48.8566, lon: 2.3522, base_price: 7_400.0 },
    CatalogEntry { symbol: "^IBEX", fallback: None, name: "IBEX 35", country: "Spain", region: Region::Europe, currency: "EUR", timezone: "Europe/Madrid", open: 9, close: 17, lat: 40.4168, lon: -3.7038, base_price: 11_700.0 },
    CatalogEntry { symbol: "^N225", fallback: None, name: "Nikkei 225", country: "Japan", region: Region::AsiaPacific, currency: "JPY", timezone: "Asia/Tokyo", open: 9, close: 15, lat: 35.6828, lon: 139.7595, base_price: 39_000.0 },
    CatalogEntry { symbol: "000001.SS", fallback: Some("MCHI"), name: "Shanghai Comp.", country: "China", region: Region::AsiaPacific, currency: "CNY", timezone: "Asia/Shanghai", open: 9, close: 15, lat: 31.2304, lon: 121.4737, base_price: 3_300.0 },
    CatalogEntry { symbol: "^HSI", fallback: None, name: "Hang Seng", country: "Hong Kong", region: Region::AsiaPacific, currency: "HKD", timezone: "Asia/Hong_Kong", open: 9, close: 16, lat: 22.3080, lon: 114.1716, base_price: 20_000.0 },
    CatalogEntry { symbol: "^AXJO", fallback: None, name: "ASX 200", country: "Australia", region: Region::AsiaPacific, currency: "AUD", timezone: "Australia/Sydney", open: 10, close: 16, lat: -33.8688, lon: 151.2093, base_price: 8_200.0 },
    CatalogEntry { symbol: "^BVSP", fallback: None, name: "Bovespa", country: "Brazil", region: Region::LatinAmerica, currency: "BRL", timezone: "America/Sao_Paulo", open: 10, close: 17, lat: -23.5505, lon: -46.6333, base_price: 125_000.0 },
    CatalogEntry { symbol: "^MXX", fallback: None, name: "IPC Mexico", country: "Mexico", region: Region::LatinAmerica, currency: "MXN", timezone: "America/Mexico_City", open: 8, close: 15, lat: 19.4326, lon: -99.1332, base_price: 50_000.0 },
];
