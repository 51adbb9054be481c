use thiserror::Error;

/// Validation and contract errors exposed by `marketmap-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("session hours for '{symbol}' must satisfy open < close <= 24, got {open}..{close}")]
    InvalidSessionHours { symbol: String, open: u32, close: u32 },
    #[error("market '{symbol}' is defined more than once in the catalog")]
    DuplicateMarket { symbol: String },
    #[error("market '{symbol}' is not in the catalog")]
    UnknownMarket { symbol: String },
    #[error("catalog must contain at least one market")]
    EmptyCatalog,

    #[error("config value '{key}' is invalid: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
