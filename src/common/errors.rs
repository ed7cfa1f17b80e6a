//! Error types for the application

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::OutcomeSide;

/// Result type alias using our AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

/// Main error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Market not found
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    /// Prices out of range or not summing to roughly one
    #[error("Invalid market data: YES={yes_price}, NO={no_price}")]
    InvalidMarketData {
        yes_price: Decimal,
        no_price: Decimal,
    },

    /// A sell larger than the held balance
    #[error("Cannot sell {requested} {side} shares, only have {available}")]
    InsufficientShares {
        side: OutcomeSide,
        requested: Decimal,
        available: Decimal,
    },

    /// Caller broke a numeric contract (zero price, negative size, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation needs an open position
    #[error("No position: {0}")]
    NoPosition(String),

    /// Order placement, signing or broadcast failure
    #[error("Execution error: {0}")]
    Execution(String),

    /// Advisory layer failure (never fatal)
    #[error("Advisory error: {0}")]
    Advisory(String),

    /// Position state could not be stored or restored
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Errors worth retrying when fetching market data
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentError::HttpRequest(_)
                | AgentError::InvalidResponse(_)
                | AgentError::InvalidMarketData { .. }
                | AgentError::MarketNotFound(_)
                | AgentError::JsonParse(_)
        )
    }
}
