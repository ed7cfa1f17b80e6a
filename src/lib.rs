//! Polymarket Hedge Agent Library
//!
//! Watches one binary Polymarket market, holds a YES position and books
//! profit into NO (or cuts the loss) when the implied probability crosses
//! the configured thresholds.

pub mod advisor;
pub mod agent;
pub mod common;
pub mod config;
pub mod polymarket;
pub mod position;
pub mod strategy;

// Re-export commonly used types
pub use advisor::{build_advisor, Advice, DisabledAdvisor};
pub use agent::{AgentSettings, HedgeAgent, PollOutcome};
pub use common::errors::{AgentError, Result};
pub use common::retry::{retry_with_backoff, RetryPolicy};
pub use common::traits::{Advisor, MarketDataSource, OrderExecutor, PositionStore};
pub use common::types::{MarketPrices, OrderRequest, OutcomeSide, OutcomeTokens, Trade, TradeType};
pub use config::types::AppConfig;
pub use polymarket::client::PolymarketClient;
pub use polymarket::rest::PolymarketRestClient;
pub use position::{JsonFileStore, MemoryStore, Position, PositionState, PositionSummary};

// Strategy types
pub use strategy::{
    Action, ActionKind, ExecutionResult, ExitResult, HedgeResult, HedgingStrategy, PnlCalculator,
};
