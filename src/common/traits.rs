//! Trait definitions for the agent's external collaborators

use async_trait::async_trait;

use super::errors::Result;
use super::types::{MarketPrices, OrderRequest};
use crate::advisor::{Advice, AdvisoryContext};
use crate::position::PositionState;

/// Trait for market data sources (Polymarket Gamma, replay feeds, ...)
///
/// Implementations return a quote that already passed
/// [`MarketPrices::new`] validation.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the current YES/NO prices of a market
    ///
    /// # Arguments
    /// * `market_id` - The market condition ID
    async fn fetch_current_prices(&self, market_id: &str) -> Result<MarketPrices>;

    /// Get the name of the source
    fn source_name(&self) -> &'static str;
}

/// Trait for order placement on the exchange
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Place an order and return the exchange order id
    async fn place_order(&self, order: &OrderRequest) -> Result<String>;
}

/// Trait for the optional advisory layer
///
/// Advisors never fail: on any internal error they return the rule-based
/// action unchanged.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Confirm or override the rule-based action
    async fn advise(&self, ctx: &AdvisoryContext<'_>) -> Advice;

    /// Whether advice can differ from the rule action at all
    fn is_enabled(&self) -> bool;
}

/// Durable storage for the position ledger
pub trait PositionStore: Send + Sync {
    /// Load the last saved state, `None` if nothing was saved yet
    fn load(&self) -> Result<Option<PositionState>>;

    /// Persist the full state, including the trade history
    fn save(&self, state: &PositionState) -> Result<()>;
}
