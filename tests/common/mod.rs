//! Common test utilities and fixtures
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::mock;
use polymarket_hedge_agent::common::errors::{AgentError, Result};
use polymarket_hedge_agent::common::traits::{MarketDataSource, OrderExecutor};
use polymarket_hedge_agent::common::types::{MarketPrices, OrderRequest, OutcomeSide};
use polymarket_hedge_agent::position::{MemoryStore, Position};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const CONDITION_ID: &str = "0xABCDEF0123456789";
pub const YES_TOKEN: &str = "yes-token-111";
pub const NO_TOKEN: &str = "no-token-222";

mock! {
    pub Executor {}

    #[async_trait]
    impl OrderExecutor for Executor {
        async fn place_order(&self, order: &OrderRequest) -> Result<String>;
    }
}

/// Empty position backed by memory
pub fn empty_position() -> Position {
    Position::new(Arc::new(MemoryStore::new()))
}

/// 1250 YES bought at 0.80, i.e. $1000 invested
pub async fn entered_position() -> Position {
    let mut position = empty_position();
    position
        .open_position(dec!(1250), dec!(0.80), OutcomeSide::Yes, Some(dec!(0.80)), false)
        .await
        .expect("entry trade");
    position
}

/// YES/NO quote where NO is the complement of YES
pub fn quote(yes: Decimal) -> MarketPrices {
    MarketPrices::new(yes, Decimal::ONE - yes).expect("valid quote")
}

/// Market data source replaying a fixed script of quotes
///
/// `None` entries fail with a transient error. The last entry repeats once
/// the script runs out.
pub struct ScriptedMarket {
    script: Mutex<VecDeque<Option<MarketPrices>>>,
    last: Mutex<Option<MarketPrices>>,
    calls: AtomicUsize,
}

impl ScriptedMarket {
    pub fn new(script: Vec<Option<MarketPrices>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for ScriptedMarket {
    async fn fetch_current_prices(&self, market_id: &str) -> Result<MarketPrices> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let entry = match next {
            Some(entry) => {
                *self.last.lock().unwrap() = entry;
                entry
            }
            None => *self.last.lock().unwrap(),
        };
        entry.ok_or_else(|| AgentError::InvalidResponse(format!("no quote for {}", market_id)))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sample API responses for testing
pub mod api_responses {
    /// Gamma market list with `outcomePrices` as a stringified array
    pub const GAMMA_MARKETS_STRINGIFIED: &str = r#"[
        {
            "id": "512345",
            "question": "Will the Bills win the Super Bowl?",
            "conditionId": "0xabcdef0123456789",
            "slug": "bills-super-bowl",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.86\", \"0.14\"]",
            "clobTokenIds": "[\"yes-token-111\", \"no-token-222\"]",
            "active": true,
            "closed": false
        }
    ]"#;

    /// Gamma market list with `outcomePrices` as a plain array of numbers
    pub const GAMMA_MARKETS_ARRAY: &str = r#"[
        {
            "id": "512345",
            "question": "Will the Bills win the Super Bowl?",
            "conditionId": "0xabcdef0123456789",
            "outcomePrices": [0.8, 0.2],
            "active": true
        }
    ]"#;

    /// Quote whose sides sum to 1.2
    pub const GAMMA_MARKETS_BAD_SUM: &str = r#"[
        {
            "conditionId": "0xabcdef0123456789",
            "outcomePrices": "[\"0.70\", \"0.50\"]"
        }
    ]"#;

    pub const ORDER_ACCEPTED: &str = r#"{
        "success": true,
        "errorMsg": "",
        "orderID": "0xorder123",
        "status": "matched"
    }"#;

    pub const ORDER_REJECTED: &str = r#"{
        "success": false,
        "errorMsg": "not enough balance / allowance"
    }"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_is_complementary() {
        let q = quote(dec!(0.86));
        assert_eq!(q.no_price, dec!(0.14));
    }

    #[tokio::test]
    async fn test_scripted_market_repeats_last() {
        let market = ScriptedMarket::new(vec![Some(quote(dec!(0.8))), None]);
        assert!(market.fetch_current_prices("m").await.is_ok());
        assert!(market.fetch_current_prices("m").await.is_err());
        assert!(market.fetch_current_prices("m").await.is_err());
        assert_eq!(market.calls(), 3);
    }
}
