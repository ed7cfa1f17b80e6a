//! Unified types used across the ledger, strategy and platform clients

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::errors::{AgentError, Result};

/// Share counts on CLOB orders carry at most this many decimals
pub const ORDER_SIZE_DP: u32 = 2;

/// Maximum distance of YES + NO from 1.0 before a quote is rejected
pub const MAX_PRICE_SUM_DEVIATION: Decimal = dec!(0.05);

/// Outcome token of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeSide {
    Yes,
    No,
}

impl std::fmt::Display for OutcomeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeSide::Yes => write!(f, "YES"),
            OutcomeSide::No => write!(f, "NO"),
        }
    }
}

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Buy => write!(f, "BUY"),
            TradeType::Sell => write!(f, "SELL"),
        }
    }
}

/// A single executed (or simulated) trade in the position's audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// When the ledger recorded the trade
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Outcome token traded
    pub side: OutcomeSide,
    /// Number of shares, always positive
    pub shares: Decimal,
    /// Price per share (0.00 to 1.00)
    pub price: Decimal,
    /// Buy or sell
    pub trade_type: TradeType,
    /// shares × price
    pub usdc_amount: Decimal,
}

impl Trade {
    /// Record a trade stamped with the current time
    pub fn now(side: OutcomeSide, shares: Decimal, price: Decimal, trade_type: TradeType) -> Self {
        Self {
            timestamp: Utc::now(),
            side,
            shares,
            price,
            trade_type,
            usdc_amount: shares * price,
        }
    }
}

/// A validated YES/NO quote for one market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPrices {
    pub yes_price: Decimal,
    pub no_price: Decimal,
}

impl MarketPrices {
    /// Validate a quote: both prices in [0, 1] and |yes + no - 1| <= 0.05
    pub fn new(yes_price: Decimal, no_price: Decimal) -> Result<Self> {
        let in_range = |p: Decimal| p >= Decimal::ZERO && p <= Decimal::ONE;
        let sum_ok = (yes_price + no_price - Decimal::ONE).abs() <= MAX_PRICE_SUM_DEVIATION;

        if !(in_range(yes_price) && in_range(no_price) && sum_ok) {
            return Err(AgentError::InvalidMarketData {
                yes_price,
                no_price,
            });
        }

        Ok(Self {
            yes_price,
            no_price,
        })
    }

    /// The market's implied probability of YES
    pub fn implied_probability(&self) -> Decimal {
        self.yes_price
    }

    /// Price of the given outcome token
    pub fn price_of(&self, side: OutcomeSide) -> Decimal {
        match side {
            OutcomeSide::Yes => self.yes_price,
            OutcomeSide::No => self.no_price,
        }
    }
}

/// CLOB token ids of the two outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTokens {
    pub yes_token_id: String,
    pub no_token_id: String,
}

impl OutcomeTokens {
    pub fn new(yes_token_id: impl Into<String>, no_token_id: impl Into<String>) -> Self {
        Self {
            yes_token_id: yes_token_id.into(),
            no_token_id: no_token_id.into(),
        }
    }

    /// Token id for an outcome
    pub fn token_for(&self, side: OutcomeSide) -> &str {
        match side {
            OutcomeSide::Yes => &self.yes_token_id,
            OutcomeSide::No => &self.no_token_id,
        }
    }
}

/// Round a share count down to what the CLOB accepts
pub fn order_size(shares: Decimal) -> Decimal {
    shares.round_dp_with_strategy(ORDER_SIZE_DP, RoundingStrategy::ToZero)
}

/// Timestamps written with or without a UTC offset
///
/// Records written before offsets were stored carry naive ISO-8601 values,
/// which are read as UTC. Serialization always emits RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw))),
            None => Ok(None),
        }
    }
}

/// Order handed to the execution collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub token_id: String,
    pub side: OutcomeSide,
    pub trade_type: TradeType,
    pub size: Decimal,
    pub price: Decimal,
}
