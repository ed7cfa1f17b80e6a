use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::common::types::{timestamp, Trade};

/// Persisted ledger record
///
/// Every field defaults to its zero value so records written by older
/// versions (or by hand) still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    #[serde(default)]
    pub yes_shares: Decimal,
    #[serde(default)]
    pub no_shares: Decimal,
    #[serde(default)]
    pub avg_cost_yes: Decimal,
    #[serde(default)]
    pub avg_cost_no: Decimal,
    /// Probability when the position was first opened
    #[serde(default, alias = "entry_prob", deserialize_with = "legacy_entry_probability")]
    pub entry_probability: Option<Decimal>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub entry_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_invested: Decimal,
    #[serde(default)]
    pub total_withdrawn: Decimal,
    /// Append-only, chronological
    #[serde(default)]
    pub trades: Vec<Trade>,
}

/// Legacy records store `0.0` for "no entry yet"
fn legacy_entry_probability<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.filter(|p| !p.is_zero()))
}

impl PositionState {
    pub fn is_hedged(&self) -> bool {
        self.yes_shares > Decimal::ZERO && self.no_shares > Decimal::ZERO
    }
}

/// Mark-to-market valuation of the position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrealizedPnl {
    pub yes_value: Decimal,
    pub no_value: Decimal,
    pub total_value: Decimal,
    /// Cost basis of the shares still held
    pub total_cost: Decimal,
    /// total_value - total_cost, ignores withdrawals
    pub unrealized_pnl: Decimal,
    /// All-time PnL: total_value + withdrawn - invested
    pub net_pnl: Decimal,
    /// net_pnl / invested in percent, zero before the first buy
    pub roi: Decimal,
}

/// Single read of the ledger used by the strategy and the display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub yes_shares: Decimal,
    pub no_shares: Decimal,
    pub avg_cost_yes: Decimal,
    pub avg_cost_no: Decimal,
    pub entry_probability: Option<Decimal>,
    pub entry_timestamp: Option<DateTime<Utc>>,
    pub total_invested: Decimal,
    pub total_withdrawn: Decimal,
    pub current_yes_price: Decimal,
    pub current_no_price: Decimal,
    #[serde(flatten)]
    pub pnl: UnrealizedPnl,
    pub locked_pnl: Decimal,
    pub is_hedged: bool,
    pub num_trades: usize,
}

impl PositionSummary {
    pub fn has_position(&self) -> bool {
        self.yes_shares > Decimal::ZERO || self.no_shares > Decimal::ZERO
    }
}
