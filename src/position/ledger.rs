use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use super::types::{PositionState, PositionSummary, UnrealizedPnl};
use crate::common::errors::{AgentError, Result};
use crate::common::traits::{OrderExecutor, PositionStore};
use crate::common::types::{order_size, OrderRequest, OutcomeSide, OutcomeTokens, Trade, TradeType};
use crate::strategy::pnl::{safe_divide, WINNING_PAYOUT};

/// Ledger for one market's YES/NO position
///
/// Every mutating operation follows the same order: validate, dispatch to
/// the executor (when asked to and one is attached), build the next state,
/// persist it, then commit it in memory. A failure before an order fills
/// leaves the ledger exactly as it was. Once an order has filled the trade
/// is always committed in memory, and a failed save is reported afterwards.
pub struct Position {
    state: PositionState,
    store: Arc<dyn PositionStore>,
    executor: Option<Arc<dyn OrderExecutor>>,
    tokens: Option<OutcomeTokens>,
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Position")
            .field("state", &self.state)
            .field("has_executor", &self.executor.is_some())
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl Position {
    /// Create an empty position backed by `store`
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self {
            state: PositionState::default(),
            store,
            executor: None,
            tokens: None,
        }
    }

    /// Restore the last saved state, or start empty if nothing was saved
    pub fn load(store: Arc<dyn PositionStore>) -> Result<Self> {
        let state = store.load()?.unwrap_or_default();
        if state.yes_shares > Decimal::ZERO || state.no_shares > Decimal::ZERO {
            info!(
                yes_shares = %state.yes_shares,
                no_shares = %state.no_shares,
                trades = state.trades.len(),
                "Restored existing position"
            );
        }
        Ok(Self {
            state,
            store,
            executor: None,
            tokens: None,
        })
    }

    /// Attach the order executor and the token ids it trades
    pub fn with_executor(mut self, executor: Arc<dyn OrderExecutor>, tokens: OutcomeTokens) -> Self {
        self.executor = Some(executor);
        self.tokens = Some(tokens);
        self
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn yes_shares(&self) -> Decimal {
        self.state.yes_shares
    }

    pub fn no_shares(&self) -> Decimal {
        self.state.no_shares
    }

    pub fn avg_cost_yes(&self) -> Decimal {
        self.state.avg_cost_yes
    }

    pub fn avg_cost_no(&self) -> Decimal {
        self.state.avg_cost_no
    }

    pub fn entry_probability(&self) -> Option<Decimal> {
        self.state.entry_probability
    }

    pub fn total_invested(&self) -> Decimal {
        self.state.total_invested
    }

    pub fn total_withdrawn(&self) -> Decimal {
        self.state.total_withdrawn
    }

    pub fn trades(&self) -> &[Trade] {
        &self.state.trades
    }

    pub fn has_position(&self) -> bool {
        self.state.yes_shares > Decimal::ZERO || self.state.no_shares > Decimal::ZERO
    }

    pub fn is_hedged(&self) -> bool {
        self.state.is_hedged()
    }

    fn balance(&self, side: OutcomeSide) -> Decimal {
        match side {
            OutcomeSide::Yes => self.state.yes_shares,
            OutcomeSide::No => self.state.no_shares,
        }
    }

    /// Buy `shares` of `side` at `price`
    ///
    /// The first trade of the position's life stamps the entry time and
    /// the entry probability (`price` when none is given). Live orders are
    /// rounded down to the CLOB's size precision and the ledger records the
    /// rounded count.
    #[instrument(skip(self), fields(side = %side))]
    pub async fn open_position(
        &mut self,
        shares: Decimal,
        price: Decimal,
        side: OutcomeSide,
        entry_probability: Option<Decimal>,
        execute: bool,
    ) -> Result<()> {
        let shares = self.tradable_size(shares, execute);
        validate_trade(shares, price)?;

        let filled = execute && self.dispatch(side, TradeType::Buy, shares, price).await?;

        let trade = Trade::now(side, shares, price, TradeType::Buy);
        let usdc_amount = trade.usdc_amount;
        let mut next = self.state.clone();

        next.total_invested += usdc_amount;
        match side {
            OutcomeSide::Yes => {
                next.avg_cost_yes = weighted_average(next.yes_shares, next.avg_cost_yes, shares, price);
                next.yes_shares += shares;
            }
            OutcomeSide::No => {
                next.avg_cost_no = weighted_average(next.no_shares, next.avg_cost_no, shares, price);
                next.no_shares += shares;
            }
        }

        if next.trades.is_empty() && next.entry_timestamp.is_none() && next.entry_probability.is_none() {
            next.entry_timestamp = Some(trade.timestamp);
            next.entry_probability = Some(entry_probability.unwrap_or(price));
        }
        next.trades.push(trade);

        self.apply(next, filled)?;

        info!(
            side = %side,
            shares = %shares,
            price = %price,
            usdc = %usdc_amount,
            "Bought shares"
        );
        Ok(())
    }

    /// Sell `shares` of `side` at `price`, returning the USDC proceeds
    ///
    /// Average cost is left untouched on sells.
    ///
    /// # Errors
    /// `InsufficientShares` when `shares` exceeds the held balance, checked
    /// before any order is sent.
    #[instrument(skip(self), fields(side = %side))]
    pub async fn sell_shares(
        &mut self,
        shares: Decimal,
        price: Decimal,
        side: OutcomeSide,
        execute: bool,
    ) -> Result<Decimal> {
        let shares = self.tradable_size(shares, execute);
        let available = self.balance(side);
        if shares > available {
            return Err(AgentError::InsufficientShares {
                side,
                requested: shares,
                available,
            });
        }
        validate_trade(shares, price)?;

        let filled = execute && self.dispatch(side, TradeType::Sell, shares, price).await?;

        let trade = Trade::now(side, shares, price, TradeType::Sell);
        let proceeds = trade.usdc_amount;
        let mut next = self.state.clone();

        match side {
            OutcomeSide::Yes => next.yes_shares -= shares,
            OutcomeSide::No => next.no_shares -= shares,
        }
        next.total_withdrawn += proceeds;
        next.trades.push(trade);

        self.apply(next, filled)?;

        info!(
            side = %side,
            shares = %shares,
            price = %price,
            usdc = %proceeds,
            "Sold shares"
        );
        Ok(proceeds)
    }

    /// Mark the position to market
    pub fn unrealized_pnl(&self, yes_price: Decimal, no_price: Decimal) -> UnrealizedPnl {
        let s = &self.state;
        let yes_value = s.yes_shares * yes_price;
        let no_value = s.no_shares * no_price;
        let total_value = yes_value + no_value;
        let total_cost = s.yes_shares * s.avg_cost_yes + s.no_shares * s.avg_cost_no;
        let net_pnl = total_value + s.total_withdrawn - s.total_invested;

        UnrealizedPnl {
            yes_value,
            no_value,
            total_value,
            total_cost,
            unrealized_pnl: total_value - total_cost,
            net_pnl,
            roi: safe_divide(net_pnl, s.total_invested) * Decimal::ONE_HUNDRED,
        }
    }

    /// Guaranteed profit of the overlapping YES/NO shares
    ///
    /// The hedged share count is charged at both sides' average costs.
    /// Independent of current prices.
    pub fn locked_pnl(&self) -> Decimal {
        let s = &self.state;
        let hedged_shares = s.yes_shares.min(s.no_shares);
        if hedged_shares <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let guaranteed_payout = hedged_shares * WINNING_PAYOUT;
        let hedged_cost = hedged_shares * s.avg_cost_yes + hedged_shares * s.avg_cost_no;
        guaranteed_payout - hedged_cost
    }

    pub fn position_summary(&self, yes_price: Decimal, no_price: Decimal) -> PositionSummary {
        let s = &self.state;
        PositionSummary {
            yes_shares: s.yes_shares,
            no_shares: s.no_shares,
            avg_cost_yes: s.avg_cost_yes,
            avg_cost_no: s.avg_cost_no,
            entry_probability: s.entry_probability,
            entry_timestamp: s.entry_timestamp,
            total_invested: s.total_invested,
            total_withdrawn: s.total_withdrawn,
            current_yes_price: yes_price,
            current_no_price: no_price,
            pnl: self.unrealized_pnl(yes_price, no_price),
            locked_pnl: self.locked_pnl(),
            is_hedged: s.is_hedged(),
            num_trades: s.trades.len(),
        }
    }

    /// Close the books: zero every balance and counter, keep the trades
    pub fn reset(&mut self) -> Result<()> {
        let next = PositionState {
            trades: self.state.trades.clone(),
            ..Default::default()
        };
        self.commit(next)?;
        info!(trades = self.state.trades.len(), "Position reset");
        Ok(())
    }

    /// Persist the current state as is
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.state)
    }

    fn commit(&mut self, next: PositionState) -> Result<()> {
        self.store.save(&next)?;
        self.state = next;
        Ok(())
    }

    /// Commit `next`, keeping it in memory even when the save fails if an
    /// order already filled on the exchange
    fn apply(&mut self, next: PositionState, filled: bool) -> Result<()> {
        if !filled {
            return self.commit(next);
        }

        self.state = next;
        self.store.save(&self.state).map_err(|e| {
            error!(error = %e, "Order filled but the position could not be saved");
            e
        })
    }

    fn tradable_size(&self, shares: Decimal, execute: bool) -> Decimal {
        if execute && self.executor.is_some() && self.tokens.is_some() {
            order_size(shares)
        } else {
            shares
        }
    }

    /// Send the order, `false` when there is no executor to send it to
    async fn dispatch(&self, side: OutcomeSide, trade_type: TradeType, size: Decimal, price: Decimal) -> Result<bool> {
        let (executor, tokens) = match (&self.executor, &self.tokens) {
            (Some(executor), Some(tokens)) => (executor, tokens),
            _ => {
                warn!(%side, %trade_type, "No order executor attached, recording trade locally only");
                return Ok(false);
            }
        };

        let order = OrderRequest {
            token_id: tokens.token_for(side).to_string(),
            side,
            trade_type,
            size,
            price,
        };
        let order_id = executor.place_order(&order).await?;
        info!(%order_id, %side, %trade_type, size = %size, price = %price, "Order placed");
        Ok(true)
    }
}

fn validate_trade(shares: Decimal, price: Decimal) -> Result<()> {
    if shares <= Decimal::ZERO {
        return Err(AgentError::InvalidArgument(format!(
            "share count must be positive, got {}",
            shares
        )));
    }
    if price < Decimal::ZERO || price > Decimal::ONE {
        return Err(AgentError::InvalidArgument(format!(
            "price must be within [0, 1], got {}",
            price
        )));
    }
    Ok(())
}

fn weighted_average(old_shares: Decimal, old_avg: Decimal, new_shares: Decimal, new_price: Decimal) -> Decimal {
    safe_divide(old_shares * old_avg + new_shares * new_price, old_shares + new_shares)
}
