use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::pnl::PnlCalculator;
use super::types::{Action, ExecutionResult, ExitResult, HedgeResult};
use crate::common::errors::{AgentError, Result};
use crate::common::types::OutcomeSide;
use crate::config::StrategyConfig;
use crate::position::Position;

/// Threshold-driven take-profit / stop-loss strategy
///
/// Memoryless: every call to [`evaluate`](Self::evaluate) looks only at the
/// position it is given and the current quote.
#[derive(Debug, Clone)]
pub struct HedgingStrategy {
    config: StrategyConfig,
    execute_trades: bool,
}

impl HedgingStrategy {
    /// # Arguments
    /// * `config` - Thresholds and hedge fraction, already validated
    /// * `execute_trades` - Dispatch orders to the position's executor
    pub fn new(config: StrategyConfig, execute_trades: bool) -> Self {
        Self {
            config,
            execute_trades,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn execute_trades(&self) -> bool {
        self.execute_trades
    }

    /// Decide what to do at the current probability
    pub fn evaluate(
        &self,
        position: &Position,
        current_probability: Decimal,
        yes_price: Decimal,
        no_price: Decimal,
    ) -> Action {
        if !position.has_position() {
            return Action::Wait {
                reason: "No position open".to_string(),
                current_probability,
            };
        }

        if self.should_take_profit(position, current_probability) {
            return Action::TakeProfit {
                reason: format!(
                    "Probability {} >= {}",
                    percent(current_probability),
                    percent(self.config.take_profit_threshold)
                ),
                current_probability,
                yes_price,
                no_price,
            };
        }

        if self.should_cut_loss(position, current_probability) {
            return Action::StopLoss {
                reason: format!(
                    "Probability {} <= {}",
                    percent(current_probability),
                    percent(self.config.stop_loss_threshold)
                ),
                current_probability,
                yes_price,
                no_price,
            };
        }

        let pnl = position.unrealized_pnl(yes_price, no_price);
        Action::Hold {
            reason: format!(
                "Within thresholds ({} - {})",
                percent(self.config.stop_loss_threshold),
                percent(self.config.take_profit_threshold)
            ),
            current_probability,
            unrealized_pnl: pnl.unrealized_pnl,
            is_hedged: position.is_hedged(),
        }
    }

    /// Unhedged YES exposure at or above the take-profit level
    pub fn should_take_profit(&self, position: &Position, current_probability: Decimal) -> bool {
        position.yes_shares() > Decimal::ZERO
            && position.no_shares() == Decimal::ZERO
            && current_probability >= self.config.take_profit_threshold
    }

    /// Unhedged YES exposure at or below the stop-loss level
    pub fn should_cut_loss(&self, position: &Position, current_probability: Decimal) -> bool {
        position.yes_shares() > Decimal::ZERO
            && position.no_shares() == Decimal::ZERO
            && current_probability <= self.config.stop_loss_threshold
    }

    /// Sell the configured fraction of YES and put the proceeds into NO
    pub async fn book_profit_and_rebalance(
        &self,
        position: &mut Position,
        yes_price: Decimal,
        no_price: Decimal,
    ) -> Result<HedgeResult> {
        if position.yes_shares() <= Decimal::ZERO {
            return Err(AgentError::NoPosition("no YES shares to hedge".to_string()));
        }

        let sizing = PnlCalculator::hedge_shares(
            position.yes_shares(),
            self.config.hedge_sell_fraction,
            yes_price,
            no_price,
        )?;
        let avg_cost_yes = position.avg_cost_yes();

        info!(
            current_probability = %percent(yes_price),
            yes_to_sell = %sizing.yes_to_sell.round_dp(0),
            yes_price = %yes_price,
            usdc_proceeds = %sizing.usdc_proceeds.round_dp(2),
            no_to_buy = %sizing.no_to_buy.round_dp(0),
            no_price = %no_price,
            "Take profit: rebalancing into NO"
        );

        // Live orders may be rounded by the ledger, so report what it recorded
        let yes_before = position.yes_shares();
        let proceeds = position
            .sell_shares(sizing.yes_to_sell, yes_price, OutcomeSide::Yes, self.execute_trades)
            .await?;
        let yes_sold = yes_before - position.yes_shares();

        let no_to_buy = if yes_sold == sizing.yes_to_sell {
            sizing.no_to_buy
        } else {
            PnlCalculator::hedge_shares(yes_sold, Decimal::ONE, yes_price, no_price)?.no_to_buy
        };

        let no_before = position.no_shares();
        position
            .open_position(no_to_buy, no_price, OutcomeSide::No, None, self.execute_trades)
            .await
            .map_err(|e| {
                error!(
                    yes_sold = %yes_sold,
                    proceeds = %proceeds.round_dp(2),
                    error = %e,
                    "YES sold but the NO buy failed, proceeds are held as USDC"
                );
                e
            })?;
        let no_bought = position.no_shares() - no_before;

        let locked_pnl = position.locked_pnl();
        info!(locked_pnl = %locked_pnl.round_dp(2), "Hedge executed");

        Ok(HedgeResult {
            yes_sold,
            yes_price,
            no_bought,
            no_price,
            proceeds,
            realized_gain: proceeds - yes_sold * avg_cost_yes,
            locked_pnl,
            remaining_yes: position.yes_shares(),
            remaining_no: position.no_shares(),
        })
    }

    /// Sell everything held and reset the position
    ///
    /// NO shares are only sold when `no_price` is given.
    pub async fn cut_loss_and_exit(
        &self,
        position: &mut Position,
        yes_price: Decimal,
        no_price: Option<Decimal>,
    ) -> Result<ExitResult> {
        if !position.has_position() {
            return Err(AgentError::NoPosition("nothing to exit".to_string()));
        }

        warn!(current_probability = %percent(yes_price), "Stop loss triggered");

        let yes_held = position.yes_shares();
        let mut total_proceeds = Decimal::ZERO;
        let mut yes_sold = Decimal::ZERO;
        if yes_held > Decimal::ZERO {
            let proceeds = position
                .sell_shares(yes_held, yes_price, OutcomeSide::Yes, self.execute_trades)
                .await?;
            yes_sold = yes_held - position.yes_shares();
            info!(shares = %yes_sold, price = %yes_price, proceeds = %proceeds.round_dp(2), "Sold YES");
            total_proceeds += proceeds;
        }

        let mut no_sold = Decimal::ZERO;
        if let Some(no_price) = no_price {
            let held = position.no_shares();
            if held > Decimal::ZERO {
                let proceeds = position
                    .sell_shares(held, no_price, OutcomeSide::No, self.execute_trades)
                    .await?;
                no_sold = held - position.no_shares();
                info!(shares = %no_sold, price = %no_price, proceeds = %proceeds.round_dp(2), "Sold NO");
                total_proceeds += proceeds;
            }
        }

        let final_pnl = position.total_withdrawn() - position.total_invested();
        if final_pnl >= Decimal::ZERO {
            info!(final_pnl = %final_pnl.round_dp(2), "Exited with profit");
        } else {
            warn!(final_pnl = %final_pnl.round_dp(2), "Exited with loss");
        }

        position.reset()?;

        Ok(ExitResult {
            yes_sold,
            yes_price,
            no_sold,
            no_price,
            total_proceeds,
            final_pnl,
        })
    }

    /// Carry out an actionable decision, `None` for WAIT and HOLD
    pub async fn execute_action(
        &self,
        position: &mut Position,
        action: &Action,
    ) -> Result<Option<ExecutionResult>> {
        match action {
            Action::TakeProfit {
                yes_price, no_price, ..
            } => self
                .book_profit_and_rebalance(position, *yes_price, *no_price)
                .await
                .map(|r| Some(ExecutionResult::Hedge(r))),
            Action::StopLoss {
                yes_price, no_price, ..
            } => self
                .cut_loss_and_exit(position, *yes_price, Some(*no_price))
                .await
                .map(|r| Some(ExecutionResult::StopLoss(r))),
            Action::Hold { reason, .. } => {
                info!(%reason, "HOLD");
                Ok(None)
            }
            Action::Wait { reason, .. } => {
                info!(%reason, "WAIT");
                Ok(None)
            }
        }
    }
}

/// Probability as a one-decimal percentage, e.g. `86.0%`
fn percent(p: Decimal) -> String {
    format!("{:.1}%", p * Decimal::ONE_HUNDRED)
}
