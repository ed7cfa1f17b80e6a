use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{AgentError, Result};

/// Payout per winning share at settlement
pub const WINNING_PAYOUT: Decimal = Decimal::ONE;

/// Shares to move when converting a YES position into a hedge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgeSizing {
    pub yes_to_sell: Decimal,
    pub no_to_buy: Decimal,
    pub usdc_proceeds: Decimal,
}

/// Settlement PnL under each outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeScenarios {
    pub pnl_if_yes_wins: Decimal,
    pub pnl_if_no_wins: Decimal,
    /// Worst case of the two outcomes
    pub guaranteed_min: Decimal,
    pub best_case: Decimal,
    pub is_hedged: bool,
    pub is_profitable: bool,
}

/// Breakeven exit prices for the current holdings
///
/// A side with zero shares reports a breakeven price of zero. That value is
/// a placeholder, not a meaningful price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakevenPrices {
    pub breakeven_yes_price: Decimal,
    pub breakeven_no_price: Decimal,
    pub total_cost: Decimal,
}

/// Return on investment metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiMetrics {
    pub net_pnl: Decimal,
    pub roi_percent: Decimal,
    pub total_return: Decimal,
    pub profit_factor: Decimal,
}

/// Difference between the expected and the executed price of a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageImpact {
    pub expected_value: Decimal,
    pub actual_value: Decimal,
    pub slippage_usd: Decimal,
    pub slippage_percent: Decimal,
}

/// PnL calculation utilities
///
/// Pure functions over explicit inputs. Binary settlement is assumed: the
/// winning token pays exactly 1.0 per share and the losing token pays 0.
pub struct PnlCalculator;

impl PnlCalculator {
    /// Size a hedge: sell a fraction of the YES shares and spend all
    /// proceeds on NO shares.
    ///
    /// # Arguments
    /// * `yes_shares_held` - Current YES balance
    /// * `sell_fraction` - Fraction of YES to sell (0, 1]
    /// * `yes_sell_price` - Price the YES shares are sold at
    /// * `no_buy_price` - Price the NO shares are bought at, must be > 0
    ///
    /// # Errors
    /// `InvalidArgument` if `no_buy_price` is zero or negative.
    pub fn hedge_shares(
        yes_shares_held: Decimal,
        sell_fraction: Decimal,
        yes_sell_price: Decimal,
        no_buy_price: Decimal,
    ) -> Result<HedgeSizing> {
        if no_buy_price <= Decimal::ZERO {
            return Err(AgentError::InvalidArgument(format!(
                "NO buy price must be positive, got {}",
                no_buy_price
            )));
        }

        let yes_to_sell = yes_shares_held * sell_fraction;
        let usdc_proceeds = yes_to_sell * yes_sell_price;
        let no_to_buy = usdc_proceeds
            .checked_div(no_buy_price)
            .ok_or_else(|| AgentError::InvalidArgument("hedge sizing overflowed".to_string()))?;

        Ok(HedgeSizing {
            yes_to_sell,
            no_to_buy,
            usdc_proceeds,
        })
    }

    /// PnL for both settlement outcomes against a total cost basis
    pub fn final_outcome_scenarios(
        yes_shares: Decimal,
        no_shares: Decimal,
        total_cost: Decimal,
    ) -> OutcomeScenarios {
        let pnl_if_yes_wins = yes_shares * WINNING_PAYOUT - total_cost;
        let pnl_if_no_wins = no_shares * WINNING_PAYOUT - total_cost;
        let guaranteed_min = pnl_if_yes_wins.min(pnl_if_no_wins);

        OutcomeScenarios {
            pnl_if_yes_wins,
            pnl_if_no_wins,
            guaranteed_min,
            best_case: pnl_if_yes_wins.max(pnl_if_no_wins),
            is_hedged: yes_shares > Decimal::ZERO && no_shares > Decimal::ZERO,
            is_profitable: guaranteed_min > Decimal::ZERO,
        }
    }

    /// Price each side would need to reach to pay back the whole cost basis
    pub fn breakeven_prices(
        yes_shares: Decimal,
        no_shares: Decimal,
        avg_cost_yes: Decimal,
        avg_cost_no: Decimal,
    ) -> BreakevenPrices {
        let total_cost = yes_shares * avg_cost_yes + no_shares * avg_cost_no;

        BreakevenPrices {
            breakeven_yes_price: safe_divide(total_cost, yes_shares),
            breakeven_no_price: safe_divide(total_cost, no_shares),
            total_cost,
        }
    }

    /// Return on investment including anything already withdrawn
    pub fn roi(current_value: Decimal, total_invested: Decimal, total_withdrawn: Decimal) -> RoiMetrics {
        let total_return = current_value + total_withdrawn;
        let net_pnl = total_return - total_invested;

        RoiMetrics {
            net_pnl,
            roi_percent: safe_divide(net_pnl, total_invested) * dec!(100),
            total_return,
            profit_factor: safe_divide(total_return, total_invested),
        }
    }

    /// Slippage between an expected and an executed price
    pub fn slippage_impact(shares: Decimal, expected_price: Decimal, actual_price: Decimal) -> SlippageImpact {
        let expected_value = shares * expected_price;
        let actual_value = shares * actual_price;
        let slippage_usd = actual_value - expected_value;

        SlippageImpact {
            expected_value,
            actual_value,
            slippage_usd,
            slippage_percent: safe_divide(slippage_usd, expected_value) * dec!(100),
        }
    }

    /// Fraction of YES to sell when hedging
    ///
    /// Selling everything gives the largest NO position per dollar of YES,
    /// so the ratio is the requested lock level clamped to (0, 1].
    pub fn optimal_hedge_ratio(_yes_price: Decimal, _no_price: Decimal, target_profit_lock: Decimal) -> Decimal {
        if target_profit_lock <= Decimal::ZERO {
            return Decimal::ONE;
        }
        target_profit_lock.min(Decimal::ONE)
    }
}

/// Division that yields zero for a non-positive denominator
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_hedge_sizing_full_sell() {
        let sizing = PnlCalculator::hedge_shares(dec!(1250), dec!(1.0), dec!(0.86), dec!(0.14)).unwrap();
        assert_eq!(sizing.yes_to_sell, dec!(1250));
        assert_eq!(sizing.usdc_proceeds, dec!(1075));
        assert_eq!(sizing.no_to_buy.round_dp(2), dec!(7678.57));
    }

    #[test]
    fn test_hedge_sizing_partial_sell() {
        let sizing = PnlCalculator::hedge_shares(dec!(1250), dec!(0.60), dec!(0.85), dec!(0.15)).unwrap();
        assert_eq!(sizing.yes_to_sell, dec!(750));
        assert_eq!(sizing.usdc_proceeds, dec!(637.5));
        assert_eq!(sizing.no_to_buy, dec!(4250));
    }

    #[test]
    fn test_hedge_sizing_rejects_zero_price() {
        let result = PnlCalculator::hedge_shares(dec!(1250), dec!(1.0), dec!(0.86), Decimal::ZERO);
        assert!(matches!(result, Err(AgentError::InvalidArgument(_))));

        let result = PnlCalculator::hedge_shares(dec!(1250), dec!(1.0), dec!(0.86), dec!(-0.1));
        assert!(matches!(result, Err(AgentError::InvalidArgument(_))));
    }

    #[test]
    fn test_outcome_scenarios_one_sided() {
        // 1250 YES bought for $1000
        let s = PnlCalculator::final_outcome_scenarios(dec!(1250), Decimal::ZERO, dec!(1000));
        assert_eq!(s.pnl_if_yes_wins, dec!(250));
        assert_eq!(s.pnl_if_no_wins, dec!(-1000));
        assert_eq!(s.guaranteed_min, dec!(-1000));
        assert_eq!(s.best_case, dec!(250));
        assert!(!s.is_hedged);
        assert!(!s.is_profitable);
    }

    #[test]
    fn test_outcome_scenarios_hedged_profit() {
        let s = PnlCalculator::final_outcome_scenarios(dec!(1100), dec!(1050), dec!(1000));
        assert_eq!(s.guaranteed_min, dec!(50));
        assert!(s.is_hedged);
        assert!(s.is_profitable);
    }

    #[test]
    fn test_breakeven_prices() {
        let b = PnlCalculator::breakeven_prices(dec!(500), dec!(4250), dec!(0.80), dec!(0.15));
        assert_eq!(b.total_cost, dec!(1037.5));
        assert_eq!(b.breakeven_yes_price, dec!(2.075));
        assert_eq!(b.breakeven_no_price.round_dp(4), dec!(0.2441));
    }

    #[test]
    fn test_breakeven_zero_side_is_zero() {
        let b = PnlCalculator::breakeven_prices(dec!(1250), Decimal::ZERO, dec!(0.80), Decimal::ZERO);
        assert_eq!(b.breakeven_yes_price, dec!(0.80));
        assert_eq!(b.breakeven_no_price, Decimal::ZERO);
    }

    #[test]
    fn test_roi() {
        let r = PnlCalculator::roi(dec!(1075), dec!(1000), Decimal::ZERO);
        assert_eq!(r.net_pnl, dec!(75));
        assert_eq!(r.roi_percent, dec!(7.5));
        assert_eq!(r.total_return, dec!(1075));
        assert_eq!(r.profit_factor, dec!(1.075));

        let r = PnlCalculator::roi(dec!(0), dec!(1000), dec!(950));
        assert_eq!(r.net_pnl, dec!(-50));
        assert_eq!(r.roi_percent, dec!(-5));
    }

    #[test]
    fn test_roi_without_investment() {
        let r = PnlCalculator::roi(dec!(10), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(r.net_pnl, dec!(10));
        assert_eq!(r.roi_percent, Decimal::ZERO);
        assert_eq!(r.profit_factor, Decimal::ZERO);
    }

    #[test]
    fn test_slippage_impact() {
        let s = PnlCalculator::slippage_impact(dec!(1000), dec!(0.80), dec!(0.78));
        assert_eq!(s.expected_value, dec!(800));
        assert_eq!(s.actual_value, dec!(780));
        assert_eq!(s.slippage_usd, dec!(-20));
        assert_eq!(s.slippage_percent, dec!(-2.5));

        let s = PnlCalculator::slippage_impact(dec!(1000), Decimal::ZERO, dec!(0.01));
        assert_eq!(s.slippage_percent, Decimal::ZERO);
    }

    #[test]
    fn test_optimal_hedge_ratio() {
        assert_eq!(PnlCalculator::optimal_hedge_ratio(dec!(0.86), dec!(0.14), dec!(1.0)), dec!(1.0));
        assert_eq!(PnlCalculator::optimal_hedge_ratio(dec!(0.86), dec!(0.14), dec!(0.5)), dec!(0.5));
        assert_eq!(PnlCalculator::optimal_hedge_ratio(dec!(0.86), dec!(0.14), dec!(3)), dec!(1));
    }
}
