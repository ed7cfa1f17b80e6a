use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label of a strategy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Wait,
    Hold,
    TakeProfit,
    StopLoss,
    /// Result label of an executed take-profit
    Hedge,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ActionKind::Wait => "WAIT",
            ActionKind::Hold => "HOLD",
            ActionKind::TakeProfit => "TAKE_PROFIT",
            ActionKind::StopLoss => "STOP_LOSS",
            ActionKind::Hedge => "HEDGE",
        };
        f.write_str(label)
    }
}

/// Strategy decision for one poll
///
/// Each variant carries exactly the context its kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Nothing held, nothing to do
    Wait {
        reason: String,
        current_probability: Decimal,
    },
    /// Position open and within thresholds
    Hold {
        reason: String,
        current_probability: Decimal,
        unrealized_pnl: Decimal,
        is_hedged: bool,
    },
    /// Probability reached the take-profit level
    TakeProfit {
        reason: String,
        current_probability: Decimal,
        yes_price: Decimal,
        no_price: Decimal,
    },
    /// Probability fell to the stop-loss level
    StopLoss {
        reason: String,
        current_probability: Decimal,
        yes_price: Decimal,
        no_price: Decimal,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Wait { .. } => ActionKind::Wait,
            Action::Hold { .. } => ActionKind::Hold,
            Action::TakeProfit { .. } => ActionKind::TakeProfit,
            Action::StopLoss { .. } => ActionKind::StopLoss,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Action::Wait { reason, .. }
            | Action::Hold { reason, .. }
            | Action::TakeProfit { reason, .. }
            | Action::StopLoss { reason, .. } => reason,
        }
    }

    pub fn current_probability(&self) -> Decimal {
        match self {
            Action::Wait {
                current_probability, ..
            }
            | Action::Hold {
                current_probability, ..
            }
            | Action::TakeProfit {
                current_probability, ..
            }
            | Action::StopLoss {
                current_probability, ..
            } => *current_probability,
        }
    }

    /// Returns true if executing this action would trade
    pub fn is_actionable(&self) -> bool {
        matches!(self, Action::TakeProfit { .. } | Action::StopLoss { .. })
    }

    /// Same action with a different justification
    pub fn with_reason(mut self, new_reason: impl Into<String>) -> Self {
        let new_reason = new_reason.into();
        match &mut self {
            Action::Wait { reason, .. }
            | Action::Hold { reason, .. }
            | Action::TakeProfit { reason, .. }
            | Action::StopLoss { reason, .. } => *reason = new_reason,
        }
        self
    }
}

/// Outcome of converting YES exposure into a hedge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgeResult {
    pub yes_sold: Decimal,
    pub yes_price: Decimal,
    pub no_bought: Decimal,
    pub no_price: Decimal,
    /// USDC received for the YES shares and spent on NO
    pub proceeds: Decimal,
    /// proceeds - yes_sold × avg_cost_yes
    pub realized_gain: Decimal,
    /// Ledger's locked PnL after both trades
    pub locked_pnl: Decimal,
    pub remaining_yes: Decimal,
    pub remaining_no: Decimal,
}

/// Outcome of closing the whole position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitResult {
    pub yes_sold: Decimal,
    pub yes_price: Decimal,
    pub no_sold: Decimal,
    pub no_price: Option<Decimal>,
    pub total_proceeds: Decimal,
    /// Lifetime realized PnL: withdrawn - invested
    pub final_pnl: Decimal,
}

/// Result of executing an actionable decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionResult {
    Hedge(HedgeResult),
    StopLoss(ExitResult),
}

impl ExecutionResult {
    pub fn kind(&self) -> ActionKind {
        match self {
            ExecutionResult::Hedge(_) => ActionKind::Hedge,
            ExecutionResult::StopLoss(_) => ActionKind::StopLoss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_action_kind_labels() {
        assert_eq!(ActionKind::TakeProfit.to_string(), "TAKE_PROFIT");
        assert_eq!(
            serde_json::to_string(&ActionKind::StopLoss).unwrap(),
            "\"STOP_LOSS\""
        );
    }

    #[test]
    fn test_action_accessors() {
        let action = Action::TakeProfit {
            reason: "Probability 86% >= 85%".to_string(),
            current_probability: dec!(0.86),
            yes_price: dec!(0.86),
            no_price: dec!(0.14),
        };
        assert_eq!(action.kind(), ActionKind::TakeProfit);
        assert_eq!(action.current_probability(), dec!(0.86));
        assert!(action.is_actionable());

        let action = action.with_reason("advisor");
        assert_eq!(action.reason(), "advisor");
    }

    #[test]
    fn test_tagged_serialization() {
        let action = Action::Wait {
            reason: "No position open".to_string(),
            current_probability: dec!(0.5),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["kind"], "WAIT");
        assert!(!action.is_actionable());
    }
}
