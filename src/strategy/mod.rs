//! Strategy module for hedging decisions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PER POLL (pure)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Quote arrives                                              │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  HedgingStrategy.evaluate() → WAIT | HOLD | TAKE_PROFIT     │
//! │                               | STOP_LOSS                   │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    EXECUTION (async)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TAKE_PROFIT → book_profit_and_rebalance → HEDGE            │
//! │    - Sell hedge_sell_fraction of YES                        │
//! │    - Spend all proceeds on NO                               │
//! │  STOP_LOSS   → cut_loss_and_exit                            │
//! │    - Sell everything, reset the position                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`HedgingStrategy`]: Threshold state machine and its executions
//! - [`Action`]: Decision returned by [`HedgingStrategy::evaluate`]
//! - [`ExecutionResult`]: What an executed decision did
//! - [`PnlCalculator`]: Stateless hedge sizing and PnL math

mod hedging;
pub mod pnl;
mod types;

pub use hedging::HedgingStrategy;

pub use types::{Action, ActionKind, ExecutionResult, ExitResult, HedgeResult};

pub use pnl::{
    safe_divide,
    BreakevenPrices,
    HedgeSizing,
    OutcomeScenarios,
    PnlCalculator,
    RoiMetrics,
    SlippageImpact,
};
