//! Poll loop driving the hedging strategy
//!
//! One cycle: fetch prices (with retry) → summarize the position → evaluate
//! the rules → consult the advisor → log the status → execute.
//! Cycles never overlap and the ledger is only touched between them.

pub mod display;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

pub use display::{format_duration, format_pnl, format_roi, sleep_until_next_poll};

use crate::advisor::{blend, AdvisoryContext};
use crate::common::errors::{AgentError, Result};
use crate::common::retry::{retry_with_backoff, RetryPolicy};
use crate::common::traits::{Advisor, MarketDataSource};
use crate::common::types::MarketPrices;
use crate::config::AppConfig;
use crate::position::Position;
use crate::strategy::{Action, ExecutionResult, HedgingStrategy};

/// What a single poll did
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Market data could not be fetched, nothing was evaluated
    Skipped,
    /// Evaluated, nothing executed (WAIT or HOLD)
    Idle(Action),
    /// Action executed
    Executed(Action, ExecutionResult),
    /// Execution was attempted and failed, the ledger is unchanged
    Failed(Action),
}

/// Market identity and timing of the loop
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub condition_id: String,
    pub question: String,
    pub poll_interval: Duration,
    pub retry_policy: RetryPolicy,
    pub min_override_confidence: u8,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            condition_id: config.market.condition_id.clone(),
            question: config.market.question.clone(),
            poll_interval: config.settings.poll_interval(),
            retry_policy: config.settings.retry_policy(),
            min_override_confidence: config.advisor.min_override_confidence,
        }
    }
}

pub struct HedgeAgent {
    position: Position,
    strategy: HedgingStrategy,
    market_data: Arc<dyn MarketDataSource>,
    advisor: Arc<dyn Advisor>,
    settings: AgentSettings,
    poll_count: u64,
    started_at: Instant,
    last_action_time: Option<DateTime<Utc>>,
    last_prices: Option<MarketPrices>,
}

impl HedgeAgent {
    pub fn new(
        position: Position,
        strategy: HedgingStrategy,
        market_data: Arc<dyn MarketDataSource>,
        advisor: Arc<dyn Advisor>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            position,
            strategy,
            market_data,
            advisor,
            settings,
            poll_count: 0,
            started_at: Instant::now(),
            last_action_time: None,
            last_prices: None,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    pub fn last_action_time(&self) -> Option<DateTime<Utc>> {
        self.last_action_time
    }

    pub fn last_prices(&self) -> Option<MarketPrices> {
        self.last_prices
    }

    /// Fetch the current quote, retrying transient failures
    async fn fetch_prices(&self) -> Result<MarketPrices> {
        let source = Arc::clone(&self.market_data);
        let market_id = self.settings.condition_id.as_str();
        retry_with_backoff(self.settings.retry_policy, AgentError::is_transient, || {
            let source = Arc::clone(&source);
            async move { source.fetch_current_prices(market_id).await }
        })
        .await
    }

    /// Run one full cycle
    #[instrument(skip(self))]
    pub async fn poll_once(&mut self) -> PollOutcome {
        self.poll_count += 1;

        let prices = match self.fetch_prices().await {
            Ok(prices) => prices,
            Err(e) => {
                error!(
                    market_id = %self.settings.condition_id,
                    source = self.market_data.source_name(),
                    error = %e,
                    "Failed to fetch market data, skipping cycle"
                );
                return PollOutcome::Skipped;
            }
        };
        self.last_prices = Some(prices);

        let probability = prices.implied_probability();
        display::log_market(&self.settings.question, self.poll_count, &prices);

        let summary = self.position.position_summary(prices.yes_price, prices.no_price);
        display::log_position(&summary);

        let rule_action =
            self.strategy
                .evaluate(&self.position, probability, prices.yes_price, prices.no_price);

        let advice = self
            .advisor
            .advise(&AdvisoryContext {
                question: &self.settings.question,
                current_probability: probability,
                summary: &summary,
                rule_action: rule_action.kind(),
            })
            .await;
        let action = blend(
            rule_action,
            &advice,
            &summary,
            &prices,
            self.settings.min_override_confidence,
        );
        display::log_action(&action);

        if !action.is_actionable() {
            return PollOutcome::Idle(action);
        }

        match self.strategy.execute_action(&mut self.position, &action).await {
            Ok(Some(result)) => {
                self.last_action_time = Some(Utc::now());
                info!(action = %result.kind(), "Action executed");
                PollOutcome::Executed(action, result)
            }
            Ok(None) => PollOutcome::Idle(action),
            Err(e) => {
                error!(
                    action = %action.kind(),
                    yes_price = %prices.yes_price,
                    no_price = %prices.no_price,
                    error = %e,
                    "Action execution failed"
                );
                PollOutcome::Failed(action)
            }
        }
    }

    /// Poll until shutdown is signalled or `max_polls` cycles ran
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>, max_polls: Option<u64>) {
        info!(
            market_id = %self.settings.condition_id,
            market = %self.settings.question,
            interval_secs = self.settings.poll_interval.as_secs(),
            source = self.market_data.source_name(),
            advisor_enabled = self.advisor.is_enabled(),
            execute_trades = self.strategy.execute_trades(),
            "Starting agent loop"
        );

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested");
                break;
            }
            if max_polls.is_some_and(|max| self.poll_count >= max) {
                info!(polls = self.poll_count, "Reached poll limit");
                break;
            }

            let started = Instant::now();
            self.poll_once().await;

            if max_polls.is_some_and(|max| self.poll_count >= max) {
                continue;
            }
            if sleep_until_next_poll(started, self.settings.poll_interval, &mut shutdown).await {
                info!("Shutdown requested during sleep");
                break;
            }
        }
    }

    /// Persist the ledger and log the session summary
    pub fn shutdown(&self) -> Result<()> {
        let saved = self.position.save();
        if let Err(e) = &saved {
            error!(error = %e, "Failed to save position on shutdown");
        }

        info!(
            runtime = %format_duration(self.started_at.elapsed()),
            polls = self.poll_count,
            last_action = ?self.last_action_time,
            "Agent stopped"
        );

        if self.position.has_position() {
            match self.last_prices {
                Some(prices) => {
                    let summary = self.position.position_summary(prices.yes_price, prices.no_price);
                    info!(
                        yes_shares = %summary.yes_shares.round_dp(2),
                        no_shares = %summary.no_shares.round_dp(2),
                        net_pnl = %format_pnl(summary.pnl.net_pnl),
                        roi = %format_roi(summary.pnl.roi),
                        "Final position"
                    );
                }
                None => warn!(
                    yes_shares = %self.position.yes_shares(),
                    no_shares = %self.position.no_shares(),
                    "Final position (no price seen this session)"
                ),
            }
        }

        saved
    }
}
