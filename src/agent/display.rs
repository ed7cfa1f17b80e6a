//! Status rendering for the poll loop
//!
//! The status "screen" is a handful of structured log lines so it reads the
//! same on a terminal and in a JSON log pipeline.

use std::time::{Duration, Instant};

use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::common::types::MarketPrices;
use crate::position::PositionSummary;
use crate::strategy::{Action, PnlCalculator};

/// Money with a sign and thousands separators, e.g. `+$1,234.50`
pub fn format_pnl(pnl: Decimal) -> String {
    let sign = if pnl > Decimal::ZERO {
        "+"
    } else if pnl < Decimal::ZERO {
        "-"
    } else {
        ""
    };
    let rounded = pnl.abs().round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded);
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{}${}.{}", sign, group_thousands(whole), frac)
}

/// Percentage with a sign, e.g. `+7.50%`
pub fn format_roi(roi_percent: Decimal) -> String {
    let sign = if roi_percent > Decimal::ZERO { "+" } else { "" };
    format!("{}{:.2}%", sign, roi_percent)
}

/// `2h 15m 30s`, `5m`, `0s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Sleep for what is left of `interval` since `started`
///
/// Returns `true` when woken early by the shutdown flag.
pub async fn sleep_until_next_poll(
    started: Instant,
    interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let remaining = interval.saturating_sub(started.elapsed());
    if remaining.is_zero() {
        return *shutdown.borrow();
    }

    let changed = tokio::select! {
        _ = tokio::time::sleep(remaining) => None,
        changed = shutdown.changed() => Some(changed.is_ok()),
    };

    match changed {
        None | Some(true) => *shutdown.borrow(),
        // Sender dropped, nobody can ask us to stop anymore
        Some(false) => {
            tokio::time::sleep(interval.saturating_sub(started.elapsed())).await;
            false
        }
    }
}

pub(crate) fn log_market(question: &str, poll: u64, prices: &MarketPrices) {
    info!(
        poll,
        market = %question,
        probability = %format!("{:.2}%", prices.implied_probability() * Decimal::ONE_HUNDRED),
        yes_price = %prices.yes_price.round_dp(4),
        no_price = %prices.no_price.round_dp(4),
        "Market data"
    );
}

pub(crate) fn log_position(summary: &PositionSummary) {
    if !summary.has_position() {
        info!("Position: none");
        return;
    }

    let invested = format_pnl(summary.total_invested);
    let current_value = format_pnl(summary.pnl.total_value);
    info!(
        yes_shares = %summary.yes_shares.round_dp(2),
        avg_cost_yes = %summary.avg_cost_yes.round_dp(4),
        no_shares = %summary.no_shares.round_dp(2),
        avg_cost_no = %summary.avg_cost_no.round_dp(4),
        invested = %invested.trim_start_matches('+'),
        current_value = %current_value.trim_start_matches('+'),
        unrealized = %format_pnl(summary.pnl.unrealized_pnl),
        net_pnl = %format_pnl(summary.pnl.net_pnl),
        roi = %format_roi(summary.pnl.roi),
        hedged = summary.is_hedged,
        "Position"
    );
    if summary.is_hedged {
        let net_cost = summary.total_invested - summary.total_withdrawn;
        let scenarios =
            PnlCalculator::final_outcome_scenarios(summary.yes_shares, summary.no_shares, net_cost);
        info!(
            locked_pnl = %format_pnl(summary.locked_pnl),
            if_yes_wins = %format_pnl(scenarios.pnl_if_yes_wins),
            if_no_wins = %format_pnl(scenarios.pnl_if_no_wins),
            guaranteed = %format_pnl(scenarios.guaranteed_min),
            "Hedge active"
        );
    }
}

pub(crate) fn log_action(action: &Action) {
    match action {
        Action::TakeProfit { .. } | Action::StopLoss { .. } => {
            warn!(action = %action.kind(), reason = %action.reason(), "Action")
        }
        _ => info!(action = %action.kind(), reason = %action.reason(), "Action"),
    }
}
