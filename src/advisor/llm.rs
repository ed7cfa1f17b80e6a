use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Advice, AdvisoryContext};
use crate::common::errors::Result;
use crate::common::traits::Advisor;
use crate::strategy::ActionKind;

/// Client for large language model text completion.
///
/// Implementations wrap a provider API and handle authentication and
/// response parsing.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Send a system and a user prompt, return the generated text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Advisor backed by an [`Llm`]
pub struct LlmAdvisor {
    llm: Arc<dyn Llm>,
}

impl LlmAdvisor {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Advisor for LlmAdvisor {
    async fn advise(&self, ctx: &AdvisoryContext<'_>) -> Advice {
        let system = build_system_prompt();
        let prompt = build_user_prompt(ctx);

        match self.llm.complete(&system, &prompt).await {
            Ok(text) => {
                debug!(provider = self.llm.name(), response = %text, "AI response");
                parse_response(&text, ctx.rule_action)
            }
            Err(e) => {
                warn!(provider = self.llm.name(), error = %e, "AI analysis failed, using rules only");
                Advice::fallback(ctx.rule_action, &e)
            }
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

pub fn build_system_prompt() -> String {
    "You are an expert trading advisor for prediction markets on Polymarket.

Your role is to analyze market conditions and provide trading recommendations.
Be conservative and prioritize capital preservation. Focus on probabilities and
position metrics, and give specific reasoning for every recommendation.

You can recommend one of these actions:
- CONFIRM: Agree with the rule-based recommendation
- OVERRIDE_HOLD: Hold instead
- OVERRIDE_SELL: Sell everything (stop loss) instead
- OVERRIDE_TAKE_PROFIT: Take profit and hedge instead

Format your response as:
RECOMMENDATION: [action]
CONFIDENCE: [0-100]
REASONING: [2-3 sentences explaining your analysis]"
        .to_string()
}

pub fn build_user_prompt(ctx: &AdvisoryContext<'_>) -> String {
    let s = ctx.summary;
    let probability = ctx.current_probability * rust_decimal::Decimal::ONE_HUNDRED;
    format!(
        "Analyze this Polymarket trading situation:

MARKET: {question}

CURRENT SITUATION:
- Market probability: {probability:.2}%
- Your position: {yes:.0} YES shares, {no:.0} NO shares
- Total invested: ${invested:.2}
- Current P&L: ${pnl:.2} ({roi:.1}% ROI)

RULE-BASED RECOMMENDATION: {rule}

ANALYSIS NEEDED:
1. Is the current probability ({probability:.1}%) reasonable for this market?
2. Given the position and P&L, what's the risk/reward of holding vs exiting?
3. Should we follow the rule-based recommendation or override it?

Provide your recommendation (CONFIRM, OVERRIDE_HOLD, OVERRIDE_SELL, or OVERRIDE_TAKE_PROFIT),
confidence level (0-100), and clear reasoning.",
        question = ctx.question,
        probability = probability,
        yes = s.yes_shares,
        no = s.no_shares,
        invested = s.total_invested,
        pnl = s.pnl.net_pnl,
        roi = s.pnl.roi,
        rule = ctx.rule_action,
    )
}

/// Parse the `RECOMMENDATION:` / `CONFIDENCE:` / `REASONING:` lines
///
/// Unknown or missing fields keep the rule action, a confidence of 50 and
/// the raw text as reasoning.
pub fn parse_response(response: &str, rule_action: ActionKind) -> Advice {
    let mut advice = Advice {
        enabled: true,
        recommendation: rule_action,
        confidence: Some(50),
        reasoning: response.trim().to_string(),
    };

    for line in response.lines().map(str::trim) {
        if let Some(rec) = line.strip_prefix("RECOMMENDATION:") {
            let rec = rec.trim().to_uppercase();
            advice.recommendation = if rec.contains("CONFIRM") {
                rule_action
            } else if rec.contains("HOLD") {
                ActionKind::Hold
            } else if rec.contains("SELL") || rec.contains("STOP") {
                ActionKind::StopLoss
            } else if rec.contains("TAKE_PROFIT") {
                ActionKind::TakeProfit
            } else {
                advice.recommendation
            };
        } else if let Some(conf) = line.strip_prefix("CONFIDENCE:") {
            advice.confidence = Some(first_number(conf).map(|n| n.min(100) as u8).unwrap_or(50));
        } else if let Some(reasoning) = line.strip_prefix("REASONING:") {
            advice.reasoning = reasoning.trim().to_string();
        }
    }

    advice
}

fn first_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u64>().ok().map(|n| n.min(u32::MAX as u64) as u32)
}
