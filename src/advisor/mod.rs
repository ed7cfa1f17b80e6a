//! Optional LLM advisory layer
//!
//! An [`Advisor`] confirms or overrides the rule-based action. It never
//! fails: any provider or parse error falls back to the rule action, and
//! [`blend`] decides whether the advice is strong enough to act on.

mod anthropic;
mod llm;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use anthropic::AnthropicLlm;
pub use llm::{build_system_prompt, build_user_prompt, parse_response, Llm, LlmAdvisor};
pub use openai::OpenAiLlm;

use crate::common::errors::{AgentError, Result};
use crate::common::traits::Advisor;
use crate::common::types::MarketPrices;
use crate::config::{AdvisorConfig, AdvisorProvider};
use crate::position::PositionSummary;
use crate::strategy::{Action, ActionKind};

/// Everything the advisor sees for one poll
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    pub question: &'a str,
    pub current_probability: Decimal,
    pub summary: &'a PositionSummary,
    pub rule_action: ActionKind,
}

/// Advisor verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    /// False when no model was consulted
    pub enabled: bool,
    pub recommendation: ActionKind,
    /// 0-100, `None` when no model was consulted
    pub confidence: Option<u8>,
    pub reasoning: String,
}

impl Advice {
    /// Echo of the rule action
    pub fn disabled(rule_action: ActionKind) -> Self {
        Self {
            enabled: false,
            recommendation: rule_action,
            confidence: None,
            reasoning: "AI disabled - using rules only".to_string(),
        }
    }

    /// Rule action kept after an advisor failure
    pub fn fallback(rule_action: ActionKind, error: &AgentError) -> Self {
        Self {
            enabled: true,
            recommendation: rule_action,
            confidence: None,
            reasoning: format!("AI error: {} - using rules only", error),
        }
    }
}

/// Advisor that always agrees with the rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl Advisor for DisabledAdvisor {
    async fn advise(&self, ctx: &AdvisoryContext<'_>) -> Advice {
        Advice::disabled(ctx.rule_action)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Build the advisor described by `config`
///
/// # Errors
/// `Configuration` when the advisor is enabled without an API key.
pub fn build_advisor(config: &AdvisorConfig) -> Result<Arc<dyn Advisor>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledAdvisor));
    }

    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AgentError::Configuration("advisor.api_key is required when the advisor is enabled".to_string()))?;

    let llm: Arc<dyn Llm> = match config.provider {
        AdvisorProvider::OpenAi => Arc::new(OpenAiLlm::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.temperature,
        )),
        AdvisorProvider::Anthropic => Arc::new(AnthropicLlm::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.temperature,
        )),
        AdvisorProvider::Gemini => Arc::new(OpenAiLlm::gemini(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.temperature,
        )),
    };

    info!(provider = llm.name(), model = llm.model(), "AI advisor enabled");
    Ok(Arc::new(LlmAdvisor::new(llm)))
}

/// Final action after weighing the advice against the rules
///
/// The advice replaces the rule action only when it came from a model,
/// disagrees, meets `min_confidence`, and a position is open. A take-profit
/// override additionally needs unhedged YES shares.
pub fn blend(
    rule_action: Action,
    advice: &Advice,
    summary: &PositionSummary,
    prices: &MarketPrices,
    min_confidence: u8,
) -> Action {
    let rule_kind = rule_action.kind();
    if !advice.enabled || advice.recommendation == rule_kind {
        if advice.enabled {
            info!(
                action = %rule_kind,
                confidence = advice.confidence.unwrap_or(0),
                "AI confirms"
            );
        }
        return rule_action;
    }

    let confidence = advice.confidence.unwrap_or(0);
    if rule_kind == ActionKind::Wait || !summary.has_position() {
        return rule_action;
    }
    if confidence < min_confidence {
        info!(
            rule = %rule_kind,
            advice = %advice.recommendation,
            confidence,
            min_confidence,
            "AI disagrees below override confidence, keeping rule action"
        );
        return rule_action;
    }

    let current_probability = rule_action.current_probability();
    let reason = format!("AI override ({}% confidence): {}", confidence, advice.reasoning);
    let overridden = match advice.recommendation {
        ActionKind::Hold => Action::Hold {
            reason,
            current_probability,
            unrealized_pnl: summary.pnl.unrealized_pnl,
            is_hedged: summary.is_hedged,
        },
        ActionKind::TakeProfit if summary.yes_shares > Decimal::ZERO && summary.no_shares == Decimal::ZERO => {
            Action::TakeProfit {
                reason,
                current_probability,
                yes_price: prices.yes_price,
                no_price: prices.no_price,
            }
        }
        ActionKind::StopLoss => Action::StopLoss {
            reason,
            current_probability,
            yes_price: prices.yes_price,
            no_price: prices.no_price,
        },
        other => {
            warn!(advice = %other, rule = %rule_kind, "Ignoring AI recommendation that cannot apply");
            return rule_action;
        }
    };

    info!(
        rule = %rule_kind,
        advice = %overridden.kind(),
        confidence,
        reasoning = %truncate(&advice.reasoning, 100),
        "AI override"
    );
    overridden
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{MemoryStore, Position};
    use crate::common::types::OutcomeSide;
    use rust_decimal_macros::dec;

    async fn summary_with_yes() -> PositionSummary {
        let mut position = Position::new(Arc::new(MemoryStore::new()));
        position
            .open_position(dec!(1250), dec!(0.80), OutcomeSide::Yes, None, false)
            .await
            .unwrap();
        position.position_summary(dec!(0.80), dec!(0.20))
    }

    fn hold() -> Action {
        Action::Hold {
            reason: "Within thresholds".to_string(),
            current_probability: dec!(0.80),
            unrealized_pnl: Decimal::ZERO,
            is_hedged: false,
        }
    }

    fn advice(recommendation: ActionKind, confidence: u8) -> Advice {
        Advice {
            enabled: true,
            recommendation,
            confidence: Some(confidence),
            reasoning: "Momentum is fading".to_string(),
        }
    }

    fn prices() -> MarketPrices {
        MarketPrices::new(dec!(0.80), dec!(0.20)).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_advice_keeps_rule() {
        let summary = summary_with_yes().await;
        let result = blend(hold(), &Advice::disabled(ActionKind::Hold), &summary, &prices(), 70);
        assert_eq!(result, hold());
    }

    #[tokio::test]
    async fn test_confident_override() {
        let summary = summary_with_yes().await;
        let result = blend(hold(), &advice(ActionKind::StopLoss, 85), &summary, &prices(), 70);
        assert_eq!(result.kind(), ActionKind::StopLoss);
        assert!(result.reason().contains("Momentum is fading"));
    }

    #[tokio::test]
    async fn test_low_confidence_keeps_rule() {
        let summary = summary_with_yes().await;
        let result = blend(hold(), &advice(ActionKind::StopLoss, 69), &summary, &prices(), 70);
        assert_eq!(result.kind(), ActionKind::Hold);
    }

    #[tokio::test]
    async fn test_wait_never_overridden() {
        let summary = Position::new(Arc::new(MemoryStore::new())).position_summary(dec!(0.8), dec!(0.2));
        let wait = Action::Wait {
            reason: "No position open".to_string(),
            current_probability: dec!(0.80),
        };
        let result = blend(wait.clone(), &advice(ActionKind::TakeProfit, 100), &summary, &prices(), 70);
        assert_eq!(result, wait);
    }

    #[tokio::test]
    async fn test_disabled_advisor_echoes() {
        let summary = summary_with_yes().await;
        let ctx = AdvisoryContext {
            question: "Q?",
            current_probability: dec!(0.80),
            summary: &summary,
            rule_action: ActionKind::Hold,
        };
        let advice = DisabledAdvisor.advise(&ctx).await;
        assert!(!advice.enabled);
        assert_eq!(advice.recommendation, ActionKind::Hold);
        assert!(!DisabledAdvisor.is_enabled());
    }

    #[test]
    fn test_build_advisor_requires_key() {
        let config = AdvisorConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(build_advisor(&config).is_err());
        assert!(!build_advisor(&AdvisorConfig::default()).unwrap().is_enabled());
    }

    #[test]
    fn test_build_gemini_advisor() {
        let config = AdvisorConfig {
            enabled: true,
            provider: AdvisorProvider::Gemini,
            api_key: Some("g-test".to_string()),
            ..Default::default()
        };
        assert!(build_advisor(&config).unwrap().is_enabled());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
