//! Configuration loader

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use super::types::{AdvisorProvider, AppConfig};
use crate::common::errors::{AgentError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__, e.g. APP__STRATEGY__TAKE_PROFIT_THRESHOLD)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| AgentError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| AgentError::Configuration(e.to_string()))
}

/// Load configuration from flat environment variables only
///
/// Reads `.env` first if present.
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from flat variable names
///
/// Unset variables keep their defaults; set but unparseable ones are errors.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = AppConfig::default();

    // Market
    if let Some(v) = get("MARKET_CONDITION_ID") {
        config.market.condition_id = v;
    }
    if let Some(v) = get("MARKET_QUESTION") {
        config.market.question = v;
    }
    config.market.yes_token_id = get("YES_TOKEN_ID");
    config.market.no_token_id = get("NO_TOKEN_ID");
    if let Some(v) = get("POLYMARKET_GAMMA_URL") {
        config.market.gamma_url = v;
    }
    if let Some(v) = get("POLYMARKET_CLOB_URL") {
        config.market.clob_url = v;
    }

    // Strategy
    if let Some(v) = get("ENTRY_PROBABILITY") {
        config.strategy.entry_probability = parse_decimal("ENTRY_PROBABILITY", &v)?;
    }
    if let Some(v) = get("TAKE_PROFIT_PROBABILITY") {
        config.strategy.take_profit_threshold = parse_decimal("TAKE_PROFIT_PROBABILITY", &v)?;
    }
    if let Some(v) = get("STOP_LOSS_PROBABILITY") {
        config.strategy.stop_loss_threshold = parse_decimal("STOP_LOSS_PROBABILITY", &v)?;
    }
    if let Some(v) = get("HEDGE_SELL_PERCENT") {
        config.strategy.hedge_sell_fraction = parse_decimal("HEDGE_SELL_PERCENT", &v)?;
    }

    // Wallet
    config.wallet.private_key = get("PRIVATE_KEY").or_else(|| get("POLYGON_WALLET_PRIVATE_KEY"));
    if let Some(v) = get("POLYGON_RPC_URL") {
        config.wallet.rpc_url = v;
    }
    if let Some(v) = get("CHAIN_ID") {
        config.wallet.chain_id = parse_number("CHAIN_ID", &v)?;
    }
    config.wallet.api_key = get("POLYMARKET_API_KEY");
    config.wallet.api_secret = get("POLYMARKET_API_SECRET");
    config.wallet.api_passphrase = get("POLYMARKET_API_PASSPHRASE");
    if let Some(v) = get("MAX_SLIPPAGE_PERCENT") {
        config.wallet.max_slippage_percent = parse_decimal("MAX_SLIPPAGE_PERCENT", &v)?;
    }

    // Advisor
    if let Some(v) = get("ADVISOR_PROVIDER") {
        config.advisor.provider = match v.to_lowercase().as_str() {
            "openai" => AdvisorProvider::OpenAi,
            "anthropic" | "claude" => AdvisorProvider::Anthropic,
            "gemini" => AdvisorProvider::Gemini,
            other => {
                return Err(AgentError::Configuration(format!(
                    "ADVISOR_PROVIDER must be openai, anthropic or gemini, got {}",
                    other
                )))
            }
        };
    }
    config.advisor.api_key = match config.advisor.provider {
        AdvisorProvider::OpenAi => get("OPENAI_API_KEY"),
        AdvisorProvider::Anthropic => get("ANTHROPIC_API_KEY").or_else(|| get("CLAUDE_API_KEY")),
        AdvisorProvider::Gemini => get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY")),
    };
    config.advisor.model = get("ADVISOR_MODEL");
    config.advisor.base_url = get("ADVISOR_BASE_URL");
    config.advisor.enabled = match get("ADVISOR_ENABLED") {
        Some(v) => parse_bool(&v),
        None => config.advisor.api_key.is_some(),
    };
    if let Some(v) = get("ADVISOR_MIN_CONFIDENCE") {
        config.advisor.min_override_confidence = parse_number("ADVISOR_MIN_CONFIDENCE", &v)?;
    }

    // Settings
    if let Some(v) = get("POLL_INTERVAL_SECONDS") {
        config.settings.poll_interval_seconds = parse_number("POLL_INTERVAL_SECONDS", &v)?;
    }
    if let Some(v) = get("DEMO_MODE") {
        config.settings.demo_mode = parse_bool(&v);
    }
    if let Some(v) = get("POSITION_FILE") {
        config.settings.position_file = v.into();
    }
    if let Some(v) = get("LOG_LEVEL") {
        config.settings.log_level = v;
    }

    Ok(config)
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|e| AgentError::Configuration(format!("{} is not a number ({}): {}", key, value, e)))
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AgentError::Configuration(format!("{} is not a number ({}): {}", key, value, e)))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_flat_env_names() {
        let config = from_lookup(lookup(&[
            ("MARKET_CONDITION_ID", "0xABC"),
            ("TAKE_PROFIT_PROBABILITY", "0.90"),
            ("STOP_LOSS_PROBABILITY", "0.70"),
            ("HEDGE_SELL_PERCENT", "0.6"),
            ("POLL_INTERVAL_SECONDS", "5"),
            ("DEMO_MODE", "FALSE"),
            ("POLYGON_WALLET_PRIVATE_KEY", "abcdef"),
        ]))
        .unwrap();

        assert_eq!(config.market.condition_id, "0xABC");
        assert_eq!(config.strategy.take_profit_threshold, dec!(0.90));
        assert_eq!(config.strategy.stop_loss_threshold, dec!(0.70));
        assert_eq!(config.strategy.hedge_sell_fraction, dec!(0.6));
        assert_eq!(config.settings.poll_interval_seconds, 5);
        assert!(!config.settings.demo_mode);
        assert_eq!(config.wallet.private_key.as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.strategy.take_profit_threshold, dec!(0.85));
        assert!(config.settings.demo_mode);
        assert!(!config.advisor.enabled);
    }

    #[test]
    fn test_private_key_precedence() {
        let config = from_lookup(lookup(&[
            ("PRIVATE_KEY", "0x01"),
            ("POLYGON_WALLET_PRIVATE_KEY", "0x02"),
        ]))
        .unwrap();
        assert_eq!(config.wallet.private_key.as_deref(), Some("0x01"));
    }

    #[test]
    fn test_advisor_enabled_by_api_key() {
        let config = from_lookup(lookup(&[
            ("ADVISOR_PROVIDER", "anthropic"),
            ("CLAUDE_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(config.advisor.provider, AdvisorProvider::Anthropic);
        assert_eq!(config.advisor.api_key.as_deref(), Some("sk-test"));
        assert!(config.advisor.enabled);
    }

    #[test]
    fn test_gemini_provider_reads_google_key() {
        let config = from_lookup(lookup(&[
            ("ADVISOR_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "g-test"),
        ]))
        .unwrap();
        assert_eq!(config.advisor.provider, AdvisorProvider::Gemini);
        assert_eq!(config.advisor.api_key.as_deref(), Some("g-test"));
        assert!(config.advisor.enabled);
    }

    #[test]
    fn test_unparseable_value_is_error() {
        let result = from_lookup(lookup(&[("TAKE_PROFIT_PROBABILITY", "high")]));
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/nonexistent/config.toml"));
        // market.condition_id has a default, so deserialisation succeeds
        assert!(config.is_ok());
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[market]
condition_id = "0xdef"
question = "Will it rain?"

[strategy]
take_profit_threshold = 0.9
stop_loss_threshold = 0.7

[settings]
poll_interval_seconds = 10
"#,
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.market.condition_id, "0xdef");
        assert_eq!(config.market.question, "Will it rain?");
        assert_eq!(config.strategy.take_profit_threshold, dec!(0.9));
        assert_eq!(config.strategy.hedge_sell_fraction, dec!(1.0));
        assert_eq!(config.settings.poll_interval_seconds, 10);
    }
}
