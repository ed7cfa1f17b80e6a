//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{AgentError, Result};
use crate::common::retry::{RetryPolicy, MAX_RETRY_DELAY};
use crate::common::types::OutcomeTokens;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Market being traded
    #[serde(default)]
    pub market: MarketConfig,
    /// Thresholds and hedge sizing
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Signing key and CLOB credentials
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Optional LLM advisor
    #[serde(default)]
    pub advisor: AdvisorConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Check every constraint the agent relies on
    ///
    /// Also normalises the private key to a `0x` prefix. Credentials are
    /// only required when orders are actually dispatched.
    pub fn validate(&mut self) -> Result<()> {
        if self.market.condition_id.trim().is_empty() {
            return Err(AgentError::Configuration(
                "market.condition_id is required".to_string(),
            ));
        }

        self.strategy.validate()?;

        if self.settings.poll_interval_seconds == 0 {
            return Err(AgentError::Configuration(
                "settings.poll_interval_seconds must be greater than 0".to_string(),
            ));
        }

        self.settings.validate()?;

        check_url("market.gamma_url", &self.market.gamma_url)?;
        check_url("market.clob_url", &self.market.clob_url)?;
        if let Some(base_url) = &self.advisor.base_url {
            check_url("advisor.base_url", base_url)?;
        }

        self.wallet.normalize_private_key();

        if !self.settings.demo_mode {
            let mut missing = Vec::new();
            if is_blank(&self.wallet.private_key) {
                missing.push("wallet.private_key");
            }
            if is_blank(&self.market.yes_token_id) {
                missing.push("market.yes_token_id");
            }
            if is_blank(&self.market.no_token_id) {
                missing.push("market.no_token_id");
            }
            if is_blank(&self.wallet.api_key) {
                missing.push("wallet.api_key");
            }
            if is_blank(&self.wallet.api_secret) {
                missing.push("wallet.api_secret");
            }
            if is_blank(&self.wallet.api_passphrase) {
                missing.push("wallet.api_passphrase");
            }
            if !missing.is_empty() {
                return Err(AgentError::Configuration(format!(
                    "Missing required configuration for live trading: {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(())
    }
}

fn check_url(name: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| AgentError::Configuration(format!("{} is not a valid URL ({}): {}", name, value, e)))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

/// Market being traded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Condition ID of the binary market
    #[serde(default)]
    pub condition_id: String,
    /// Human-readable question, used in logs and advisor prompts
    #[serde(default = "default_question")]
    pub question: String,
    /// CLOB token id of the YES outcome
    #[serde(default)]
    pub yes_token_id: Option<String>,
    /// CLOB token id of the NO outcome
    #[serde(default)]
    pub no_token_id: Option<String>,
    /// Gamma API URL for market data
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    /// Base URL for the CLOB REST API
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            condition_id: String::new(),
            question: default_question(),
            yes_token_id: None,
            no_token_id: None,
            gamma_url: default_gamma_url(),
            clob_url: default_clob_url(),
        }
    }
}

impl MarketConfig {
    /// Both token ids, if configured
    pub fn outcome_tokens(&self) -> Option<OutcomeTokens> {
        match (&self.yes_token_id, &self.no_token_id) {
            (Some(yes), Some(no)) => Some(OutcomeTokens::new(yes.clone(), no.clone())),
            _ => None,
        }
    }
}

fn default_question() -> String {
    "Unknown market".to_string()
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

/// Strategy thresholds
///
/// Requires `0 < stop_loss < take_profit < 1` and `0 < hedge_sell_fraction <= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_take_profit")]
    pub take_profit_threshold: Decimal,
    #[serde(default = "default_stop_loss")]
    pub stop_loss_threshold: Decimal,
    /// Fraction of YES sold when hedging
    #[serde(default = "default_hedge_fraction")]
    pub hedge_sell_fraction: Decimal,
    /// Probability the position is expected to be opened at
    #[serde(default = "default_entry_probability")]
    pub entry_probability: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            take_profit_threshold: default_take_profit(),
            stop_loss_threshold: default_stop_loss(),
            hedge_sell_fraction: default_hedge_fraction(),
            entry_probability: default_entry_probability(),
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        let sl = self.stop_loss_threshold;
        let tp = self.take_profit_threshold;
        if !(Decimal::ZERO < sl && sl < tp && tp < Decimal::ONE) {
            return Err(AgentError::Configuration(format!(
                "Invalid thresholds: 0 < stop_loss ({}) < take_profit ({}) < 1 required",
                sl, tp
            )));
        }

        let fraction = self.hedge_sell_fraction;
        if !(Decimal::ZERO < fraction && fraction <= Decimal::ONE) {
            return Err(AgentError::Configuration(format!(
                "Invalid hedge_sell_fraction: {} (must be in (0, 1])",
                fraction
            )));
        }

        Ok(())
    }
}

fn default_take_profit() -> Decimal {
    dec!(0.85)
}

fn default_stop_loss() -> Decimal {
    dec!(0.78)
}

fn default_hedge_fraction() -> Decimal {
    dec!(1.0)
}

fn default_entry_probability() -> Decimal {
    dec!(0.80)
}

/// Wallet and CLOB API credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Hex private key of the trading wallet
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// CLOB L2 API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// CLOB L2 API secret (base64)
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub api_passphrase: Option<String>,
    /// Tolerance applied to limit prices of dispatched orders
    #[serde(default = "default_max_slippage")]
    pub max_slippage_percent: Decimal,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            api_key: None,
            api_secret: None,
            api_passphrase: None,
            max_slippage_percent: default_max_slippage(),
        }
    }
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.masked_private_key())
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("api_key", &self.api_key)
            .field("max_slippage_percent", &self.max_slippage_percent)
            .finish_non_exhaustive()
    }
}

impl WalletConfig {
    fn normalize_private_key(&mut self) {
        if let Some(key) = self.private_key.as_mut() {
            let trimmed = key.trim();
            if !trimmed.is_empty() && !trimmed.starts_with("0x") {
                *key = format!("0x{}", trimmed);
            }
        }
    }

    /// First six and last four characters, for logs
    pub fn masked_private_key(&self) -> String {
        match self.private_key.as_deref() {
            None | Some("") => "NOT SET".to_string(),
            Some(key) => match (key.get(..6), key.get(key.len().saturating_sub(4)..)) {
                (Some(head), Some(tail)) if key.len() > 10 => format!("{}...{}", head, tail),
                _ => "***".to_string(),
            },
        }
    }

    pub fn network_name(&self) -> &'static str {
        if self.chain_id == POLYGON_MAINNET_CHAIN_ID {
            "Polygon Mainnet"
        } else {
            "Polygon Amoy Testnet"
        }
    }
}

pub const POLYGON_MAINNET_CHAIN_ID: u64 = 137;

fn default_rpc_url() -> String {
    "https://polygon-rpc.com".to_string()
}

fn default_chain_id() -> u64 {
    POLYGON_MAINNET_CHAIN_ID
}

fn default_max_slippage() -> Decimal {
    dec!(2.0)
}

/// LLM backend of the advisor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorProvider {
    #[default]
    OpenAi,
    Anthropic,
    /// Gemini through Google's OpenAI-compatible endpoint
    Gemini,
}

/// Optional LLM advisory layer
#[derive(Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: AdvisorProvider,
    /// Model name, provider default when unset
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for OpenAI-compatible endpoints
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Minimum confidence (0-100) needed to override the rule action
    #[serde(default = "default_min_override_confidence")]
    pub min_override_confidence: u8,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: AdvisorProvider::default(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            min_override_confidence: default_min_override_confidence(),
        }
    }
}

impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("min_override_confidence", &self.min_override_confidence)
            .finish_non_exhaustive()
    }
}

fn default_temperature() -> f32 {
    0.3
}

fn default_min_override_confidence() -> u8 {
    70
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Simulate trades instead of dispatching orders
    #[serde(default = "default_demo_mode")]
    pub demo_mode: bool,
    /// Where the ledger is persisted
    #[serde(default = "default_position_file")]
    pub position_file: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Attempts per market-data fetch
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            demo_mode: default_demo_mode(),
            position_file: default_position_file(),
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

/// Upper bound on attempts per market-data fetch
pub const MAX_FETCH_ATTEMPTS: u32 = 10;

impl AppSettings {
    /// Retry settings must describe a finite schedule
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 || self.max_retries > MAX_FETCH_ATTEMPTS {
            return Err(AgentError::Configuration(format!(
                "settings.max_retries must be within 1..={}, got {}",
                MAX_FETCH_ATTEMPTS, self.max_retries
            )));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(AgentError::Configuration(format!(
                "settings.backoff_factor must be a finite number >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        if self.initial_retry_delay_ms > MAX_RETRY_DELAY.as_millis() as u64 {
            return Err(AgentError::Configuration(format!(
                "settings.initial_retry_delay_ms must not exceed {}, got {}",
                MAX_RETRY_DELAY.as_millis(),
                self.initial_retry_delay_ms
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Retry schedule for market-data fetches
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_retry_delay_ms),
            self.backoff_factor,
        )
    }
}

fn default_poll_interval() -> u64 {
    20
}

fn default_demo_mode() -> bool {
    true
}

fn default_position_file() -> PathBuf {
    PathBuf::from("position.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_retry_delay() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }

    /// Credentials from the wallet section, if all three are present
    pub fn from_wallet(wallet: &WalletConfig) -> Option<Self> {
        Some(Self::new(
            wallet.api_key.clone()?,
            wallet.api_secret.clone()?,
            wallet.api_passphrase.clone()?,
        ))
    }
}
