//! Application configuration: TOML file, `APP__` environment overrides and
//! the agent's flat environment variables

pub mod loader;
pub mod types;

pub use loader::{from_lookup, load_config, load_from_env};
pub use types::{
    AdvisorConfig, AdvisorProvider, ApiCredentials, AppConfig, AppSettings, MarketConfig,
    StrategyConfig, WalletConfig,
};
