//! Polymarket Hedge Agent - Main Entry Point
//!
//! Polls one binary market and hedges the YES position into NO when the
//! take-profit level is reached, or exits at the stop-loss level.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use polymarket_hedge_agent::advisor::{build_advisor, DisabledAdvisor};
use polymarket_hedge_agent::agent::{AgentSettings, HedgeAgent};
use polymarket_hedge_agent::config::{load_config, load_from_env, AppConfig};
use polymarket_hedge_agent::polymarket::PolymarketClient;
use polymarket_hedge_agent::position::{JsonFileStore, Position};
use polymarket_hedge_agent::strategy::HedgingStrategy;
use polymarket_hedge_agent::Advisor;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file, flat environment variables are used when it is missing
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level or filter directive (overrides the configured level)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Stop after this many polls
    #[arg(long)]
    max_polls: Option<u64>,

    /// Where the position ledger is stored (overrides the configured path)
    #[arg(long)]
    position_file: Option<PathBuf>,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}

fn read_config(args: &Args) -> polymarket_hedge_agent::Result<AppConfig> {
    let mut config = if Path::new(&args.config).exists() {
        load_config(Some(&args.config))?
    } else {
        load_from_env()?
    };
    if let Some(path) = &args.position_file {
        config.settings.position_file = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn log_startup(config: &AppConfig, args: &Args) {
    info!(
        market_id = %config.market.condition_id,
        market = %config.market.question,
        entry_probability = %config.strategy.entry_probability,
        take_profit = %config.strategy.take_profit_threshold,
        stop_loss = %config.strategy.stop_loss_threshold,
        hedge_fraction = %config.strategy.hedge_sell_fraction,
        poll_interval_secs = config.settings.poll_interval_seconds,
        position_file = %config.settings.position_file.display(),
        "Configuration loaded"
    );
    info!(
        network = config.wallet.network_name(),
        wallet = %config.wallet.masked_private_key(),
        demo_mode = config.settings.demo_mode,
        max_polls = ?args.max_polls,
        "Trading mode"
    );
    if config.settings.demo_mode {
        warn!("DEMO MODE: trades are simulated and only recorded locally");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = read_config(&args);
    let level = args
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.settings.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level, args.log_json)?;

    info!("Starting Polymarket hedge agent");
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, config_file = %args.config, "Invalid configuration");
            return Err(e).context("configuration error");
        }
    };
    log_startup(&config, &args);

    let client = Arc::new(PolymarketClient::from_config(&config)?);
    let store = Arc::new(JsonFileStore::new(config.settings.position_file.clone()));
    let mut position = Position::load(store).context("failed to load position")?;

    let execute_trades = !config.settings.demo_mode;
    if execute_trades {
        match config.market.outcome_tokens() {
            Some(tokens) => position = position.with_executor(client.clone(), tokens),
            None => warn!("Outcome token ids missing, trades will only be recorded locally"),
        }
    }

    let strategy = HedgingStrategy::new(config.strategy.clone(), execute_trades);

    let advisor: Arc<dyn Advisor> = build_advisor(&config.advisor).unwrap_or_else(|e| {
        warn!(error = %e, "AI advisor unavailable, using rules only");
        Arc::new(DisabledAdvisor)
    });

    let mut agent = HedgeAgent::new(
        position,
        strategy,
        client,
        advisor,
        AgentSettings::from_config(&config),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, finishing current cycle...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    agent.run(shutdown_rx, args.max_polls).await;
    agent.shutdown().context("failed to save position on shutdown")?;

    info!("Agent shut down cleanly");
    Ok(())
}
