//! ADX crossover trading engine CLI.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::load_validated;
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ValidateConfig { show } = cli.command {
        return cli::commands::validate::run(cli.config_path(), show).await;
    }

    let config = load_validated(cli.config_path()).with_context(|| {
        format!("Failed to load configuration from {}", cli.config.display())
    })?;

    // Setup logging
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let _guard = setup_logging(
        &level,
        cli.json_logs || config.logging.json,
        config.logging.directory.as_deref(),
    )
    .context("Failed to initialise logging")?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Paper(args) => cli::commands::paper::run(args, config).await,
        Commands::MarketStatus(args) => cli::commands::market_status::run(args, config).await,
        Commands::ValidateConfig { .. } => Ok(()),
    }
}
