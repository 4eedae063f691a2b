//! Backtest command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{info, warn};
use trading_backtest::BacktestSimulator;
use trading_config::AppConfig;

use super::load_symbols;
use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, config: AppConfig) -> Result<()> {
    let mut data = load_symbols(&args.data, &args.symbols)?;

    let mut backtest = config.backtest;
    if let Some(capital) = args.capital {
        backtest.initial_capital =
            Decimal::try_from(capital).context("Invalid --capital value")?;
    }
    if args.save.is_some() {
        backtest.output_dir = args.save.clone();
    }

    let min_points = backtest.min_data_points;
    data.retain(|symbol, bars| {
        let enough = bars.len() >= min_points;
        if !enough {
            warn!(symbol = %symbol, bars = bars.len(), min_points, "Skipping symbol with too few bars");
        }
        enough
    });
    if data.is_empty() {
        anyhow::bail!("No symbol has at least {} bars", min_points);
    }

    let simulator = BacktestSimulator::new(
        backtest,
        config.strategy,
        config.risk,
        config.costs,
        config.session,
    )
    .context("Invalid backtest configuration")?;

    let report = simulator.run(&data).context("Backtest failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(dir) = &simulator.config().output_dir {
        let files = report
            .save(dir)
            .with_context(|| format!("Failed to save results to {}", dir.display()))?;
        info!(files = files.len(), "Results saved to {:?}", dir);
    }

    Ok(())
}
