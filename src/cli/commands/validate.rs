//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::{load_config, to_toml_string};

pub async fn run(config_path: Option<&Path>, show: bool) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {:?}", path),
        None => println!("Validating built-in defaults and environment"),
    }

    let config = match load_config(config_path).and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    println!("Configuration is valid!");
    println!();
    println!("App: {} ({})", config.app.name, config.app.mode);
    println!("Log level: {}", config.logging.level);
    println!(
        "Strategy: DI period {}, min confidence {:.2}, stop {}%",
        config.strategy.di_period, config.strategy.min_confidence, config.strategy.trailing_stop_pct
    );
    println!(
        "Risk: {}% per trade, max {} positions, max {} trades/day, daily loss limit {}%",
        config.risk.risk_per_trade_pct,
        config.risk.max_positions,
        config.risk.max_daily_trades,
        config.risk.max_daily_loss_pct
    );
    println!(
        "Session: {} - {}, cutoff {}, square-off {}",
        config.session.market_open.format("%H:%M"),
        config.session.market_close.format("%H:%M"),
        config.session.signal_cutoff.format("%H:%M"),
        config.session.square_off.format("%H:%M")
    );

    if show {
        println!();
        println!("{}", to_toml_string(&config)?);
    }

    Ok(())
}
