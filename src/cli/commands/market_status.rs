//! Market status command implementation.

use anyhow::{Context, Result};
use trading_config::AppConfig;
use trading_core::timing::TimingPolicy;
use trading_core::traits::{Clock, SystemClock};
use trading_data::parse_timestamp;

use crate::cli::{MarketStatusArgs, OutputFormat};

pub async fn run(args: MarketStatusArgs, config: AppConfig) -> Result<()> {
    let clock = SystemClock::new(config.session.utc_offset_minutes);
    let at = match &args.at {
        Some(text) => parse_timestamp(text).with_context(|| format!("Invalid --at time '{}'", text))?,
        None => clock.now(),
    };

    let timing = TimingPolicy::new(config.session);
    let status = timing.market_status(at);

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => {
            println!("Market status at {}", status.time.format("%Y-%m-%d %H:%M:%S"));
            println!("  Market open:         {}", status.is_market_open);
            println!("  Weekend:             {}", status.is_weekend);
            println!("  Holiday:             {}", status.is_holiday);
            println!("  Signals allowed:     {}", status.can_generate_signals);
            println!("  Square-off due:      {}", status.should_square_off);
            println!(
                "  Until square-off:    {}",
                status.time_until_square_off.as_deref().unwrap_or("-")
            );
            if !timing.is_trading_day(at.date()) {
                println!("  Next trading day:    {}", timing.next_trading_day(at.date()));
            }
        }
    }

    Ok(())
}
