//! Paper trading command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use trading_broker::PaperBroker;
use trading_config::AppConfig;
use trading_core::traits::ManualClock;
use trading_data::ReplayFeed;
use trading_live::{OrchestratorSettings, StrategyOrchestrator};
use trading_monitor::EventLogger;

use super::load_symbols;
use crate::cli::PaperArgs;

pub async fn run(args: PaperArgs, config: AppConfig) -> Result<()> {
    let data = load_symbols(&args.data, &args.symbols)?;
    let start = data
        .values()
        .filter_map(|bars| bars.first().map(|b| b.timestamp))
        .min()
        .context("No bars to replay")?;

    let mut feed = ReplayFeed::from_bars(&data);
    if args.pace_ms > 0 {
        feed = feed.with_pace(Duration::from_millis(args.pace_ms));
    }

    // Replay time follows the bars; cycles run after every event
    let clock = ManualClock::new(start);
    let broker = PaperBroker::new(Arc::new(clock.clone()));
    let mut live = config.live;
    live.cycle_on_event = true;

    let settings = OrchestratorSettings {
        symbols: data.keys().cloned().collect(),
        signal: config.strategy,
        risk: config.risk,
        costs: config.costs,
        session: config.session,
        live,
    };
    let sizer = settings.risk.sizer();

    let (logger, events) = EventLogger::new();
    let logger = tokio::spawn(logger.run());

    let mut orchestrator = StrategyOrchestrator::new(settings, broker.clone(), clock, sizer)
        .context("Invalid orchestrator configuration")?
        .with_events(events);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(mode = %config.app.mode, events = feed.len(), "Starting paper session");
    let metrics = orchestrator.run(&feed, shutdown_rx).await?;
    let open = orchestrator.positions().len();
    drop(orchestrator);
    let tally = logger.await.context("Event logger task failed")?;

    println!("Paper session finished");
    println!("  Orders sent:         {}", broker.order_count());
    println!("  Signals admitted:    {}", tally.admitted);
    println!("  Signals discarded:   {}", tally.discarded);
    println!("  Closed trades:       {}", metrics.total_trades);
    println!("  Win rate:            {:.2}%", metrics.win_rate * Decimal::ONE_HUNDRED);
    println!("  Total PnL:           {:.2}", metrics.total_pnl);
    println!("  Open positions:      {}", open);

    Ok(())
}
