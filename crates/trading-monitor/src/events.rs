//! Strategy event logging.

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::info;
use trading_live::StrategyEvent;

/// Counts of the events seen by an [`EventLogger`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTally {
    pub admitted: usize,
    pub discarded: usize,
    pub closed: usize,
    pub square_offs: usize,
    /// Net PnL of the closed positions
    pub realized_pnl: Decimal,
}

/// Drains orchestrator events and writes each one to the log.
pub struct EventLogger {
    rx: mpsc::UnboundedReceiver<StrategyEvent>,
    tally: EventTally,
}

impl EventLogger {
    /// Create a logger and the sender to hand to the orchestrator.
    pub fn new() -> (Self, mpsc::UnboundedSender<StrategyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx,
                tally: EventTally::default(),
            },
            tx,
        )
    }

    /// Log events until every sender is dropped.
    pub async fn run(mut self) -> EventTally {
        while let Some(event) = self.rx.recv().await {
            self.record(&event);
        }
        self.tally
    }

    fn record(&mut self, event: &StrategyEvent) {
        match event {
            StrategyEvent::SignalAdmitted {
                signal,
                quantity,
                order,
            } => {
                self.tally.admitted += 1;
                info!(
                    symbol = %signal.symbol,
                    direction = %signal.direction,
                    confidence = signal.confidence,
                    entry = %signal.entry_price,
                    stop = %signal.stop_loss,
                    target = %signal.target_price,
                    quantity = %quantity,
                    order_id = %order.order_id,
                    "Position opened"
                );
            }
            StrategyEvent::SignalDiscarded {
                symbol,
                direction,
                confidence,
                reason,
            } => {
                self.tally.discarded += 1;
                info!(
                    symbol = %symbol,
                    direction = %direction,
                    confidence = *confidence,
                    reason = %reason,
                    "Signal discarded"
                );
            }
            StrategyEvent::PositionClosed(trade) => {
                self.tally.closed += 1;
                self.tally.realized_pnl += trade.pnl;
                info!(
                    symbol = %trade.symbol,
                    direction = %trade.direction,
                    reason = %trade.exit_reason,
                    exit = %trade.exit_price.round_dp(2),
                    pnl = %trade.pnl.round_dp(2),
                    minutes = trade.holding_minutes,
                    "Position closed"
                );
            }
            StrategyEvent::SquaredOff { date, closed } => {
                self.tally.square_offs += 1;
                info!(date = %date, closed, "Square-off complete");
            }
        }
    }
}
