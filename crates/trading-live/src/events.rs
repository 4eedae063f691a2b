//! Events published by the orchestrator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use trading_core::types::{Direction, OrderResult, Signal, TradeResult};

/// Notification emitted on admissions, discards and closes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StrategyEvent {
    /// A signal became an open position
    SignalAdmitted {
        signal: Box<Signal>,
        quantity: Decimal,
        order: OrderResult,
    },
    /// A scored signal was not admitted
    SignalDiscarded {
        symbol: String,
        direction: Direction,
        confidence: f64,
        reason: String,
    },
    PositionClosed(Box<TradeResult>),
    /// All positions were closed at the mandatory square-off
    SquaredOff { date: NaiveDate, closed: usize },
}

impl StrategyEvent {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            StrategyEvent::SignalAdmitted { signal, .. } => Some(&signal.symbol),
            StrategyEvent::SignalDiscarded { symbol, .. } => Some(symbol),
            StrategyEvent::PositionClosed(trade) => Some(&trade.symbol),
            StrategyEvent::SquaredOff { .. } => None,
        }
    }
}
