//! Open positions and the price updates that drive them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Direction, IndicatorSnapshot, Signal};

/// Why a position was closed. Variants are listed in evaluation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Mandatory square-off deadline reached
    TimeExit,
    /// Initial protective stop touched
    StopLoss,
    /// Profit target touched
    Target,
    /// Opposite directional crossover
    SignalExit,
    /// Tightened trailing stop breached
    TrailingStop,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitReason::TimeExit => "TIME_EXIT",
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::Target => "TARGET",
            ExitReason::SignalExit => "SIGNAL_EXIT",
            ExitReason::TrailingStop => "TRAILING_STOP",
        };
        f.write_str(name)
    }
}

/// Price information for one update of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub timestamp: NaiveDateTime,
    pub high: Decimal,
    pub low: Decimal,
    /// Last traded price
    pub close: Decimal,
}

impl PriceUpdate {
    /// A single-price update (tick).
    pub fn at(timestamp: NaiveDateTime, price: Decimal) -> Self {
        Self {
            timestamp,
            high: price,
            low: price,
            close: price,
        }
    }
}

/// An intraday position in a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    /// Fill price including entry slippage
    pub entry_price: Decimal,
    pub quantity: Decimal,
    /// Initial protective stop
    pub stop_loss: Decimal,
    /// Active stop, tightened by trailing
    pub current_stop_loss: Decimal,
    pub target_price: Decimal,
    /// Highest price seen since entry
    pub highest_price: Decimal,
    /// Lowest price seen since entry
    pub lowest_price: Decimal,
    pub entry_indicators: IndicatorSnapshot,
    pub entry_time: NaiveDateTime,
    pub must_exit_by: NaiveDateTime,
    pub current_price: Decimal,
    /// Marked to the last traded price
    pub unrealized_pnl: Decimal,
    pub is_closed: bool,
    pub exit_price: Option<Decimal>,
    pub exit_time: Option<NaiveDateTime>,
    pub exit_reason: Option<ExitReason>,
}

impl Position {
    /// Open a position from an admitted signal.
    pub fn from_signal(signal: &Signal, quantity: Decimal, entry_time: NaiveDateTime) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_price: signal.entry_price,
            quantity,
            stop_loss: signal.stop_loss,
            current_stop_loss: signal.stop_loss,
            target_price: signal.target_price,
            highest_price: signal.entry_price,
            lowest_price: signal.entry_price,
            entry_indicators: signal.indicators.clone(),
            entry_time,
            must_exit_by: signal.deadline,
            current_price: signal.entry_price,
            unrealized_pnl: Decimal::ZERO,
            is_closed: false,
            exit_price: None,
            exit_time: None,
            exit_reason: None,
        }
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    /// Profit of the whole quantity if closed at `price`, before costs.
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        match self.direction {
            Direction::Long => (price - self.entry_price) * self.quantity,
            Direction::Short => (self.entry_price - price) * self.quantity,
        }
    }

    /// Most favorable price reached since entry.
    pub fn best_price(&self) -> Decimal {
        match self.direction {
            Direction::Long => self.highest_price,
            Direction::Short => self.lowest_price,
        }
    }

    /// Most adverse price reached since entry.
    pub fn worst_price(&self) -> Decimal {
        match self.direction {
            Direction::Long => self.lowest_price,
            Direction::Short => self.highest_price,
        }
    }

    /// Unrealized profit marked at the most favorable price seen.
    pub fn best_case_pnl(&self) -> Decimal {
        self.pnl_at(self.best_price())
    }

    /// Entry notional.
    pub fn notional(&self) -> Decimal {
        self.entry_price * self.quantity
    }

    /// The active stop has moved away from the initial stop.
    pub fn stop_tightened(&self) -> bool {
        self.current_stop_loss != self.stop_loss
    }

    /// Apply a price update: extend the running extrema and mark to the last price.
    pub fn mark(&mut self, update: &PriceUpdate) {
        self.highest_price = self.highest_price.max(update.high);
        self.lowest_price = self.lowest_price.min(update.low);
        self.current_price = update.close;
        self.unrealized_pnl = self.pnl_at(update.close);
    }

    /// Minutes held until `now`.
    pub fn holding_minutes(&self, now: NaiveDateTime) -> f64 {
        crate::timing::holding_minutes(self.entry_time, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualityScores;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn signal(direction: Direction) -> Signal {
        Signal {
            symbol: "ITC".to_string(),
            direction,
            di_plus: 25.0,
            di_minus: 15.0,
            adx: 30.0,
            separation: 10.0,
            entry_price: dec!(100),
            stop_loss: dec!(95),
            target_price: dec!(110),
            confidence: 0.7,
            volume_ratio: 2.0,
            volume_at_signal: 1000.0,
            timestamp: at(10, 0),
            deadline: at(15, 20),
            risk_amount: dec!(5),
            reward_amount: dec!(10),
            risk_reward_ratio: dec!(2),
            quality: QualityScores::default(),
            indicators: IndicatorSnapshot {
                symbol: "ITC".to_string(),
                timestamp: at(10, 0),
                di_plus: 25.0,
                di_minus: 15.0,
                adx: 30.0,
                true_range: 1.0,
                dm_plus: 0.5,
                dm_minus: 0.0,
            },
        }
    }

    #[test]
    fn test_mark_tracks_extrema() {
        let mut position = Position::from_signal(&signal(Direction::Long), dec!(10), at(10, 0));

        position.mark(&PriceUpdate {
            timestamp: at(10, 5),
            high: dec!(104),
            low: dec!(99),
            close: dec!(103),
        });
        position.mark(&PriceUpdate::at(at(10, 10), dec!(101)));

        assert_eq!(position.highest_price, dec!(104));
        assert_eq!(position.lowest_price, dec!(99));
        assert_eq!(position.current_price, dec!(101));
        assert_eq!(position.unrealized_pnl, dec!(10));
        assert_eq!(position.best_case_pnl(), dec!(40));
    }

    #[test]
    fn test_short_pnl() {
        let mut position = Position::from_signal(&signal(Direction::Short), dec!(10), at(10, 0));
        position.mark(&PriceUpdate::at(at(10, 5), dec!(97)));

        assert_eq!(position.unrealized_pnl, dec!(30));
        assert_eq!(position.best_price(), dec!(97));
        assert_eq!(position.worst_price(), dec!(100));
        assert!((position.holding_minutes(at(10, 30)) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_exit_reason_display() {
        assert_eq!(ExitReason::TimeExit.to_string(), "TIME_EXIT");
        assert_eq!(ExitReason::TrailingStop.to_string(), "TRAILING_STOP");
        assert!(ExitReason::TimeExit < ExitReason::StopLoss);
    }
}
