//! Stop-loss management.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_core::types::{Direction, Position};

/// Percentage stop with optional trailing.
#[derive(Debug, Clone)]
pub struct StopLossManager {
    percent: Decimal,
    trailing: bool,
}

impl StopLossManager {
    /// Create a trailing stop at `percent` from the reference price.
    pub fn new(percent: Decimal) -> Self {
        Self {
            percent,
            trailing: true,
        }
    }

    /// Keep the initial stop for the life of the position.
    pub fn without_trailing(mut self) -> Self {
        self.trailing = false;
        self
    }

    pub fn is_trailing(&self) -> bool {
        self.trailing
    }

    pub fn percent(&self) -> Decimal {
        self.percent
    }

    fn fraction(&self) -> Decimal {
        self.percent / dec!(100)
    }

    /// Recompute the active stop for a position after its extrema moved.
    ///
    /// Long: `max(entry * (1 - p), highest * (1 - p))`, short mirrored. The
    /// result never moves back toward entry from the current stop.
    pub fn update_trailing_stop(&self, position: &Position) -> Decimal {
        if !self.trailing {
            return position.current_stop_loss;
        }

        let p = self.fraction();
        match position.direction {
            Direction::Long => {
                let from_entry = position.entry_price * (Decimal::ONE - p);
                let from_high = position.highest_price * (Decimal::ONE - p);
                from_entry.max(from_high).max(position.current_stop_loss)
            }
            Direction::Short => {
                let from_entry = position.entry_price * (Decimal::ONE + p);
                let from_low = position.lowest_price * (Decimal::ONE + p);
                from_entry.min(from_low).min(position.current_stop_loss)
            }
        }
    }
}

/// Whether `price` touches a stop at `stop_price`.
pub fn is_stop_triggered(direction: Direction, stop_price: Decimal, price: Decimal) -> bool {
    match direction {
        Direction::Long => price <= stop_price, // Long: triggered if price falls to stop
        Direction::Short => price >= stop_price, // Short: triggered if price rises to stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trading_core::types::IndicatorSnapshot;

    fn position(direction: Direction, entry: Decimal, stop: Decimal) -> Position {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Position {
            symbol: "X".to_string(),
            direction,
            entry_price: entry,
            quantity: dec!(1),
            stop_loss: stop,
            current_stop_loss: stop,
            target_price: entry,
            highest_price: entry,
            lowest_price: entry,
            entry_indicators: IndicatorSnapshot {
                symbol: "X".to_string(),
                timestamp: ts,
                di_plus: 0.0,
                di_minus: 0.0,
                adx: 0.0,
                true_range: 0.0,
                dm_plus: 0.0,
                dm_minus: 0.0,
            },
            entry_time: ts,
            must_exit_by: ts,
            current_price: entry,
            unrealized_pnl: Decimal::ZERO,
            is_closed: false,
            exit_price: None,
            exit_time: None,
            exit_reason: None,
        }
    }

    #[test]
    fn test_trailing_stop_update() {
        let manager = StopLossManager::new(dec!(5));
        let mut long = position(Direction::Long, dec!(100), dec!(95));

        long.highest_price = dec!(110);
        long.current_stop_loss = manager.update_trailing_stop(&long);
        assert_eq!(long.current_stop_loss, dec!(104.5)); // 5% below 110

        // Price moved down - stop shouldn't move down
        long.current_price = dec!(105);
        assert_eq!(manager.update_trailing_stop(&long), dec!(104.5));
    }

    #[test]
    fn test_short_trailing_stop_update() {
        let manager = StopLossManager::new(dec!(5));
        let mut short = position(Direction::Short, dec!(100), dec!(105));

        short.lowest_price = dec!(90);
        assert_eq!(manager.update_trailing_stop(&short), dec!(94.5));
    }

    #[test]
    fn test_disabled_trailing_keeps_stop() {
        let manager = StopLossManager::new(dec!(5)).without_trailing();
        let mut long = position(Direction::Long, dec!(100), dec!(95));
        long.highest_price = dec!(150);
        assert_eq!(manager.update_trailing_stop(&long), dec!(95));
    }

    #[test]
    fn test_stop_triggered() {
        // Long position
        assert!(is_stop_triggered(Direction::Long, dec!(95), dec!(94)));
        assert!(is_stop_triggered(Direction::Long, dec!(95), dec!(95)));
        assert!(!is_stop_triggered(Direction::Long, dec!(95), dec!(96)));

        // Short position
        assert!(is_stop_triggered(Direction::Short, dec!(105), dec!(106)));
        assert!(!is_stop_triggered(Direction::Short, dec!(105), dec!(104)));
    }
}
