//! Backtest statistics.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Equity at one processed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: Decimal,
}

/// Equity curve with running peak and drawdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
    /// Maximum drawdown percentage
    pub max_drawdown_pct: Decimal,
    /// Maximum drawdown in money
    pub max_drawdown: Decimal,
    /// Peak equity (for drawdown)
    peak_equity: Decimal,
}

impl EquityCurve {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            points: Vec::new(),
            max_drawdown_pct: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            peak_equity: initial_capital,
        }
    }

    /// Record equity at a timestamp. A second value for the last timestamp replaces it.
    pub fn record(&mut self, timestamp: NaiveDateTime, equity: Decimal) {
        match self.points.last_mut() {
            Some(last) if last.timestamp == timestamp => last.equity = equity,
            _ => self.points.push(EquityPoint { timestamp, equity }),
        }

        // Update peak and drawdown
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }

        let drawdown = self.peak_equity - equity;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown_pct = drawdown / self.peak_equity * dec!(100);
            if drawdown_pct > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown_pct;
            }
        }
    }

    pub fn peak_equity(&self) -> Decimal {
        self.peak_equity
    }

    pub fn last_equity(&self) -> Option<Decimal> {
        self.points.last().map(|p| p.equity)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_drawdown_tracks_peak() {
        let mut curve = EquityCurve::new(dec!(100000));
        curve.record(at(0), dec!(100000));
        curve.record(at(1), dec!(110000));
        curve.record(at(2), dec!(99000));
        curve.record(at(3), dec!(105000));

        assert_eq!(curve.peak_equity(), dec!(110000));
        assert_eq!(curve.max_drawdown, dec!(11000));
        assert_eq!(curve.max_drawdown_pct, dec!(10));
        assert_eq!(curve.len(), 4);
    }

    #[test]
    fn test_same_timestamp_replaces_point() {
        let mut curve = EquityCurve::new(dec!(1000));
        curve.record(at(0), dec!(1000));
        curve.record(at(0), dec!(1010));

        assert_eq!(curve.len(), 1);
        assert_eq!(curve.last_equity(), Some(dec!(1010)));
    }

    #[test]
    fn test_initial_capital_is_first_peak() {
        let mut curve = EquityCurve::new(dec!(1000));
        curve.record(at(0), dec!(900));
        assert_eq!(curve.max_drawdown_pct, dec!(10));
    }
}
