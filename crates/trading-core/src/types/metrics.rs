//! Aggregate strategy metrics, recomputed from the full trade list.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ExitReason, TradeResult};

/// Performance summary over a list of closed trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Fraction of winning trades, 0 to 1
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub total_commission: Decimal,
    pub average_win: Decimal,
    /// Mean realized loss (negative)
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    /// Most negative realized loss
    pub largest_loss: Decimal,
    /// Gross profit over gross loss; zero when there were no losses
    pub profit_factor: Decimal,
    pub exit_reasons: BTreeMap<ExitReason, usize>,
    pub time_based_exits: usize,
    /// Share of trades closed by square-off, in percent
    pub time_based_exit_pct: Decimal,
    pub avg_holding_minutes: f64,
    /// Set by drivers that know the starting capital
    pub total_return_pct: Decimal,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl StrategyMetrics {
    /// Compute metrics from scratch.
    pub fn from_trades(trades: &[TradeResult]) -> Self {
        let mut metrics = Self::default();
        if trades.is_empty() {
            return metrics;
        }

        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut holding_total = 0.0;

        for trade in trades {
            metrics.total_pnl += trade.pnl;
            metrics.total_commission += trade.commission;
            holding_total += trade.holding_minutes;
            *metrics.exit_reasons.entry(trade.exit_reason).or_insert(0) += 1;

            if trade.is_win() {
                metrics.winning_trades += 1;
                gross_profit += trade.pnl;
                metrics.largest_win = metrics.largest_win.max(trade.pnl);
            } else if trade.is_loss() {
                metrics.losing_trades += 1;
                gross_loss += trade.pnl;
                metrics.largest_loss = metrics.largest_loss.min(trade.pnl);
            } else {
                metrics.breakeven_trades += 1;
            }
        }

        let total = Decimal::from(trades.len());
        metrics.total_trades = trades.len();
        metrics.win_rate = Decimal::from(metrics.winning_trades) / total;

        if metrics.winning_trades > 0 {
            metrics.average_win = gross_profit / Decimal::from(metrics.winning_trades);
        }
        if metrics.losing_trades > 0 {
            metrics.average_loss = gross_loss / Decimal::from(metrics.losing_trades);
        }
        if gross_loss < Decimal::ZERO {
            metrics.profit_factor = gross_profit / gross_loss.abs();
        }

        metrics.time_based_exits = metrics
            .exit_reasons
            .get(&ExitReason::TimeExit)
            .copied()
            .unwrap_or(0);
        metrics.time_based_exit_pct = Decimal::from(metrics.time_based_exits) / total * dec!(100);
        metrics.avg_holding_minutes = holding_total / trades.len() as f64;

        metrics.start = trades.iter().map(|t| t.entry_time).min();
        metrics.end = trades.iter().map(|t| t.exit_time).max();

        metrics
    }

    /// Attach the return on starting capital.
    pub fn with_return(mut self, initial_capital: Decimal, final_capital: Decimal) -> Self {
        if initial_capital > Decimal::ZERO {
            self.total_return_pct = (final_capital - initial_capital) / initial_capital * dec!(100);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, IndicatorSnapshot};
    use chrono::NaiveDate;

    fn trade(pnl: Decimal, reason: ExitReason, minutes: i64) -> TradeResult {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let exit = entry + chrono::Duration::minutes(minutes);
        TradeResult {
            symbol: "AXISBANK".to_string(),
            direction: Direction::Long,
            entry_time: entry,
            exit_time: exit,
            entry_price: dec!(100),
            exit_price: dec!(100),
            quantity: dec!(1),
            gross_pnl: pnl,
            commission: Decimal::ZERO,
            pnl,
            pnl_pct: pnl,
            exit_reason: reason,
            holding_minutes: minutes as f64,
            entry_indicators: IndicatorSnapshot {
                symbol: "AXISBANK".to_string(),
                timestamp: entry,
                di_plus: 0.0,
                di_minus: 0.0,
                adx: 0.0,
                true_range: 0.0,
                dm_plus: 0.0,
                dm_minus: 0.0,
            },
            max_favorable_price: dec!(100),
            max_adverse_price: dec!(100),
        }
    }

    #[test]
    fn test_win_rate_and_profit_factor() {
        let mut trades = Vec::new();
        for _ in 0..6 {
            trades.push(trade(dec!(100), ExitReason::Target, 30));
        }
        for _ in 0..4 {
            trades.push(trade(dec!(-75), ExitReason::StopLoss, 10));
        }

        let metrics = StrategyMetrics::from_trades(&trades);
        assert_eq!(metrics.total_trades, 10);
        assert_eq!(metrics.winning_trades, 6);
        assert_eq!(metrics.losing_trades, 4);
        assert_eq!(metrics.win_rate, dec!(0.6));
        assert_eq!(metrics.profit_factor, dec!(2));
        assert_eq!(metrics.total_pnl, dec!(300));
        assert_eq!(metrics.average_win, dec!(100));
        assert_eq!(metrics.average_loss, dec!(-75));
        assert!((metrics.avg_holding_minutes - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_exit_histogram_and_time_exits() {
        let trades = vec![
            trade(dec!(10), ExitReason::TimeExit, 60),
            trade(dec!(-5), ExitReason::TimeExit, 60),
            trade(dec!(0), ExitReason::SignalExit, 60),
            trade(dec!(20), ExitReason::TrailingStop, 60),
        ];

        let metrics = StrategyMetrics::from_trades(&trades);
        assert_eq!(metrics.exit_reasons.get(&ExitReason::TimeExit), Some(&2));
        assert_eq!(metrics.time_based_exits, 2);
        assert_eq!(metrics.time_based_exit_pct, dec!(50));
        assert_eq!(metrics.breakeven_trades, 1);
        assert_eq!(metrics.largest_win, dec!(20));
        assert_eq!(metrics.largest_loss, dec!(-5));
    }

    #[test]
    fn test_no_losses_profit_factor_is_zero() {
        let metrics = StrategyMetrics::from_trades(&[trade(dec!(10), ExitReason::Target, 5)]);
        assert_eq!(metrics.profit_factor, Decimal::ZERO);

        let empty = StrategyMetrics::from_trades(&[]);
        assert_eq!(empty.total_trades, 0);
        assert_eq!(empty.win_rate, Decimal::ZERO);
    }

    #[test]
    fn test_with_return() {
        let metrics = StrategyMetrics::default().with_return(dec!(100000), dec!(105000));
        assert_eq!(metrics.total_return_pct, dec!(5));
    }
}
