//! Backtest report generation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use trading_core::error::TradingError;
use trading_core::types::{StrategyMetrics, TradeResult};

use crate::engine::BacktestConfig;
use crate::statistics::EquityCurve;

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    pub initial_capital: Decimal,
    /// Capital after every trade was realized
    pub final_capital: Decimal,
    pub metrics: StrategyMetrics,
    /// Closed trades in exit order
    pub trades: Vec<TradeResult>,
    pub equity_curve: EquityCurve,
    /// Number of bars processed
    pub bars_processed: usize,
    pub signals_generated: usize,
    pub signals_rejected: usize,
    /// Accepted signals that did not become positions
    pub entries_skipped: usize,
}

/// Flat trade row for CSV export.
#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    symbol: &'a str,
    direction: String,
    entry_time: String,
    exit_time: String,
    entry_price: Decimal,
    exit_price: Decimal,
    quantity: Decimal,
    gross_pnl: Decimal,
    commission: Decimal,
    pnl: Decimal,
    pnl_pct: Decimal,
    exit_reason: String,
    holding_minutes: f64,
    entry_adx: f64,
    entry_di_plus: f64,
    entry_di_minus: f64,
    max_favorable_price: Decimal,
    max_adverse_price: Decimal,
}

impl<'a> From<&'a TradeResult> for TradeRow<'a> {
    fn from(trade: &'a TradeResult) -> Self {
        Self {
            symbol: &trade.symbol,
            direction: trade.direction.to_string(),
            entry_time: trade.entry_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            exit_time: trade.exit_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price.round_dp(4),
            quantity: trade.quantity,
            gross_pnl: trade.gross_pnl.round_dp(4),
            commission: trade.commission.round_dp(4),
            pnl: trade.pnl.round_dp(4),
            pnl_pct: trade.pnl_pct.round_dp(4),
            exit_reason: trade.exit_reason.to_string(),
            holding_minutes: trade.holding_minutes,
            entry_adx: trade.entry_indicators.adx,
            entry_di_plus: trade.entry_indicators.di_plus,
            entry_di_minus: trade.entry_indicators.di_minus,
            max_favorable_price: trade.max_favorable_price,
            max_adverse_price: trade.max_adverse_price,
        }
    }
}

fn csv_error(e: impl std::fmt::Display) -> TradingError {
    TradingError::Serialization(e.to_string())
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                  ADX BACKTEST REPORT                       \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Capital:     {:.2}\n", self.initial_capital));
        s.push_str(&format!("  Final Capital:       {:.2}\n", self.final_capital));
        s.push_str(&format!("  Total PnL:           {:.2}\n", m.total_pnl));
        s.push_str(&format!("  Total Return:        {:.2}%\n", m.total_return_pct));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            self.equity_curve.max_drawdown_pct
        ));
        s.push_str(&format!("  Commission Paid:     {:.2}\n", m.total_commission));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Total Trades:        {}\n", m.total_trades));
        s.push_str(&format!("  Winning Trades:      {}\n", m.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", m.losing_trades));
        s.push_str(&format!("  Breakeven Trades:    {}\n", m.breakeven_trades));
        s.push_str(&format!(
            "  Win Rate:            {:.2}%\n",
            m.win_rate * Decimal::ONE_HUNDRED
        ));
        s.push_str(&format!("  Profit Factor:       {:.2}\n", m.profit_factor));
        s.push_str(&format!("  Avg Win:             {:.2}\n", m.average_win));
        s.push_str(&format!("  Avg Loss:            {:.2}\n", m.average_loss));
        s.push_str(&format!("  Largest Win:         {:.2}\n", m.largest_win));
        s.push_str(&format!("  Largest Loss:        {:.2}\n", m.largest_loss));
        s.push_str(&format!(
            "  Avg Holding:         {:.1} min\n",
            m.avg_holding_minutes
        ));
        s.push('\n');

        s.push_str("EXITS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        for (reason, count) in &m.exit_reasons {
            s.push_str(&format!("  {:<20} {}\n", format!("{}:", reason), count));
        }
        s.push_str(&format!(
            "  Time-based share:    {:.2}%\n",
            m.time_based_exit_pct
        ));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Bars Processed:      {}\n", self.bars_processed));
        s.push_str(&format!("  Signals Generated:   {}\n", self.signals_generated));
        s.push_str(&format!("  Signals Rejected:    {}\n", self.signals_rejected));
        s.push_str(&format!("  Entries Skipped:     {}\n", self.entries_skipped));
        s.push_str(&format!("  Equity Points:       {}\n", self.equity_curve.len()));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the trade list as CSV.
    pub fn write_trades_csv<W: Write>(&self, writer: W) -> Result<(), TradingError> {
        let mut csv = csv::Writer::from_writer(writer);
        for trade in &self.trades {
            csv.serialize(TradeRow::from(trade)).map_err(csv_error)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the equity curve as CSV.
    pub fn write_equity_csv<W: Write>(&self, writer: W) -> Result<(), TradingError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["timestamp", "equity"]).map_err(csv_error)?;
        for point in &self.equity_curve.points {
            csv.write_record([
                point.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                point.equity.round_dp(2).to_string(),
            ])
            .map_err(csv_error)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write `report.json`, `trades.csv` and `equity.csv` into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, TradingError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let json_path = dir.join("report.json");
        fs::write(&json_path, self.to_json().map_err(csv_error)?)?;

        let trades_path = dir.join("trades.csv");
        self.write_trades_csv(fs::File::create(&trades_path)?)?;

        let equity_path = dir.join("equity.csv");
        self.write_equity_csv(fs::File::create(&equity_path)?)?;

        Ok(vec![json_path, trades_path, equity_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use trading_core::types::{Direction, ExitReason, IndicatorSnapshot};

    fn trade(pnl: Decimal) -> TradeResult {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        TradeResult {
            symbol: "WIPRO".to_string(),
            direction: Direction::Long,
            entry_time: entry,
            exit_time: entry + chrono::Duration::minutes(45),
            entry_price: dec!(100),
            exit_price: dec!(100) + pnl / dec!(10),
            quantity: dec!(10),
            gross_pnl: pnl,
            commission: Decimal::ZERO,
            pnl,
            pnl_pct: pnl / dec!(10),
            exit_reason: ExitReason::Target,
            holding_minutes: 45.0,
            entry_indicators: IndicatorSnapshot {
                symbol: "WIPRO".to_string(),
                timestamp: entry,
                di_plus: 30.0,
                di_minus: 15.0,
                adx: 28.0,
                true_range: 2.0,
                dm_plus: 1.0,
                dm_minus: 0.0,
            },
            max_favorable_price: dec!(106),
            max_adverse_price: dec!(99),
        }
    }

    fn report() -> BacktestReport {
        let trades = vec![trade(dec!(50)), trade(dec!(-20))];
        let metrics = StrategyMetrics::from_trades(&trades).with_return(dec!(100000), dec!(100030));
        let mut equity_curve = EquityCurve::new(dec!(100000));
        equity_curve.record(trades[0].exit_time, dec!(100030));

        BacktestReport {
            config: BacktestConfig::default(),
            initial_capital: dec!(100000),
            final_capital: dec!(100030),
            metrics,
            trades,
            equity_curve,
            bars_processed: 100,
            signals_generated: 3,
            signals_rejected: 5,
            entries_skipped: 1,
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("Total Return"));
        assert!(summary.contains("0.03%"));
        assert!(summary.contains("TARGET:"));
        assert!(summary.contains("Win Rate:            50.00%"));
    }

    #[test]
    fn test_trades_csv() {
        let mut buf = Vec::new();
        report().write_trades_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,direction,entry_time"));
        assert!(lines[1].contains("WIPRO,LONG,2024-01-02 10:00:00"));
        assert!(lines[2].contains(",-20,"));
    }

    #[test]
    fn test_equity_csv_and_json() {
        let mut buf = Vec::new();
        report().write_equity_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "timestamp,equity\n2024-01-02 10:45:00,100030\n");

        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metrics"]["total_trades"], 2);
    }
}
