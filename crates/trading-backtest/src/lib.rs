//! Deterministic bar-replay backtesting.

mod engine;
mod report;
mod statistics;

pub use engine::{merge_bars, BacktestConfig, BacktestSimulator};
pub use report::BacktestReport;
pub use statistics::{EquityCurve, EquityPoint};
