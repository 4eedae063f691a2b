//! Backtesting engine.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::error::TradingError;
use trading_core::timing::{SessionConfig, TimingPolicy};
use trading_core::traits::{PositionSizer, Validate};
use trading_core::types::{Bar, ExitReason, StrategyMetrics, TradeResult};
use trading_indicators::IndicatorEngine;
use trading_risk::{
    exit_reference_price, CostModel, DailyLimits, PositionManager, RiskConfig, StopLossManager,
};
use trading_strategies::{SignalConfig, SignalDetector, SignalOutcome};

use crate::report::BacktestReport;
use crate::statistics::EquityCurve;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Symbols with fewer bars are skipped
    pub min_data_points: usize,
    /// Largest share of capital a single entry may use
    pub max_capital_utilization: Decimal,
    /// Where reports are written, if anywhere
    pub output_dir: Option<PathBuf>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            min_data_points: 100,
            max_capital_utilization: dec!(0.9),
            output_dir: None,
        }
    }
}

impl Validate for BacktestConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(TradingError::Config("initial_capital must be positive".into()));
        }
        if self.max_capital_utilization <= Decimal::ZERO
            || self.max_capital_utilization > Decimal::ONE
        {
            return Err(TradingError::Config(format!(
                "max_capital_utilization must be in (0, 1], got {}",
                self.max_capital_utilization
            )));
        }
        Ok(())
    }
}

/// Deterministic replay of recorded bars through the live decision logic.
///
/// Each call to [`run`](Self::run) starts from a clean state, so the same
/// bars always produce the same trades.
pub struct BacktestSimulator {
    config: BacktestConfig,
    signal: SignalConfig,
    risk: RiskConfig,
    costs: CostModel,
    timing: TimingPolicy,
    sizer: Arc<dyn PositionSizer>,
}

impl BacktestSimulator {
    /// Create a simulator from validated component configurations.
    pub fn new(
        config: BacktestConfig,
        signal: SignalConfig,
        risk: RiskConfig,
        costs: CostModel,
        session: SessionConfig,
    ) -> Result<Self, TradingError> {
        config.validate()?;
        signal.validate()?;
        risk.validate()?;
        costs.validate()?;
        session.validate()?;

        let sizer = Arc::new(risk.sizer());
        Ok(Self {
            config,
            signal,
            risk,
            costs,
            timing: TimingPolicy::new(session),
            sizer,
        })
    }

    /// Replace the risk-based sizer.
    pub fn with_sizer(mut self, sizer: Arc<dyn PositionSizer>) -> Self {
        self.sizer = sizer;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingPolicy {
        &self.timing
    }

    /// Run a backtest over per-symbol bars.
    pub fn run(&self, data: &BTreeMap<String, Vec<Bar>>) -> Result<BacktestReport, TradingError> {
        let bars = merge_bars(data);
        info!(
            symbols = data.len(),
            bars = bars.len(),
            capital = %self.config.initial_capital,
            "Starting backtest"
        );

        let mut run = Run::new(self)?;
        for (i, bar) in bars.iter().enumerate() {
            run.step(bar);

            // Equity once per timestamp, after every bar at that instant
            let last_at_instant = bars
                .get(i + 1)
                .map_or(true, |next| next.timestamp != bar.timestamp);
            if last_at_instant && self.timing.is_market_open(bar.timestamp) {
                run.record_equity(bar.timestamp);
            }
        }

        if let Some(last) = bars.last() {
            if !run.positions.is_empty() {
                run.close_all(ExitReason::TimeExit, last.timestamp);
                run.record_equity(last.timestamp);
            }
        }

        Ok(run.finish(bars.len()))
    }
}

/// Flatten per-symbol bars into one stream ordered by `(timestamp, symbol)`.
///
/// Within a symbol the first bar of each timestamp wins.
pub fn merge_bars(data: &BTreeMap<String, Vec<Bar>>) -> Vec<Bar> {
    let mut merged = Vec::with_capacity(data.values().map(Vec::len).sum());
    for bars in data.values() {
        let mut series = bars.clone();
        series.sort_by_key(|b| b.timestamp);
        series.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        merged.extend(series);
    }
    merged.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    merged
}

/// Mutable state of one backtest run.
struct Run<'a> {
    sim: &'a BacktestSimulator,
    indicators: IndicatorEngine,
    detector: SignalDetector,
    positions: PositionManager,
    limits: DailyLimits,
    capital: Decimal,
    trades: Vec<TradeResult>,
    equity: EquityCurve,
    day: Option<NaiveDate>,
    last_timestamp: Option<NaiveDateTime>,
    signals_generated: usize,
    signals_rejected: usize,
    entries_skipped: usize,
}

impl<'a> Run<'a> {
    fn new(sim: &'a BacktestSimulator) -> Result<Self, TradingError> {
        let indicators = IndicatorEngine::new(sim.signal.di_period)?;
        let detector =
            SignalDetector::new(sim.signal.clone())?.with_slippage(sim.costs.slippage_pct);

        let mut stops = StopLossManager::new(sim.signal.trailing_stop_pct);
        if !sim.risk.enable_trailing_stops {
            stops = stops.without_trailing();
        }

        Ok(Self {
            sim,
            indicators,
            detector,
            positions: PositionManager::new(stops, sim.costs),
            limits: DailyLimits::new(&sim.risk),
            capital: sim.config.initial_capital,
            trades: Vec::new(),
            equity: EquityCurve::new(sim.config.initial_capital),
            day: None,
            last_timestamp: None,
            signals_generated: 0,
            signals_rejected: 0,
            entries_skipped: 0,
        })
    }

    fn step(&mut self, bar: &Bar) {
        let ts = bar.timestamp;
        let sim = self.sim;
        let timing = &sim.timing;

        if self.day != Some(ts.date()) {
            if let Some(previous) = self.last_timestamp {
                if !self.positions.is_empty() {
                    warn!(open = self.positions.len(), "Positions carried past day end");
                    self.close_all(ExitReason::TimeExit, previous);
                }
            }
            // The carried closes above are booked on the old day before its counters reset
            self.day = Some(ts.date());
            self.limits.roll(ts.date());
        }
        self.last_timestamp = Some(ts);

        // Indicators and volume see every bar, in or out of session
        let snapshot = self.indicators.update(bar);
        self.detector.observe_volume(&bar.symbol, bar.volume);

        if !timing.is_market_open(ts) {
            return;
        }

        let update = bar.price_update();

        if timing.should_square_off(ts) {
            if self.positions.contains(&bar.symbol) {
                self.positions.on_price(&bar.symbol, &update, timing, None);
            }
            self.close_all(ExitReason::TimeExit, ts);
            return;
        }

        if self.positions.contains(&bar.symbol) {
            let pair = self.indicators.latest_pair(&bar.symbol);
            let exit = self.positions.on_price(&bar.symbol, &update, timing, pair);
            if let Some(reason) = exit {
                if let Some(position) = self.positions.get(&bar.symbol) {
                    let price = exit_reference_price(position.direction, reason, &update);
                    self.close(&bar.symbol, price, reason, ts);
                }
            }
            return;
        }

        if snapshot.is_some() && timing.can_generate_signals(ts) {
            self.try_enter(bar);
        }
    }

    fn try_enter(&mut self, bar: &Bar) {
        let ts = bar.timestamp;
        if !self.limits.check_new_position(self.positions.len()).is_allowed() {
            return;
        }

        let Some((current, previous)) = self.indicators.latest_pair(&bar.symbol) else {
            return;
        };
        let deadline = self.sim.timing.square_off_at(ts);
        let signal = match self
            .detector
            .evaluate(current, Some(previous), bar.close, bar.volume, deadline)
        {
            SignalOutcome::Accepted(signal) => signal,
            SignalOutcome::Rejected { .. } => {
                self.signals_rejected += 1;
                return;
            }
            SignalOutcome::NoCrossover => return,
        };
        self.signals_generated += 1;

        if let Err(reason) = self.sim.timing.validate_entry_time(ts) {
            debug!(symbol = %signal.symbol, %reason, "Entry time rejected");
            self.entries_skipped += 1;
            return;
        }

        let quantity = self.sim.sizer.size_for(signal.entry_price, signal.stop_loss);
        let notional = quantity * signal.entry_price;
        let budget = self.capital * self.sim.config.max_capital_utilization;
        if notional > budget {
            debug!(
                symbol = %signal.symbol,
                notional = %notional,
                budget = %budget,
                "Insufficient capital for entry"
            );
            self.entries_skipped += 1;
            return;
        }

        match self.positions.open_from_signal(&signal, quantity, ts) {
            Ok(_) => self.limits.record_entry(),
            Err(e) => {
                warn!(symbol = %signal.symbol, error = %e, "Entry failed");
                self.entries_skipped += 1;
            }
        }
    }

    fn close(&mut self, symbol: &str, price: Decimal, reason: ExitReason, time: NaiveDateTime) {
        if let Some(trade) = self.positions.close(symbol, price, reason, time) {
            self.book(trade);
        }
    }

    fn close_all(&mut self, reason: ExitReason, time: NaiveDateTime) {
        for trade in self.positions.close_all(reason, time) {
            self.book(trade);
        }
    }

    fn book(&mut self, trade: TradeResult) {
        self.capital += trade.pnl;
        self.limits.record_exit(trade.pnl);
        self.trades.push(trade);
    }

    /// Realized capital plus open positions marked at their best price.
    fn record_equity(&mut self, timestamp: NaiveDateTime) {
        let equity = self.capital + self.positions.best_case_pnl();
        self.equity.record(timestamp, equity);
    }

    fn finish(self, bars_processed: usize) -> BacktestReport {
        let initial_capital = self.sim.config.initial_capital;
        let metrics =
            StrategyMetrics::from_trades(&self.trades).with_return(initial_capital, self.capital);

        info!(
            trades = metrics.total_trades,
            pnl = %metrics.total_pnl.round_dp(2),
            win_rate = %metrics.win_rate.round_dp(3),
            max_drawdown_pct = %self.equity.max_drawdown_pct.round_dp(2),
            "Backtest complete"
        );

        BacktestReport {
            config: self.sim.config.clone(),
            initial_capital,
            final_capital: self.capital,
            metrics,
            trades: self.trades,
            equity_curve: self.equity,
            bars_processed,
            signals_generated: self.signals_generated,
            signals_rejected: self.signals_rejected,
            entries_skipped: self.entries_skipped,
        }
    }
}
