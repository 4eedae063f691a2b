//! Open position tracking and exit decisions.
//!
//! A position is open from admission until exactly one exit condition fires.
//! Conditions are checked on every price update in a fixed priority order:
//!
//! 1. `TimeExit`: the square-off time or the position deadline is reached
//! 2. `StopLoss`: the initial stop is breached by the adverse extreme
//! 3. `Target`: the target is reached by the favorable extreme
//! 4. `SignalExit`: the latest snapshots cross against the position
//! 5. `TrailingStop`: a tightened stop is breached by the last price

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};
use trading_core::error::PositionError;
use trading_core::timing::TimingPolicy;
use trading_core::types::{
    Direction, ExitReason, IndicatorSnapshot, Position, PriceUpdate, Signal, TradeResult,
};
use trading_strategies::is_opposite_crossover;

use crate::costs::CostModel;
use crate::stop_loss::{is_stop_triggered, StopLossManager};

/// Decide whether `position` must close on `update`, first match wins.
///
/// `crossover` is the `(current, previous)` snapshot pair for the symbol, if
/// the indicator engine has one.
pub fn evaluate_exit(
    position: &Position,
    update: &PriceUpdate,
    timing: &TimingPolicy,
    crossover: Option<(&IndicatorSnapshot, &IndicatorSnapshot)>,
) -> Option<ExitReason> {
    if timing.should_square_off(update.timestamp) || update.timestamp >= position.must_exit_by {
        return Some(ExitReason::TimeExit);
    }

    let (adverse, favorable) = match position.direction {
        Direction::Long => (update.low, update.high),
        Direction::Short => (update.high, update.low),
    };

    if is_stop_triggered(position.direction, position.stop_loss, adverse) {
        return Some(ExitReason::StopLoss);
    }

    let target_hit = match position.direction {
        Direction::Long => favorable >= position.target_price,
        Direction::Short => favorable <= position.target_price,
    };
    if target_hit {
        return Some(ExitReason::Target);
    }

    if let Some((current, previous)) = crossover {
        if current.symbol == position.symbol
            && is_opposite_crossover(position.direction, current, Some(previous))
        {
            return Some(ExitReason::SignalExit);
        }
    }

    if position.stop_tightened()
        && is_stop_triggered(position.direction, position.current_stop_loss, update.close)
    {
        return Some(ExitReason::TrailingStop);
    }

    None
}

/// Price an exit is referenced at before slippage.
///
/// Stop exits fill at the adverse extreme of the update, target exits at the
/// favorable extreme, everything else at the last price.
pub fn exit_reference_price(
    direction: Direction,
    reason: ExitReason,
    update: &PriceUpdate,
) -> Decimal {
    match (reason, direction) {
        (ExitReason::StopLoss, Direction::Long) | (ExitReason::Target, Direction::Short) => {
            update.low
        }
        (ExitReason::StopLoss, Direction::Short) | (ExitReason::Target, Direction::Long) => {
            update.high
        }
        _ => update.close,
    }
}

/// Owns every open position, at most one per symbol.
#[derive(Debug, Clone)]
pub struct PositionManager {
    stops: StopLossManager,
    costs: CostModel,
    positions: BTreeMap<String, Position>,
}

impl PositionManager {
    pub fn new(stops: StopLossManager, costs: CostModel) -> Self {
        Self {
            stops,
            costs,
            positions: BTreeMap::new(),
        }
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    pub fn stops(&self) -> &StopLossManager {
        &self.stops
    }

    /// Track a new open position.
    pub fn open(&mut self, position: Position) -> Result<&Position, PositionError> {
        if position.quantity <= Decimal::ZERO {
            return Err(PositionError::InvalidQuantity {
                symbol: position.symbol,
                quantity: position.quantity,
            });
        }
        if self.positions.contains_key(&position.symbol) {
            return Err(PositionError::AlreadyOpen(position.symbol));
        }

        info!(
            symbol = %position.symbol,
            direction = %position.direction,
            entry = %position.entry_price,
            quantity = %position.quantity,
            stop = %position.stop_loss,
            target = %position.target_price,
            "Position opened"
        );

        let symbol = position.symbol.clone();
        Ok(self.positions.entry(symbol).or_insert(position))
    }

    /// Open a position for an admitted signal.
    pub fn open_from_signal(
        &mut self,
        signal: &Signal,
        quantity: Decimal,
        entry_time: NaiveDateTime,
    ) -> Result<&Position, PositionError> {
        self.open(Position::from_signal(signal, quantity, entry_time))
    }

    /// Mark a position to `update`, trail its stop and decide whether it exits.
    ///
    /// Returns `None` for symbols without an open position.
    pub fn on_price(
        &mut self,
        symbol: &str,
        update: &PriceUpdate,
        timing: &TimingPolicy,
        crossover: Option<(&IndicatorSnapshot, &IndicatorSnapshot)>,
    ) -> Option<ExitReason> {
        let position = self.positions.get_mut(symbol)?;
        position.mark(update);

        let trailed = self.stops.update_trailing_stop(position);
        if trailed != position.current_stop_loss {
            debug!(
                symbol,
                from = %position.current_stop_loss,
                to = %trailed,
                "Trailing stop tightened"
            );
            position.current_stop_loss = trailed;
        }

        evaluate_exit(position, update, timing, crossover)
    }

    /// Close the position for `symbol` at `reference_price`.
    ///
    /// Exit slippage and round-trip commission are applied. Closing a symbol
    /// without an open position does nothing.
    pub fn close(
        &mut self,
        symbol: &str,
        reference_price: Decimal,
        reason: ExitReason,
        time: NaiveDateTime,
    ) -> Option<TradeResult> {
        let mut position = self.positions.remove(symbol)?;

        let exit_price = self.costs.exit_fill(position.direction, reference_price);
        let gross_pnl = position.pnl_at(exit_price);
        let commission = self
            .costs
            .commission(position.notional(), exit_price * position.quantity);
        let pnl = gross_pnl - commission;
        let pnl_pct = if position.notional() > Decimal::ZERO {
            pnl / position.notional() * dec!(100)
        } else {
            Decimal::ZERO
        };

        position.is_closed = true;
        position.exit_price = Some(exit_price);
        position.exit_time = Some(time);
        position.exit_reason = Some(reason);

        info!(
            symbol,
            reason = %reason,
            exit = %exit_price,
            pnl = %pnl.round_dp(2),
            "Position closed"
        );

        Some(TradeResult {
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_time: position.entry_time,
            exit_time: time,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            gross_pnl,
            commission,
            pnl,
            pnl_pct,
            exit_reason: reason,
            holding_minutes: position.holding_minutes(time),
            max_favorable_price: position.best_price(),
            max_adverse_price: position.worst_price(),
            entry_indicators: position.entry_indicators,
        })
    }

    /// Close every open position at its last marked price.
    pub fn close_all(&mut self, reason: ExitReason, time: NaiveDateTime) -> Vec<TradeResult> {
        let marks: Vec<(String, Decimal)> = self
            .positions
            .values()
            .map(|p| (p.symbol.clone(), p.current_price))
            .collect();

        marks
            .into_iter()
            .filter_map(|(symbol, price)| self.close(&symbol, price, reason, time))
            .collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Like [`get`](Self::get), for callers that treat absence as an error.
    pub fn require(&self, symbol: &str) -> Result<&Position, PositionError> {
        self.get(symbol)
            .ok_or_else(|| PositionError::NotFound(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Open positions in symbol order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    /// Unrealized PnL marked at the last price.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.unrealized_pnl).sum()
    }

    /// Unrealized PnL marked at each position's most favorable price.
    pub fn best_case_pnl(&self) -> Decimal {
        self.positions.values().map(Position::best_case_pnl).sum()
    }
}
