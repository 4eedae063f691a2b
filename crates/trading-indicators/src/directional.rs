//! Directional movement system (+DI, -DI, ADX).
//!
//! [`IndicatorEngine`] keeps independent smoothed state per symbol and
//! emits an [`IndicatorSnapshot`] for every bar once `period + 1` bars have
//! been observed for that symbol.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;
use tracing::{trace, warn};
use trading_core::error::{DataError, IndicatorError};
use trading_core::traits::StreamingIndicator;
use trading_core::types::{Bar, IndicatorSnapshot};

use crate::wilder::WilderSmoother;

/// Snapshots retained per symbol, as a multiple of the period.
const HISTORY_PERIODS: usize = 3;

#[derive(Debug, Clone, Copy)]
struct PrevBar {
    timestamp: NaiveDateTime,
    high: f64,
    low: f64,
    close: f64,
}

/// Smoothed state for one symbol.
#[derive(Debug, Clone)]
struct DirectionalState {
    prev: Option<PrevBar>,
    tr: WilderSmoother,
    dm_plus: WilderSmoother,
    dm_minus: WilderSmoother,
    adx: WilderSmoother,
    bars_seen: usize,
    history: VecDeque<IndicatorSnapshot>,
}

impl DirectionalState {
    fn new(period: usize, capacity: usize) -> Self {
        Self {
            prev: None,
            tr: WilderSmoother::new(period),
            dm_plus: WilderSmoother::new(period),
            dm_minus: WilderSmoother::new(period),
            adx: WilderSmoother::new(period),
            bars_seen: 0,
            history: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, snapshot: IndicatorSnapshot, capacity: usize) {
        if self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);
    }
}

/// Raw directional movement of one bar against the previous bar.
///
/// At most one of the two values is non-zero.
pub fn directional_movement(high: f64, low: f64, prev_high: f64, prev_low: f64) -> (f64, f64) {
    let up_move = high - prev_high;
    let down_move = prev_low - low;

    let dm_plus = if up_move > down_move && up_move > 0.0 {
        up_move
    } else {
        0.0
    };
    let dm_minus = if down_move > up_move && down_move > 0.0 {
        down_move
    } else {
        0.0
    };

    (dm_plus, dm_minus)
}

/// Streaming +DI / -DI / ADX calculator for many symbols.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    period: usize,
    capacity: usize,
    states: HashMap<String, DirectionalState>,
}

impl IndicatorEngine {
    /// Create a new engine. The period must be at least 2.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period < 2 {
            return Err(IndicatorError::InvalidParameter(format!(
                "DI period must be at least 2, got {}",
                period
            )));
        }
        Ok(Self {
            period,
            capacity: period * HISTORY_PERIODS,
            states: HashMap::new(),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Bars needed before the first snapshot.
    pub fn warmup(&self) -> usize {
        self.period + 1
    }

    /// Feed a bar, logging and skipping out-of-order or duplicate bars.
    pub fn update(&mut self, bar: &Bar) -> Option<IndicatorSnapshot> {
        match self.try_update(bar) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(symbol = %bar.symbol, error = %err, "skipping bar");
                None
            }
        }
    }

    /// Feed a bar.
    ///
    /// Returns `Ok(None)` during warm-up and an error for bars whose
    /// timestamp does not move forward; rejected bars leave the state untouched.
    pub fn try_update(&mut self, bar: &Bar) -> Result<Option<IndicatorSnapshot>, DataError> {
        let period = self.period;
        let capacity = self.capacity;
        let state = self
            .states
            .entry(bar.symbol.clone())
            .or_insert_with(|| DirectionalState::new(period, capacity));

        let (true_range, dm_plus, dm_minus) = match state.prev {
            Some(prev) if bar.timestamp == prev.timestamp => {
                return Err(DataError::Duplicate {
                    symbol: bar.symbol.clone(),
                    timestamp: bar.timestamp,
                });
            }
            Some(prev) if bar.timestamp < prev.timestamp => {
                return Err(DataError::NonMonotonic {
                    symbol: bar.symbol.clone(),
                    timestamp: bar.timestamp,
                    last: prev.timestamp,
                });
            }
            Some(prev) => {
                let (plus, minus) = directional_movement(bar.high, bar.low, prev.high, prev.low);
                (bar.true_range(Some(prev.close)), plus, minus)
            }
            None => (bar.range(), 0.0, 0.0),
        };

        state.prev = Some(PrevBar {
            timestamp: bar.timestamp,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        });

        let tr_s = state.tr.update(true_range).unwrap_or(0.0);
        let plus_s = state.dm_plus.update(dm_plus).unwrap_or(0.0);
        let minus_s = state.dm_minus.update(dm_minus).unwrap_or(0.0);

        let (di_plus, di_minus) = if tr_s > 0.0 {
            (
                (100.0 * plus_s / tr_s).clamp(0.0, 100.0),
                (100.0 * minus_s / tr_s).clamp(0.0, 100.0),
            )
        } else {
            (0.0, 0.0)
        };

        let di_sum = di_plus + di_minus;
        let dx = if di_sum > 0.0 {
            100.0 * (di_plus - di_minus).abs() / di_sum
        } else {
            0.0
        };
        let adx = state.adx.update(dx).unwrap_or(0.0).clamp(0.0, 100.0);

        state.bars_seen += 1;
        if state.bars_seen < period + 1 {
            trace!(symbol = %bar.symbol, bars = state.bars_seen, "warming up");
            return Ok(None);
        }

        let snapshot = IndicatorSnapshot {
            symbol: bar.symbol.clone(),
            timestamp: bar.timestamp,
            di_plus,
            di_minus,
            adx,
            true_range,
            dm_plus,
            dm_minus,
        };
        state.push(snapshot.clone(), capacity);

        Ok(Some(snapshot))
    }

    /// Most recent snapshot for a symbol.
    pub fn latest(&self, symbol: &str) -> Option<&IndicatorSnapshot> {
        self.states.get(symbol).and_then(|s| s.history.back())
    }

    /// Snapshot before the most recent one.
    pub fn previous(&self, symbol: &str) -> Option<&IndicatorSnapshot> {
        let history = &self.states.get(symbol)?.history;
        history.len().checked_sub(2).and_then(|i| history.get(i))
    }

    /// The two most recent snapshots as `(current, previous)`.
    pub fn latest_pair(&self, symbol: &str) -> Option<(&IndicatorSnapshot, &IndicatorSnapshot)> {
        Some((self.latest(symbol)?, self.previous(symbol)?))
    }

    /// Up to `n` most recent snapshots, oldest first.
    pub fn history(&self, symbol: &str, n: usize) -> Vec<&IndicatorSnapshot> {
        match self.states.get(symbol) {
            Some(state) => {
                let skip = state.history.len().saturating_sub(n);
                state.history.iter().skip(skip).collect()
            }
            None => Vec::new(),
        }
    }

    /// Bars consumed for a symbol since its last reset.
    pub fn bars_seen(&self, symbol: &str) -> usize {
        self.states.get(symbol).map_or(0, |s| s.bars_seen)
    }

    /// Whether the symbol has produced at least one snapshot.
    pub fn is_ready(&self, symbol: &str) -> bool {
        self.bars_seen(symbol) >= self.warmup()
    }

    /// Drop all state for one symbol.
    pub fn reset(&mut self, symbol: &str) {
        self.states.remove(symbol);
    }

    /// Drop all state.
    pub fn reset_all(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
            + Duration::minutes(i)
    }

    fn bar(symbol: &str, i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(symbol, ts(i), (high + low) / 2.0, high, low, close, 1000.0)
    }

    fn uptrend(symbol: &str, n: i64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64;
                bar(symbol, i, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect()
    }

    #[test]
    fn test_invalid_period() {
        assert!(IndicatorEngine::new(1).is_err());
        assert!(IndicatorEngine::new(0).is_err());
        assert!(IndicatorEngine::new(2).is_ok());
    }

    #[test]
    fn test_warmup_requires_period_plus_one_bars() {
        let mut engine = IndicatorEngine::new(14).unwrap();
        let bars = uptrend("NIFTY", 15);

        for bar in &bars[..14] {
            assert!(engine.update(bar).is_none());
        }
        assert!(engine.update(&bars[14]).is_some());
        assert!(engine.is_ready("NIFTY"));
    }

    #[test]
    fn test_hand_computed_values() {
        let mut engine = IndicatorEngine::new(2).unwrap();

        assert!(engine.update(&bar("X", 0, 10.0, 8.0, 9.0)).is_none());
        assert!(engine.update(&bar("X", 1, 11.0, 9.0, 10.5)).is_none());
        let snapshot = engine.update(&bar("X", 2, 12.0, 10.0, 11.0)).unwrap();

        assert!((snapshot.true_range - 2.0).abs() < 1e-12);
        assert!((snapshot.dm_plus - 1.0).abs() < 1e-12);
        assert_eq!(snapshot.dm_minus, 0.0);
        assert!((snapshot.di_plus - 37.5).abs() < 1e-9);
        assert_eq!(snapshot.di_minus, 0.0);
        assert!((snapshot.adx - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_bars_yield_zero_indicators() {
        let mut engine = IndicatorEngine::new(2).unwrap();
        let mut last = None;
        for i in 0..4 {
            last = engine.update(&bar("FLAT", i, 100.0, 100.0, 100.0));
        }
        let snapshot = last.unwrap();
        assert_eq!(snapshot.di_plus, 0.0);
        assert_eq!(snapshot.di_minus, 0.0);
        assert_eq!(snapshot.adx, 0.0);
    }

    #[test]
    fn test_out_of_order_and_duplicate_bars_are_rejected() {
        let mut engine = IndicatorEngine::new(2).unwrap();
        engine.update(&bar("X", 5, 10.0, 8.0, 9.0));

        assert!(matches!(
            engine.try_update(&bar("X", 5, 11.0, 9.0, 10.0)),
            Err(DataError::Duplicate { .. })
        ));
        assert!(matches!(
            engine.try_update(&bar("X", 4, 11.0, 9.0, 10.0)),
            Err(DataError::NonMonotonic { .. })
        ));
        assert_eq!(engine.bars_seen("X"), 1);
    }

    #[test]
    fn test_symbols_are_independent() {
        let mut engine = IndicatorEngine::new(3).unwrap();
        for b in uptrend("A", 6).iter().chain(uptrend("B", 6).iter()) {
            engine.update(b);
        }
        assert!(engine.latest("A").is_some());

        engine.reset("A");
        assert!(engine.latest("A").is_none());
        assert_eq!(engine.bars_seen("A"), 0);
        assert!(engine.latest("B").is_some());

        engine.reset_all();
        assert!(engine.latest("B").is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut engine = IndicatorEngine::new(2).unwrap();
        for b in uptrend("X", 50) {
            engine.update(&b);
        }
        assert_eq!(engine.history("X", 100).len(), 6);
        assert_eq!(engine.history("X", 2).len(), 2);

        let (current, previous) = engine.latest_pair("X").unwrap();
        assert!(current.timestamp > previous.timestamp);
        assert_eq!(engine.history("X", 1)[0], current);
    }

    #[test]
    fn test_uptrend_favors_di_plus() {
        let mut engine = IndicatorEngine::new(14).unwrap();
        let mut last = None;
        for b in uptrend("X", 30) {
            last = engine.update(&b).or(last);
        }
        let snapshot = last.unwrap();
        assert!(snapshot.di_plus > snapshot.di_minus);
        assert!(snapshot.adx > 20.0);
    }

    fn arb_bars() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
        prop::collection::vec((1.0f64..500.0, 0.0f64..20.0, 0.0f64..1.0), 1..80).prop_map(|raw| {
            raw.into_iter()
                .map(|(low, spread, pos)| (low + spread, low, low + spread * pos))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_dm_mutually_exclusive_and_bounded(bars in arb_bars()) {
            let mut engine = IndicatorEngine::new(5).unwrap();
            for (i, (high, low, close)) in bars.iter().enumerate() {
                if let Some(s) = engine.update(&bar("P", i as i64, *high, *low, *close)) {
                    prop_assert!(!(s.dm_plus > 0.0 && s.dm_minus > 0.0));
                    prop_assert!((0.0..=100.0).contains(&s.di_plus));
                    prop_assert!((0.0..=100.0).contains(&s.di_minus));
                    prop_assert!((0.0..=100.0).contains(&s.adx));
                }
            }
        }

        #[test]
        fn prop_mirrored_series_swaps_directional_indicators(bars in arb_bars()) {
            let mut engine = IndicatorEngine::new(4).unwrap();
            for (i, (high, low, close)) in bars.iter().enumerate() {
                let original = engine.update(&bar("UP", i as i64, *high, *low, *close));
                let mirrored = engine.update(&bar("DOWN", i as i64, 1000.0 - low, 1000.0 - high, 1000.0 - close));
                match (original, mirrored) {
                    (Some(a), Some(b)) => {
                        prop_assert!((a.di_plus - b.di_minus).abs() < 1e-6);
                        prop_assert!((a.di_minus - b.di_plus).abs() < 1e-6);
                        prop_assert!((a.adx - b.adx).abs() < 1e-6);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "warm-up differs between mirrored series"),
                }
            }
        }
    }
}
