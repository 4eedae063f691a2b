//! Per-symbol bounded volume history.

use std::collections::{HashMap, VecDeque};

/// Rolling volume window per symbol.
#[derive(Debug, Clone)]
pub struct VolumeTracker {
    lookback: usize,
    min_samples: usize,
    history: HashMap<String, VecDeque<f64>>,
}

impl VolumeTracker {
    pub fn new(lookback: usize, min_samples: usize) -> Self {
        Self {
            lookback: lookback.max(1),
            min_samples: min_samples.max(1),
            history: HashMap::new(),
        }
    }

    /// Append a volume sample, evicting the oldest beyond the lookback.
    pub fn record(&mut self, symbol: &str, volume: f64) {
        let lookback = self.lookback;
        let window = self
            .history
            .entry(symbol.to_string())
            .or_insert_with(|| VecDeque::with_capacity(lookback));
        if window.len() >= lookback {
            window.pop_front();
        }
        window.push_back(volume);
    }

    /// `current / mean(window)`, or 1.0 while fewer than the minimum samples exist.
    pub fn ratio(&self, symbol: &str, current: f64) -> f64 {
        let Some(window) = self.history.get(symbol) else {
            return 1.0;
        };
        if window.len() < self.min_samples {
            return 1.0;
        }

        let mean = window.iter().sum::<f64>() / window.len() as f64;
        if mean > 0.0 {
            current / mean
        } else {
            1.0
        }
    }

    pub fn samples(&self, symbol: &str) -> usize {
        self.history.get(symbol).map_or(0, VecDeque::len)
    }

    pub fn reset(&mut self, symbol: &str) {
        self.history.remove(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_until_min_samples() {
        let mut tracker = VolumeTracker::new(20, 5);
        for v in [100.0, 100.0, 100.0, 100.0] {
            tracker.record("X", v);
        }
        assert_eq!(tracker.ratio("X", 500.0), 1.0);
        assert_eq!(tracker.ratio("UNKNOWN", 500.0), 1.0);

        tracker.record("X", 100.0);
        assert!((tracker.ratio("X", 200.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut tracker = VolumeTracker::new(3, 1);
        for v in [1000.0, 10.0, 10.0, 10.0] {
            tracker.record("X", v);
        }
        assert_eq!(tracker.samples("X"), 3);
        assert!((tracker.ratio("X", 10.0) - 1.0).abs() < 1e-12);

        tracker.reset("X");
        assert_eq!(tracker.samples("X"), 0);
    }
}
