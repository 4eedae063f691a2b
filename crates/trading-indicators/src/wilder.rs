//! Wilder's recursive smoothing.

use trading_core::traits::StreamingIndicator;

/// Exponential smoother with factor `1 / period`.
///
/// The first value seeds the accumulator, after which each update applies
/// `acc += (value - acc) / period`. This matches an EMA with `alpha = 1/period`
/// and `adjust = false`.
#[derive(Debug, Clone)]
pub struct WilderSmoother {
    period: usize,
    alpha: f64,
    value: Option<f64>,
    samples: usize,
}

impl WilderSmoother {
    /// Create a new smoother.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            alpha: 1.0 / period as f64,
            value: None,
            samples: 0,
        }
    }

    /// Number of values consumed since the last reset.
    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl StreamingIndicator for WilderSmoother {
    type Output = f64;

    fn update(&mut self, value: f64) -> Option<f64> {
        let next = match self.value {
            Some(acc) => acc + self.alpha * (value - acc),
            None => value,
        };
        self.value = Some(next);
        self.samples += 1;
        Some(next)
    }

    fn current(&self) -> Option<f64> {
        self.value
    }

    fn reset(&mut self) {
        self.value = None;
        self.samples = 0;
    }

    fn is_ready(&self) -> bool {
        self.samples >= self.period
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Wilder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_seeds() {
        let mut smoother = WilderSmoother::new(14);
        assert_eq!(smoother.current(), None);
        assert_eq!(smoother.update(10.0), Some(10.0));
        assert!(!smoother.is_ready());
    }

    #[test]
    fn test_recursion() {
        let mut smoother = WilderSmoother::new(4);
        smoother.update(8.0);
        // 8 + (12 - 8) / 4
        assert!((smoother.update(12.0).unwrap() - 9.0).abs() < 1e-12);
        // 9 + (1 - 9) / 4
        assert!((smoother.update(1.0).unwrap() - 7.0).abs() < 1e-12);
        smoother.update(7.0);
        assert!(smoother.is_ready());

        smoother.reset();
        assert_eq!(smoother.samples(), 0);
        assert_eq!(smoother.current(), None);
    }
}
