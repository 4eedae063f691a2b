//! Signal generation settings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;
use trading_core::traits::Validate;

/// Weights of the normalised quality features in the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub volume: f64,
    pub separation: f64,
    pub adx: f64,
    pub trend: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            volume: 0.25,
            separation: 0.30,
            adx: 0.25,
            trend: 0.20,
        }
    }
}

/// Configuration for crossover detection and signal scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Wilder smoothing period for DI/ADX
    pub di_period: usize,
    /// Reject signals on thin volume
    pub enable_volume_filter: bool,
    /// Minimum current / average volume
    pub min_volume_ratio: f64,
    /// Volumes kept per symbol for the average
    pub volume_lookback: usize,
    /// Below this many samples the ratio is neutral (1.0)
    pub min_volume_samples: usize,
    /// Minimum |+DI - -DI|
    pub min_di_separation: f64,
    /// Minimum ADX
    pub min_adx_strength: f64,
    /// Minimum confidence, 0 to 1
    pub min_confidence: f64,
    /// Signals older than this are discarded before execution
    pub max_signal_age_secs: u64,
    /// Initial stop distance from entry, in percent
    pub trailing_stop_pct: Decimal,
    pub weights: ConfidenceWeights,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            di_period: 14,
            enable_volume_filter: true,
            min_volume_ratio: 1.5,
            volume_lookback: 20,
            min_volume_samples: 5,
            min_di_separation: 2.0,
            min_adx_strength: 20.0,
            min_confidence: 0.60,
            max_signal_age_secs: 30,
            trailing_stop_pct: dec!(5.0),
            weights: ConfidenceWeights::default(),
        }
    }
}

impl Validate for SignalConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.di_period < 2 {
            return Err(TradingError::Config(format!(
                "di_period must be at least 2, got {}",
                self.di_period
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(TradingError::Config(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.trailing_stop_pct <= Decimal::ZERO || self.trailing_stop_pct >= dec!(100) {
            return Err(TradingError::Config(format!(
                "trailing_stop_pct must be within (0, 100), got {}",
                self.trailing_stop_pct
            )));
        }
        if self.min_volume_ratio < 0.0 || self.min_di_separation < 0.0 || self.min_adx_strength < 0.0 {
            return Err(TradingError::Config(
                "volume, separation and ADX thresholds must not be negative".into(),
            ));
        }
        if self.min_volume_samples == 0 || self.volume_lookback < self.min_volume_samples {
            return Err(TradingError::Config(format!(
                "volume_lookback ({}) must be at least min_volume_samples ({}) and both positive",
                self.volume_lookback, self.min_volume_samples
            )));
        }
        let w = &self.weights;
        if [w.volume, w.separation, w.adx, w.trend].iter().any(|x| *x < 0.0) {
            return Err(TradingError::Config("confidence weights must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SignalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_short_period() {
        let config = SignalConfig {
            di_period: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let config = SignalConfig {
            min_confidence: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_stop() {
        let config = SignalConfig {
            trailing_stop_pct: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
