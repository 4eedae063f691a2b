//! Directional movement indicator snapshot.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// +DI / -DI / ADX values for one symbol at one bar.
///
/// `di_plus`, `di_minus` and `adx` are always within `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    /// Positive directional indicator
    pub di_plus: f64,
    /// Negative directional indicator
    pub di_minus: f64,
    /// Average directional index
    pub adx: f64,
    /// Raw true range of the bar
    pub true_range: f64,
    /// Raw positive directional movement of the bar
    pub dm_plus: f64,
    /// Raw negative directional movement of the bar
    pub dm_minus: f64,
}

impl IndicatorSnapshot {
    /// Distance between the two directional indicators.
    #[inline]
    pub fn separation(&self) -> f64 {
        (self.di_plus - self.di_minus).abs()
    }

    /// +DI strictly above -DI.
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.di_plus > self.di_minus
    }

    /// -DI strictly above +DI.
    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.di_minus > self.di_plus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_separation() {
        let snapshot = IndicatorSnapshot {
            symbol: "SBIN".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            di_plus: 18.0,
            di_minus: 25.5,
            adx: 30.0,
            true_range: 1.0,
            dm_plus: 0.0,
            dm_minus: 0.5,
        };

        assert!((snapshot.separation() - 7.5).abs() < 1e-9);
        assert!(snapshot.is_bearish());
        assert!(!snapshot.is_bullish());
    }
}
