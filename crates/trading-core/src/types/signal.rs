//! Trading signals produced by directional crossovers.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{IndicatorSnapshot, Side};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Order side that opens a position in this direction.
    pub fn entry_side(&self) -> Side {
        match self {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }

    /// Order side that closes a position in this direction.
    pub fn exit_side(&self) -> Side {
        self.entry_side().opposite()
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Normalised quality features that feed the confidence score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    /// min(volume_ratio / 2, 1)
    pub volume_ratio: f64,
    /// min(separation / 10, 1)
    pub di_separation: f64,
    /// min(adx / 50, 1)
    pub adx_strength: f64,
    /// 0.6 * min(separation / 20, 1) + 0.4 * min(adx / 50, 1)
    pub trend_consistency: f64,
}

/// A scored entry candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub di_plus: f64,
    pub di_minus: f64,
    pub adx: f64,
    pub separation: f64,
    /// Reference price adjusted for entry slippage
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub target_price: Decimal,
    /// Weighted score in `[0, 1]`
    pub confidence: f64,
    pub volume_ratio: f64,
    pub volume_at_signal: f64,
    pub timestamp: NaiveDateTime,
    /// Mandatory square-off for the signal's session
    pub deadline: NaiveDateTime,
    /// Price risk per unit, |entry - stop|
    pub risk_amount: Decimal,
    /// Price reward per unit, |target - entry|
    pub reward_amount: Decimal,
    pub risk_reward_ratio: Decimal,
    pub quality: QualityScores,
    /// Indicator snapshot the crossover was detected on
    pub indicators: IndicatorSnapshot,
}

impl Signal {
    /// Age of the signal at `now`.
    pub fn age(&self, now: NaiveDateTime) -> Duration {
        now - self.timestamp
    }

    /// True once the signal is older than `max_age`.
    pub fn is_stale(&self, now: NaiveDateTime, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}
