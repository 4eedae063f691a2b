//! ADX/DI crossover signal detection and quality scoring.
//!
//! A long candidate appears when +DI crosses above -DI between two
//! consecutive snapshots; a short candidate on the mirror image. Candidates
//! are then filtered on volume, DI separation and ADX (in that order) and
//! finally gated on a weighted confidence score.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use tracing::debug;
use trading_core::error::TradingError;
use trading_core::traits::Validate;
use trading_core::types::{to_decimal, Direction, IndicatorSnapshot, QualityScores, Signal};

use crate::config::SignalConfig;
use crate::volume::VolumeTracker;

/// Target distance as a multiple of the stop distance.
const REWARD_RISK_MULTIPLE: Decimal = dec!(2);

/// Detect a directional crossover between two snapshots of the same symbol.
///
/// Long: `prev +DI <= prev -DI` and `cur +DI > cur -DI`. Short is symmetric.
pub fn detect_crossover(
    current: &IndicatorSnapshot,
    previous: Option<&IndicatorSnapshot>,
) -> Option<Direction> {
    let previous = previous?;
    if previous.symbol != current.symbol {
        return None;
    }

    if previous.di_plus <= previous.di_minus && current.di_plus > current.di_minus {
        Some(Direction::Long)
    } else if previous.di_minus <= previous.di_plus && current.di_minus > current.di_plus {
        Some(Direction::Short)
    } else {
        None
    }
}

/// Whether the latest snapshots show a crossover against `direction`.
pub fn is_opposite_crossover(
    direction: Direction,
    current: &IndicatorSnapshot,
    previous: Option<&IndicatorSnapshot>,
) -> bool {
    detect_crossover(current, previous) == Some(direction.opposite())
}

/// Why a crossover was not turned into a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalRejection {
    LowVolume { ratio: f64 },
    NarrowSeparation { separation: f64 },
    WeakTrend { adx: f64 },
    LowConfidence { confidence: f64 },
}

impl fmt::Display for SignalRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalRejection::LowVolume { ratio } => write!(f, "volume ratio {:.2} too low", ratio),
            SignalRejection::NarrowSeparation { separation } => {
                write!(f, "DI separation {:.2} too narrow", separation)
            }
            SignalRejection::WeakTrend { adx } => write!(f, "ADX {:.2} too weak", adx),
            SignalRejection::LowConfidence { confidence } => {
                write!(f, "confidence {:.3} below threshold", confidence)
            }
        }
    }
}

/// Accepted score of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCard {
    pub confidence: f64,
    pub volume_ratio: f64,
    pub quality: QualityScores,
}

/// Result of evaluating the latest snapshot of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    NoCrossover,
    Rejected {
        direction: Direction,
        reason: SignalRejection,
    },
    Accepted(Box<Signal>),
}

impl SignalOutcome {
    /// The accepted signal, if any.
    pub fn into_signal(self) -> Option<Signal> {
        match self {
            SignalOutcome::Accepted(signal) => Some(*signal),
            _ => None,
        }
    }
}

/// Entry, stop and target for a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevels {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
}

/// Crossover detector and scorer. Holds only per-symbol volume history.
#[derive(Debug, Clone)]
pub struct SignalDetector {
    config: SignalConfig,
    slippage_pct: Decimal,
    volumes: VolumeTracker,
}

impl SignalDetector {
    /// Create a detector from a validated configuration.
    pub fn new(config: SignalConfig) -> Result<Self, TradingError> {
        config.validate()?;
        let volumes = VolumeTracker::new(config.volume_lookback, config.min_volume_samples);
        Ok(Self {
            config,
            slippage_pct: Decimal::ZERO,
            volumes,
        })
    }

    /// Set entry slippage in percent of the reference price.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Record a bar's volume for the symbol.
    pub fn observe_volume(&mut self, symbol: &str, volume: f64) {
        self.volumes.record(symbol, volume);
    }

    /// Current volume relative to the recorded window.
    pub fn volume_ratio(&self, symbol: &str, current_volume: f64) -> f64 {
        self.volumes.ratio(symbol, current_volume)
    }

    /// Forget a symbol's volume history.
    pub fn reset(&mut self, symbol: &str) {
        self.volumes.reset(symbol);
    }

    /// Score a crossover snapshot.
    ///
    /// Filters short-circuit in order: volume, separation, ADX, confidence.
    pub fn score(
        &self,
        snapshot: &IndicatorSnapshot,
        volume_ratio: f64,
    ) -> Result<ScoreCard, SignalRejection> {
        let config = &self.config;
        let separation = snapshot.separation();
        let adx = snapshot.adx;

        if config.enable_volume_filter && volume_ratio < config.min_volume_ratio {
            return Err(SignalRejection::LowVolume {
                ratio: volume_ratio,
            });
        }
        if separation < config.min_di_separation {
            return Err(SignalRejection::NarrowSeparation { separation });
        }
        if adx < config.min_adx_strength {
            return Err(SignalRejection::WeakTrend { adx });
        }

        let quality = quality_scores(volume_ratio, separation, adx);
        let w = &config.weights;
        let confidence = (w.volume * quality.volume_ratio
            + w.separation * quality.di_separation
            + w.adx * quality.adx_strength
            + w.trend * quality.trend_consistency)
            .clamp(0.0, 1.0);

        if confidence < config.min_confidence {
            return Err(SignalRejection::LowConfidence { confidence });
        }

        Ok(ScoreCard {
            confidence,
            volume_ratio,
            quality,
        })
    }

    /// Entry with slippage, stop at the configured distance and a 2:1 target.
    pub fn price_levels(&self, direction: Direction, reference_price: Decimal) -> PriceLevels {
        let slip = self.slippage_pct / dec!(100);
        let stop_pct = self.config.trailing_stop_pct / dec!(100);

        let (entry, stop_loss) = match direction {
            Direction::Long => {
                let entry = reference_price * (Decimal::ONE + slip);
                (entry, entry * (Decimal::ONE - stop_pct))
            }
            Direction::Short => {
                let entry = reference_price * (Decimal::ONE - slip);
                (entry, entry * (Decimal::ONE + stop_pct))
            }
        };

        let reward = (entry - stop_loss).abs() * REWARD_RISK_MULTIPLE;
        let target = match direction {
            Direction::Long => entry + reward,
            Direction::Short => entry - reward,
        };

        PriceLevels {
            entry,
            stop_loss,
            target,
        }
    }

    /// Evaluate the latest snapshot of a symbol.
    ///
    /// `reference_price` is the last traded price, `volume` the latest bar
    /// volume (already recorded with [`observe_volume`](Self::observe_volume))
    /// and `deadline` the session's square-off instant.
    pub fn evaluate(
        &self,
        current: &IndicatorSnapshot,
        previous: Option<&IndicatorSnapshot>,
        reference_price: f64,
        volume: f64,
        deadline: NaiveDateTime,
    ) -> SignalOutcome {
        let Some(direction) = detect_crossover(current, previous) else {
            return SignalOutcome::NoCrossover;
        };

        let volume_ratio = self.volume_ratio(&current.symbol, volume);
        let card = match self.score(current, volume_ratio) {
            Ok(card) => card,
            Err(reason) => {
                debug!(symbol = %current.symbol, %direction, %reason, "crossover rejected");
                return SignalOutcome::Rejected { direction, reason };
            }
        };

        let levels = self.price_levels(direction, to_decimal(reference_price));
        let risk_amount = (levels.entry - levels.stop_loss).abs();
        let reward_amount = (levels.target - levels.entry).abs();
        let risk_reward_ratio = if risk_amount > Decimal::ZERO {
            reward_amount / risk_amount
        } else {
            Decimal::ZERO
        };

        debug!(
            symbol = %current.symbol,
            %direction,
            confidence = card.confidence,
            entry = %levels.entry,
            "crossover accepted"
        );

        SignalOutcome::Accepted(Box::new(Signal {
            symbol: current.symbol.clone(),
            direction,
            di_plus: current.di_plus,
            di_minus: current.di_minus,
            adx: current.adx,
            separation: current.separation(),
            entry_price: levels.entry,
            stop_loss: levels.stop_loss,
            target_price: levels.target,
            confidence: card.confidence,
            volume_ratio: card.volume_ratio,
            volume_at_signal: volume,
            timestamp: current.timestamp,
            deadline,
            risk_amount,
            reward_amount,
            risk_reward_ratio,
            quality: card.quality,
            indicators: current.clone(),
        }))
    }
}

/// Normalised quality features with fixed clamp points.
pub fn quality_scores(volume_ratio: f64, separation: f64, adx: f64) -> QualityScores {
    let adx_strength = (adx / 50.0).min(1.0);
    QualityScores {
        volume_ratio: (volume_ratio / 2.0).min(1.0),
        di_separation: (separation / 10.0).min(1.0),
        adx_strength,
        trend_consistency: 0.6 * (separation / 20.0).min(1.0) + 0.4 * adx_strength,
    }
}
