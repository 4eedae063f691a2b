//! Directional crossover signal generation.
//!
//! This crate turns indicator snapshots into scored entry signals:
//! - Crossover detection between consecutive +DI/-DI snapshots
//! - Volume, separation and trend-strength filters
//! - Weighted confidence scoring and entry/stop/target levels

mod config;
mod detector;
mod volume;

pub use config::{ConfidenceWeights, SignalConfig};
pub use detector::{
    detect_crossover, is_opposite_crossover, quality_scores, PriceLevels, ScoreCard,
    SignalDetector, SignalOutcome, SignalRejection,
};
pub use volume::VolumeTracker;
