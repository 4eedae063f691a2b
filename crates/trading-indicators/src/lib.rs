//! Streaming technical indicators.
//!
//! This crate provides the directional movement system used for signal
//! generation:
//! - Wilder's recursive smoothing as a [`StreamingIndicator`](trading_core::traits::StreamingIndicator)
//! - +DI, -DI and ADX maintained per symbol by [`IndicatorEngine`]

pub mod directional;
pub mod wilder;

pub use directional::{directional_movement, IndicatorEngine};
pub use wilder::WilderSmoother;
