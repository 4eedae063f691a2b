//! Core types and traits for the trading system.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Quote, MarketEvent)
//! - Indicator snapshots, signals, positions and trade records
//! - Session timing and the square-off deadline
//! - Collaborator traits for order sinks, feeds, sizing and clocks

pub mod error;
pub mod timing;
pub mod traits;
pub mod types;

pub use error::{TradingError, TradingResult};
pub use timing::{EntryRejection, MarketStatus, SessionConfig, TimingPolicy};
pub use traits::*;
pub use types::*;
