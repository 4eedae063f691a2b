//! Core data types for the trading system.

mod indicator;
mod metrics;
mod ohlcv;
mod order;
mod position;
mod signal;
mod trade;

pub use indicator::IndicatorSnapshot;
pub use metrics::StrategyMetrics;
pub use ohlcv::{to_decimal, Bar, MarketEvent, Quote};
pub use order::{OrderRequest, OrderResult, OrderStatus, OrderType, Side};
pub use position::{ExitReason, Position, PriceUpdate};
pub use signal::{Direction, QualityScores, Signal};
pub use trade::TradeResult;
