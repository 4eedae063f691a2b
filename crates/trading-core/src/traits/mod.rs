//! Core traits for the trading system.

mod broker;
mod clock;
mod data_source;
mod indicator;
mod sizing;
mod validate;

pub use broker::OrderSink;
pub use clock::{Clock, ManualClock, SystemClock};
pub use data_source::MarketFeed;
pub use indicator::StreamingIndicator;
pub use sizing::PositionSizer;
pub use validate::Validate;
