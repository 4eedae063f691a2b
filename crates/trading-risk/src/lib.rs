//! Risk management for trading.
//!
//! Provides the open-position state machine, stop-loss trailing,
//! transaction costs, position sizing, and daily limits.

mod costs;
mod portfolio_limits;
mod position_manager;
mod position_sizer;
mod stop_loss;

pub use costs::CostModel;
pub use portfolio_limits::{DailyLimits, LimitCheck, RiskConfig};
pub use position_manager::{evaluate_exit, exit_reference_price, PositionManager};
pub use position_sizer::RiskBasedSizer;
pub use stop_loss::{is_stop_triggered, StopLossManager};
