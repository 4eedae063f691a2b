//! Position sizing policy.

use rust_decimal::Decimal;

/// Decides how many units to trade for an entry.
pub trait PositionSizer: Send + Sync {
    /// Quantity for an entry at `entry_price` protected by `stop_loss`.
    fn size_for(&self, entry_price: Decimal, stop_loss: Decimal) -> Decimal;
}
