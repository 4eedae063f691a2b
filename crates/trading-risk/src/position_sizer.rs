//! Position sizing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_core::traits::PositionSizer;

/// Sizes entries so that a stop-out loses a fixed share of the portfolio.
///
/// `quantity = floor(portfolio * risk% / |entry - stop|)`, never below the
/// minimum quantity.
#[derive(Debug, Clone)]
pub struct RiskBasedSizer {
    portfolio_value: Decimal,
    risk_percent: Decimal,
    min_quantity: Decimal,
}

impl RiskBasedSizer {
    /// Create a new sizer.
    pub fn new(portfolio_value: Decimal, risk_percent: Decimal) -> Self {
        Self {
            portfolio_value,
            risk_percent,
            min_quantity: Decimal::ONE,
        }
    }

    /// Set the smallest quantity ever returned.
    pub fn with_min_quantity(mut self, min: Decimal) -> Self {
        self.min_quantity = min;
        self
    }

    /// Money at risk per trade.
    pub fn risk_amount(&self) -> Decimal {
        self.portfolio_value * self.risk_percent / dec!(100)
    }
}

impl PositionSizer for RiskBasedSizer {
    fn size_for(&self, entry_price: Decimal, stop_loss: Decimal) -> Decimal {
        let risk_per_share = (entry_price - stop_loss).abs();
        if risk_per_share <= Decimal::ZERO {
            return self.min_quantity;
        }

        (self.risk_amount() / risk_per_share)
            .floor()
            .max(self.min_quantity)
    }
}
