//! Transaction cost model.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;
use trading_core::traits::Validate;
use trading_core::types::Direction;

/// Slippage and commission, both in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Applied against the trader on entry and on exit
    pub slippage_pct: Decimal,
    /// Charged on entry notional plus exit notional
    pub commission_pct: Decimal,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            slippage_pct: dec!(0.1),
            commission_pct: dec!(0.05),
        }
    }
}

impl CostModel {
    /// No costs at all.
    pub fn free() -> Self {
        Self {
            slippage_pct: Decimal::ZERO,
            commission_pct: Decimal::ZERO,
        }
    }

    /// Fill price for an exit: longs sell lower, shorts buy back higher.
    pub fn exit_fill(&self, direction: Direction, price: Decimal) -> Decimal {
        let slip = self.slippage_pct / dec!(100);
        match direction {
            Direction::Long => price * (Decimal::ONE - slip),
            Direction::Short => price * (Decimal::ONE + slip),
        }
    }

    /// Round-trip commission.
    pub fn commission(&self, entry_notional: Decimal, exit_notional: Decimal) -> Decimal {
        (entry_notional + exit_notional) * self.commission_pct / dec!(100)
    }
}

impl Validate for CostModel {
    fn validate(&self) -> Result<(), TradingError> {
        if self.slippage_pct < Decimal::ZERO || self.commission_pct < Decimal::ZERO {
            return Err(TradingError::Config(
                "slippage_pct and commission_pct must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_slippage_is_adverse() {
        let costs = CostModel::default();
        assert_eq!(costs.exit_fill(Direction::Long, dec!(100)), dec!(99.9));
        assert_eq!(costs.exit_fill(Direction::Short, dec!(100)), dec!(100.1));
    }

    #[test]
    fn test_round_trip_commission() {
        let costs = CostModel::default();
        // 0.05% of 10_000 + 11_000
        assert_eq!(costs.commission(dec!(10000), dec!(11000)), dec!(10.5));
        assert_eq!(CostModel::free().commission(dec!(10000), dec!(11000)), Decimal::ZERO);
    }

    #[test]
    fn test_negative_costs_rejected() {
        let costs = CostModel {
            slippage_pct: dec!(-0.1),
            ..CostModel::default()
        };
        assert!(costs.validate().is_err());
    }
}
