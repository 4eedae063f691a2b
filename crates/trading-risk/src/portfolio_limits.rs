//! Portfolio-level risk limits.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;
use trading_core::traits::Validate;

use crate::position_sizer::RiskBasedSizer;

/// Result of a limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitCheck {
    /// Trade allowed
    Allowed,
    /// Trade blocked with reason
    Blocked { reason: String },
}

impl LimitCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LimitCheck::Allowed)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, LimitCheck::Blocked { .. })
    }
}

/// Risk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Portfolio value used for sizing and the daily loss limit
    pub portfolio_value: Decimal,
    /// Percent of the portfolio lost if a stop is hit
    pub risk_per_trade_pct: Decimal,
    /// Maximum number of open positions
    pub max_positions: usize,
    /// Maximum entries per trading day
    pub max_daily_trades: usize,
    /// Realized loss per day, in percent of portfolio value, that halts entries
    pub max_daily_loss_pct: Decimal,
    pub enable_trailing_stops: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            portfolio_value: dec!(100000),
            risk_per_trade_pct: dec!(1),
            max_positions: 5,
            max_daily_trades: 20,
            max_daily_loss_pct: dec!(5),
            enable_trailing_stops: true,
        }
    }
}

impl RiskConfig {
    /// Sizer for this portfolio.
    pub fn sizer(&self) -> RiskBasedSizer {
        RiskBasedSizer::new(self.portfolio_value, self.risk_per_trade_pct)
    }

    /// Daily loss, in money, that halts new entries.
    pub fn daily_loss_limit(&self) -> Decimal {
        self.portfolio_value * self.max_daily_loss_pct / dec!(100)
    }
}

impl Validate for RiskConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.portfolio_value <= Decimal::ZERO {
            return Err(TradingError::Config("portfolio_value must be positive".into()));
        }
        if self.risk_per_trade_pct <= Decimal::ZERO || self.risk_per_trade_pct > dec!(100) {
            return Err(TradingError::Config(format!(
                "risk_per_trade_pct must be in (0, 100], got {}",
                self.risk_per_trade_pct
            )));
        }
        if self.max_positions == 0 {
            return Err(TradingError::Config("max_positions must be > 0".into()));
        }
        if self.max_daily_trades == 0 {
            return Err(TradingError::Config("max_daily_trades must be > 0".into()));
        }
        if self.max_daily_loss_pct <= Decimal::ZERO {
            return Err(TradingError::Config("max_daily_loss_pct must be positive".into()));
        }
        Ok(())
    }
}

/// Per-day entry counter and realized PnL, reset on each new trading date.
#[derive(Debug, Clone)]
pub struct DailyLimits {
    max_positions: usize,
    max_daily_trades: usize,
    loss_limit: Decimal,
    date: Option<NaiveDate>,
    trades: usize,
    realized_pnl: Decimal,
}

impl DailyLimits {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            max_positions: config.max_positions,
            max_daily_trades: config.max_daily_trades,
            loss_limit: config.daily_loss_limit(),
            date: None,
            trades: 0,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Move to `date`, clearing the counters if it is a new day.
    pub fn roll(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            self.date = Some(date);
            self.trades = 0;
            self.realized_pnl = Decimal::ZERO;
        }
    }

    pub fn record_entry(&mut self) {
        self.trades += 1;
    }

    pub fn record_exit(&mut self, pnl: Decimal) {
        self.realized_pnl += pnl;
    }

    pub fn trades_today(&self) -> usize {
        self.trades
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Realized losses today reached the configured limit.
    pub fn loss_limit_hit(&self) -> bool {
        self.realized_pnl <= -self.loss_limit
    }

    /// Check if a new position is allowed with `open_positions` already open.
    pub fn check_new_position(&self, open_positions: usize) -> LimitCheck {
        if self.loss_limit_hit() {
            return LimitCheck::Blocked {
                reason: format!(
                    "Daily loss limit reached: {:.2} (limit: {:.2})",
                    self.realized_pnl, self.loss_limit
                ),
            };
        }

        if open_positions >= self.max_positions {
            return LimitCheck::Blocked {
                reason: format!(
                    "Max positions reached: {} (limit: {})",
                    open_positions, self.max_positions
                ),
            };
        }

        if self.trades >= self.max_daily_trades {
            return LimitCheck::Blocked {
                reason: format!(
                    "Max daily trades reached: {} (limit: {})",
                    self.trades, self.max_daily_trades
                ),
            };
        }

        LimitCheck::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_position_and_trade_limits() {
        let config = RiskConfig {
            max_positions: 2,
            max_daily_trades: 3,
            ..RiskConfig::default()
        };
        let mut limits = DailyLimits::new(&config);
        limits.roll(day(2));

        assert!(limits.check_new_position(1).is_allowed());
        assert!(limits.check_new_position(2).is_blocked());

        for _ in 0..3 {
            limits.record_entry();
        }
        assert!(limits.check_new_position(0).is_blocked());

        // New day resets the counter
        limits.roll(day(3));
        assert_eq!(limits.trades_today(), 0);
        assert!(limits.check_new_position(0).is_allowed());
    }

    #[test]
    fn test_daily_loss_limit() {
        let config = RiskConfig::default(); // 5% of 100k
        let mut limits = DailyLimits::new(&config);
        limits.roll(day(2));

        limits.record_exit(dec!(-3000));
        assert!(!limits.loss_limit_hit());
        limits.record_exit(dec!(-2000));
        assert!(limits.loss_limit_hit());
        assert!(limits.check_new_position(0).is_blocked());

        limits.roll(day(2));
        assert!(limits.loss_limit_hit());
        limits.roll(day(3));
        assert!(!limits.loss_limit_hit());
    }

    #[test]
    fn test_config_validation() {
        assert!(RiskConfig::default().validate().is_ok());

        let bad = RiskConfig {
            risk_per_trade_pct: dec!(-1),
            ..RiskConfig::default()
        };
        assert!(bad.validate().is_err());

        let no_positions = RiskConfig {
            max_positions: 0,
            ..RiskConfig::default()
        };
        assert!(no_positions.validate().is_err());
    }
}
