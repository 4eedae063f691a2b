//! Closed trade records.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Direction, ExitReason, IndicatorSnapshot};

/// Immutable record of a closed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub symbol: String,
    pub direction: Direction,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: Decimal,
    /// Fill price including exit slippage
    pub exit_price: Decimal,
    pub quantity: Decimal,
    /// Profit before commission
    pub gross_pnl: Decimal,
    /// Round-trip commission
    pub commission: Decimal,
    /// Realized profit after commission
    pub pnl: Decimal,
    /// `pnl` as a percentage of entry notional
    pub pnl_pct: Decimal,
    pub exit_reason: ExitReason,
    pub holding_minutes: f64,
    pub entry_indicators: IndicatorSnapshot,
    /// Best price reached while open
    pub max_favorable_price: Decimal,
    /// Worst price reached while open
    pub max_adverse_price: Decimal,
}

impl TradeResult {
    #[inline]
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    #[inline]
    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }
}
