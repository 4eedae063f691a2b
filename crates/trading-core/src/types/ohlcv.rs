//! Market data: OHLCV bars, quotes and the event envelope delivered to drivers.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PriceUpdate;

/// Convert an f64 market price into a Decimal, falling back to zero for NaN/inf.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}

/// OHLCV bar for a single symbol.
/// Prices stay f64 for fast indicator calculations; timestamps are exchange-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Symbol identifier
    pub symbol: String,
    /// Bar open time in exchange-local time
    pub timestamp: NaiveDateTime,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Calculate the true range against the previous close.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }

    /// Check that prices are positive and the OHLC relationships hold.
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }

    /// Price update used by position monitoring.
    pub fn price_update(&self) -> PriceUpdate {
        PriceUpdate {
            timestamp: self.timestamp,
            high: to_decimal(self.high),
            low: to_decimal(self.low),
            close: to_decimal(self.close),
        }
    }
}

/// A real-time quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol
    pub symbol: String,
    /// Exchange-local timestamp
    pub timestamp: NaiveDateTime,
    /// Last traded price
    pub last_price: f64,
    /// Best bid price
    pub bid: f64,
    /// Best ask price
    pub ask: f64,
    /// Volume traded (as reported by the feed)
    pub volume: f64,
}

impl Quote {
    /// A quote is a degenerate bar: high, low and close are all the last price.
    pub fn price_update(&self) -> PriceUpdate {
        let price = to_decimal(self.last_price);
        PriceUpdate {
            timestamp: self.timestamp,
            high: price,
            low: price,
            close: price,
        }
    }
}

/// Event delivered by a market feed to the single-consumer update loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A completed bar; advances indicators.
    Bar(Bar),
    /// A tick; only moves prices.
    Quote(Quote),
}

impl MarketEvent {
    pub fn symbol(&self) -> &str {
        match self {
            MarketEvent::Bar(bar) => &bar.symbol,
            MarketEvent::Quote(quote) => &quote.symbol,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            MarketEvent::Bar(bar) => bar.timestamp,
            MarketEvent::Quote(quote) => quote.timestamp,
        }
    }

    /// Last traded price carried by the event.
    pub fn last_price(&self) -> f64 {
        match self {
            MarketEvent::Bar(bar) => bar.close,
            MarketEvent::Quote(quote) => quote.last_price,
        }
    }

    pub fn volume(&self) -> f64 {
        match self {
            MarketEvent::Bar(bar) => bar.volume,
            MarketEvent::Quote(quote) => quote.volume,
        }
    }

    pub fn price_update(&self) -> PriceUpdate {
        match self {
            MarketEvent::Bar(bar) => bar.price_update(),
            MarketEvent::Quote(quote) => quote.price_update(),
        }
    }
}
