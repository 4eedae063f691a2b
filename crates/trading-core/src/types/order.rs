//! Order types exchanged with the execution sink.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
}

/// Order status as reported back by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Sent, no confirmation requested (paper fire-and-forget)
    Submitted,
    /// Accepted by the venue, not yet filled
    Accepted,
    /// Completely filled
    Filled,
    /// Rejected by the venue
    Rejected,
}

impl OrderStatus {
    /// A position may be opened on this status.
    pub fn is_executed(&self) -> bool {
        matches!(
            self,
            OrderStatus::Submitted | OrderStatus::Accepted | OrderStatus::Filled
        )
    }
}

/// Order request for submitting new orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Type of order
    pub order_type: OrderType,
    /// Quantity to trade
    pub quantity: Decimal,
    /// Reference price the decision was made at
    pub reference_price: Option<Decimal>,
    /// Client-provided order ID
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Create a market order request.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            reference_price: None,
            client_order_id: None,
        }
    }

    /// Attach the reference price.
    pub fn with_reference_price(mut self, price: Decimal) -> Self {
        self.reference_price = Some(price);
        self
    }

    /// Set a client order ID.
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Acknowledgement returned by an order sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Sink-assigned order ID
    pub order_id: Uuid,
    /// Client order ID, generated when the request carried none
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub status: OrderStatus,
    /// Fill price when known
    pub fill_price: Option<Decimal>,
    pub timestamp: NaiveDateTime,
}

impl OrderResult {
    /// Build a result for a request with a fresh order ID.
    pub fn from_request(
        request: &OrderRequest,
        status: OrderStatus,
        fill_price: Option<Decimal>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            client_order_id: request
                .client_order_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            status,
            fill_price,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_market() {
        let request = OrderRequest::market("HDFCBANK", Side::Buy, dec!(100))
            .with_reference_price(dec!(1500.5));
        assert_eq!(request.symbol, "HDFCBANK");
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.order_type, OrderType::Market);
        assert_eq!(request.quantity, dec!(100));
        assert_eq!(request.reference_price, Some(dec!(1500.5)));
    }

    #[test]
    fn test_order_result_keeps_client_id() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let request = OrderRequest::market("HDFCBANK", Side::Sell, dec!(5)).with_client_order_id("abc");
        let result = OrderResult::from_request(&request, OrderStatus::Filled, Some(dec!(10)), ts);

        assert_eq!(result.client_order_id, "abc");
        assert_eq!(result.side, Side::Sell);
        assert!(result.status.is_executed());
        assert!(!OrderStatus::Rejected.is_executed());
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
