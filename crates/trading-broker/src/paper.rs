//! Paper order sink for simulation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};
use trading_core::error::BrokerError;
use trading_core::traits::{Clock, OrderSink};
use trading_core::types::{OrderRequest, OrderResult, OrderStatus};

/// Paper sink: every valid order fills immediately at its reference price.
///
/// Clones share the order log, so a test can keep a handle while the
/// orchestrator owns the sink.
#[derive(Clone)]
pub struct PaperBroker {
    clock: Arc<dyn Clock>,
    orders: Arc<Mutex<Vec<OrderResult>>>,
    reject_all: Arc<AtomicBool>,
}

impl PaperBroker {
    /// Create a paper sink stamping fills with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            orders: Arc::new(Mutex::new(Vec::new())),
            reject_all: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every following submission fail, or succeed again.
    pub fn set_reject_all(&self, reject: bool) {
        self.reject_all.store(reject, Ordering::SeqCst);
    }

    /// Every accepted order so far, in submission order.
    pub fn orders(&self) -> Vec<OrderResult> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn order_count(&self) -> usize {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for PaperBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperBroker")
            .field("orders", &self.order_count())
            .field("reject_all", &self.reject_all.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl OrderSink for PaperBroker {
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderResult, BrokerError> {
        if self.reject_all.load(Ordering::SeqCst) {
            warn!(symbol = %request.symbol, side = %request.side, "Paper order rejected");
            return Err(BrokerError::OrderRejected(format!(
                "paper sink rejecting {} {}",
                request.side, request.symbol
            )));
        }

        if request.quantity <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }

        let result = OrderResult::from_request(
            &request,
            OrderStatus::Filled,
            request.reference_price,
            self.clock.now(),
        );

        info!(
            symbol = %result.symbol,
            side = %result.side,
            quantity = %result.quantity,
            price = ?result.fill_price,
            "Paper order filled"
        );

        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());

        Ok(result)
    }

    fn name(&self) -> &str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use trading_core::traits::ManualClock;
    use trading_core::types::Side;

    fn broker() -> PaperBroker {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        PaperBroker::new(Arc::new(ManualClock::new(start)))
    }

    #[tokio::test]
    async fn test_market_order_fills_at_reference() {
        let broker = broker();
        let request = OrderRequest::market("SBIN", Side::Buy, dec!(10)).with_reference_price(dec!(600));

        let result = broker.submit_order(request).await.unwrap();
        assert_eq!(result.status, OrderStatus::Filled);
        assert_eq!(result.fill_price, Some(dec!(600)));
        assert_eq!(broker.order_count(), 1);
        assert_eq!(broker.name(), "paper");
        assert!(!broker.is_confirming());
    }

    #[tokio::test]
    async fn test_rejects_when_asked() {
        let broker = broker();
        let handle = broker.clone();
        handle.set_reject_all(true);

        let request = OrderRequest::market("SBIN", Side::Sell, dec!(10));
        assert!(matches!(
            broker.submit_order(request.clone()).await,
            Err(BrokerError::OrderRejected(_))
        ));
        assert_eq!(handle.order_count(), 0);

        handle.set_reject_all(false);
        assert!(broker.submit_order(request).await.is_ok());
        assert_eq!(handle.orders()[0].side, Side::Sell);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let broker = broker();
        let request = OrderRequest::market("SBIN", Side::Buy, Decimal::ZERO);
        assert!(broker.submit_order(request).await.is_err());
    }
}
