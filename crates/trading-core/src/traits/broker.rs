//! Order execution sink.

use crate::error::BrokerError;
use crate::types::{OrderRequest, OrderResult};
use async_trait::async_trait;

/// Destination for orders emitted by the live driver.
///
/// Paper sinks acknowledge immediately (fire-and-forget); live sinks block
/// until the venue confirms. Transport is the implementor's concern.
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Submit an order.
    ///
    /// # Returns
    /// The acknowledgement; an `Err` means nothing was executed
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderResult, BrokerError>;

    /// Whether submissions are confirmed before returning.
    fn is_confirming(&self) -> bool {
        false
    }

    /// Get the sink name.
    fn name(&self) -> &str;
}
