//! Market data feed trait.

use crate::error::DataError;
use crate::types::MarketEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Source of live (or replayed) market events.
///
/// Events for a symbol must arrive with non-decreasing timestamps. The
/// returned channel is the only path into the driver's update loop.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Subscribe to bars and quotes for `symbols`.
    async fn subscribe(&self, symbols: &[String]) -> Result<mpsc::Receiver<MarketEvent>, DataError>;

    /// Get the feed name.
    fn name(&self) -> &str;
}
