//! Replay of recorded bars as a live market feed.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use trading_core::error::DataError;
use trading_core::traits::MarketFeed;
use trading_core::types::{Bar, MarketEvent};

/// Default channel capacity.
const CHANNEL_CAPACITY: usize = 1024;

/// Feeds recorded bars in timestamp order through a bounded channel.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    events: Vec<MarketEvent>,
    pace: Option<Duration>,
    capacity: usize,
}

impl ReplayFeed {
    /// Merge per-symbol bars into one stream ordered by `(timestamp, symbol)`.
    pub fn from_bars(bars: &BTreeMap<String, Vec<Bar>>) -> Self {
        let mut events: Vec<MarketEvent> = bars
            .values()
            .flat_map(|series| series.iter().cloned().map(MarketEvent::Bar))
            .collect();
        events.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.symbol().cmp(b.symbol()))
        });

        Self {
            events,
            pace: None,
            capacity: CHANNEL_CAPACITY,
        }
    }

    /// Sleep between events to imitate a live session.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl MarketFeed for ReplayFeed {
    async fn subscribe(&self, symbols: &[String]) -> Result<mpsc::Receiver<MarketEvent>, DataError> {
        let events: Vec<MarketEvent> = self
            .events
            .iter()
            .filter(|e| symbols.is_empty() || symbols.iter().any(|s| s == e.symbol()))
            .cloned()
            .collect();

        if events.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        info!(events = events.len(), symbols = symbols.len(), "Starting replay");

        let (tx, rx) = mpsc::channel(self.capacity);
        let pace = self.pace;
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    debug!("Replay receiver dropped");
                    return;
                }
                if let Some(pace) = pace {
                    tokio::time::sleep(pace).await;
                }
            }
            debug!("Replay finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(symbol: &str, minute: u32) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15 + minute, 0)
            .unwrap();
        Bar::new(symbol, ts, 10.0, 11.0, 9.0, 10.0, 100.0)
    }

    fn bars() -> BTreeMap<String, Vec<Bar>> {
        let mut bars = BTreeMap::new();
        bars.insert("TCS".to_string(), vec![bar("TCS", 0), bar("TCS", 1)]);
        bars.insert("INFY".to_string(), vec![bar("INFY", 1), bar("INFY", 0)]);
        bars
    }

    #[tokio::test]
    async fn test_replay_is_time_ordered() {
        let feed = ReplayFeed::from_bars(&bars());
        let mut rx = feed.subscribe(&[]).await.unwrap();

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push((event.timestamp(), event.symbol().to_string()));
        }

        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen[0].1, "INFY");
    }

    #[tokio::test]
    async fn test_subscribe_filters_symbols() {
        let feed = ReplayFeed::from_bars(&bars());
        let mut rx = feed.subscribe(&["TCS".to_string()]).await.unwrap();

        let mut count = 0;
        while let Some(event) = rx.recv().await {
            assert_eq!(event.symbol(), "TCS");
            count += 1;
        }
        assert_eq!(count, 2);

        assert!(feed.subscribe(&["SBIN".to_string()]).await.is_err());
    }
}
