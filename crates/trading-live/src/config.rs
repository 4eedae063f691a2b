//! Live driver configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trading_core::error::TradingError;
use trading_core::traits::Validate;

/// Cycle pacing and feed connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Seconds between orchestration cycles
    pub cycle_interval_secs: u64,
    /// Upper bound on subscribing to the market feed
    pub connect_timeout_secs: u64,
    /// Also run a cycle after every market event
    pub cycle_on_event: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 10,
            connect_timeout_secs: 15,
            cycle_on_event: false,
        }
    }
}

impl LiveConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Validate for LiveConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.cycle_interval_secs == 0 {
            return Err(TradingError::Config("cycle_interval_secs must be > 0".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(TradingError::Config("connect_timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}
