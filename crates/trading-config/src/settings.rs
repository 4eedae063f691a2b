//! Configuration structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use trading_backtest::BacktestConfig;
use trading_core::error::TradingError;
use trading_core::timing::SessionConfig;
use trading_core::traits::Validate;
use trading_live::LiveConfig;
use trading_risk::{CostModel, RiskConfig};
use trading_strategies::SignalConfig;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub strategy: SignalConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub costs: CostModel,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Check every section. The first failure is returned.
    pub fn validate(&self) -> Result<(), TradingError> {
        self.strategy.validate()?;
        self.risk.validate()?;
        self.costs.validate()?;
        self.session.validate()?;
        self.live.validate()?;
        self.backtest.validate()?;
        Ok(())
    }
}

/// Whether orders go to the paper sink or a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Paper,
    Live,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Paper => f.write_str("paper"),
            RunMode::Live => f.write_str("live"),
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub mode: RunMode,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "adx-trader".to_string(),
            mode: RunMode::Paper,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// JSON lines instead of the pretty format
    pub json: bool,
    /// Daily rolling log files are written here when set
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}
