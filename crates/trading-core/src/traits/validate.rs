//! Startup validation for configuration sections.

use crate::error::TradingError;

/// Configuration that must be checked before any component starts.
///
/// A failure is fatal: the process refuses to start.
pub trait Validate {
    fn validate(&self) -> Result<(), TradingError>;
}
