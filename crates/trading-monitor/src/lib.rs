//! Logging setup and strategy event monitoring.

mod events;
mod logging;

pub use events::{EventLogger, EventTally};
pub use logging::{setup_logging, LOG_FILE_PREFIX};
