//! Logging setup.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter, Layer};

/// File name prefix of the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "adx-trader.log";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `level`. When `directory` is set, JSON lines are also
/// written to a daily rolling file there; keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn setup_logging(
    level: &str,
    json: bool,
    directory: Option<&Path>,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    };

    let (file, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()?;

    Ok(guard)
}
