//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LoggingConfig, RunMode};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;
use trading_core::error::TradingError;

/// Environment variable prefix, e.g. `ADX__RISK__MAX_POSITIONS=3`.
pub const ENV_PREFIX: &str = "ADX";

/// Errors raised while loading or checking configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] TradingError),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Load configuration from an optional file and the environment.
///
/// A missing file is an error only when `path` is given. Environment
/// variables override file values.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigurationError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Load and validate in one step. Any failure is fatal at startup.
pub fn load_validated(path: Option<&Path>) -> Result<AppConfig, ConfigurationError> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text, without the environment layer.
pub fn from_toml_str(text: &str) -> Result<AppConfig, ConfigurationError> {
    let config = Config::builder()
        .add_source(File::from_str(text, config::FileFormat::Toml))
        .build()?;
    Ok(config.try_deserialize()?)
}

/// Render a configuration back to TOML.
pub fn to_toml_string(config: &AppConfig) -> Result<String, ConfigurationError> {
    Ok(toml::to_string_pretty(config)?)
}
