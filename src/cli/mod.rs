//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Used when no `--config` is given; may be absent.
pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "adx-trader")]
#[command(author, version, about = "Intraday ADX/DI crossover trading engine")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ADX_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log level (overrides the configured one)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The configuration file to load, if any.
    ///
    /// A missing default file falls back to defaults plus environment.
    pub fn config_path(&self) -> Option<&Path> {
        if self.config.exists() || self.config != Path::new(DEFAULT_CONFIG) {
            Some(&self.config)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay historical bars through the strategy
    Backtest(BacktestArgs),
    /// Run the live orchestrator against replayed bars and the paper sink
    Paper(PaperArgs),
    /// Show the session state at a given time
    MarketStatus(MarketStatusArgs),
    /// Validate configuration
    ValidateConfig {
        /// Print the effective configuration as TOML
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// CSV file or directory of CSV files
    #[arg(short, long)]
    pub data: PathBuf,

    /// Symbols to trade (comma-separated, default: all loaded)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Initial capital (overrides the configured one)
    #[arg(long)]
    pub capital: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Directory for report.json, trades.csv and equity.csv
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    /// CSV file or directory of CSV files to replay
    #[arg(short, long)]
    pub data: PathBuf,

    /// Symbols to trade (comma-separated, default: all loaded)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Delay between replayed bars in milliseconds
    #[arg(long, default_value = "0")]
    pub pace_ms: u64,
}

#[derive(clap::Args)]
pub struct MarketStatusArgs {
    /// Exchange-local time, e.g. "2024-01-02 10:30" (default: now)
    #[arg(long)]
    pub at: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}
