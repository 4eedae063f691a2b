//! CLI command implementations.

pub mod backtest;
pub mod market_status;
pub mod paper;
pub mod validate;

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};
use trading_core::types::Bar;

/// Load bars and keep only the requested symbols.
pub fn load_symbols(path: &Path, symbols: &[String]) -> Result<BTreeMap<String, Vec<Bar>>> {
    if !path.exists() {
        anyhow::bail!(
            "Data path '{}' does not exist. Provide a CSV file or directory containing CSV files (e.g. --data ./data)",
            path.display()
        );
    }

    let mut data = trading_data::load_bars(path)?;
    if !symbols.is_empty() {
        for symbol in symbols {
            if !data.contains_key(symbol) {
                warn!(symbol = %symbol, "No data for requested symbol");
            }
        }
        data.retain(|symbol, _| symbols.contains(symbol));
    }

    if data.is_empty() {
        anyhow::bail!("No data loaded");
    }

    info!("Loaded data for {} symbols", data.len());
    Ok(data)
}
