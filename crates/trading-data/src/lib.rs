//! Market data loading and replay.

mod csv_source;
mod replay;

pub use csv_source::{clean_bars, parse_timestamp, CsvDataSource};
pub use replay::ReplayFeed;

use std::collections::BTreeMap;
use std::path::Path;
use trading_core::error::DataError;
use trading_core::types::Bar;

/// Load bars from a CSV file or a directory of CSV files, keyed by symbol.
pub fn load_bars(path: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
    let path = path.as_ref();
    let source = CsvDataSource::new();
    if path.is_dir() {
        source.load_dir(path)
    } else {
        source.load_file(path)
    }
}
