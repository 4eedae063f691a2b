//! CSV bar loader.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use trading_core::error::DataError;
use trading_core::types::Bar;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Symbol", alias = "symbol", alias = "ticker", default)]
    symbol: Option<String>,
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "datetime",
        alias = "Datetime",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Loads intraday bars from CSV files, one file per symbol or one file with a symbol column.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvDataSource;

impl CsvDataSource {
    pub fn new() -> Self {
        Self
    }

    /// Load one file. Rows without a symbol column use the file stem.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| DataError::ParseError(format!("{}: {}", path.display(), e)))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_uppercase();

        self.load_reader(file, &stem)
    }

    /// Load every `*.csv` file in `dir`.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| DataError::ParseError(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let mut all: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        for path in paths {
            for (symbol, bars) in self.load_file(&path)? {
                all.entry(symbol).or_default().extend(bars);
            }
        }

        // Files may overlap for a symbol
        Ok(all
            .into_iter()
            .map(|(symbol, bars)| {
                let bars = clean_bars(bars);
                (symbol, bars)
            })
            .collect())
    }

    /// Load bars from any reader.
    pub fn load_reader<R: Read>(
        &self,
        reader: R,
        default_symbol: &str,
    ) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut grouped: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        let mut rows = 0usize;

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let timestamp = parse_timestamp(&record.date)?;
            let symbol = record
                .symbol
                .filter(|s| !s.is_empty())
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|| default_symbol.to_string());

            rows += 1;
            grouped.entry(symbol.clone()).or_default().push(Bar::new(
                symbol,
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        let cleaned: BTreeMap<String, Vec<Bar>> = grouped
            .into_iter()
            .map(|(symbol, bars)| (symbol, clean_bars(bars)))
            .collect();

        let kept: usize = cleaned.values().map(Vec::len).sum();
        info!(rows, kept, symbols = cleaned.len(), "Loaded CSV bars");
        Ok(cleaned)
    }
}

/// Drop invalid bars, sort by time and keep the first bar of each timestamp.
pub fn clean_bars(bars: Vec<Bar>) -> Vec<Bar> {
    let before = bars.len();
    let mut bars: Vec<Bar> = bars
        .into_iter()
        .filter(|bar| {
            let ok = bar.is_consistent() && bar.volume >= 0.0;
            if !ok {
                debug!(symbol = %bar.symbol, timestamp = %bar.timestamp, "Dropping invalid bar");
            }
            ok
        })
        .collect();

    // Stable, so the first of equal timestamps survives dedup
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);

    if bars.len() < before {
        warn!(
            dropped = before - bars.len(),
            kept = bars.len(),
            "Removed invalid or duplicate bars"
        );
    }
    bars
}

/// Parse the timestamp formats seen in exchange exports.
///
/// Date-only values map to midnight. Unix epochs are interpreted as UTC.
pub fn parse_timestamp(date_str: &str) -> Result<NaiveDateTime, DataError> {
    let date_str = date_str.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%d-%m-%Y %H:%M:%S",
        "%d-%m-%Y %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt);
        }
    }

    // Offsets are dropped: the exchange-local wall time is kept
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.naive_local());
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d.and_time(chrono::NaiveTime::MIN));
        }
    }

    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        let millis = if ts > 10_000_000_000 { ts } else { ts * 1000 };
        if let Some(dt) = DateTime::from_timestamp_millis(millis) {
            return Ok(dt.naive_utc());
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
