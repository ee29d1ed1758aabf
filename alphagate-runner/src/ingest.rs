//! CSV bar ingestion.
//!
//! Loads one CSV file per symbol from a data directory. Bars must be in
//! strictly increasing date order with sane OHLC values; a bad row fails
//! the whole file rather than silently producing a gappy series. Missing
//! ticker files are tolerated (the scan's data-coverage check accounts
//! for them), a missing index file is fatal.

use alphagate_core::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::config::ScanConfig;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv parse error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{symbol}: bars out of order at {date} (dates must be strictly increasing)")]
    OutOfOrder { symbol: String, date: NaiveDate },

    #[error("{symbol}: invalid bar at {date} (non-finite or non-positive prices)")]
    InvalidBar { symbol: String, date: NaiveDate },

    #[error("index data file for {0} not found")]
    MissingIndex(String),
}

/// One CSV row; `date` uses ISO 8601 (e.g. 2024-01-02).
#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Loaded universe: per-symbol bar series plus the index series.
#[derive(Debug, Clone)]
pub struct UniverseData {
    pub bars: HashMap<String, Vec<Bar>>,
    pub index: Vec<Bar>,
}

/// Load `<symbol>.csv` files for the config's universe and index.
pub fn load_universe(data_dir: &Path, config: &ScanConfig) -> Result<UniverseData, IngestError> {
    let index_path = data_dir.join(format!("{}.csv", config.index_symbol));
    if !index_path.exists() {
        return Err(IngestError::MissingIndex(config.index_symbol.clone()));
    }
    let index = load_symbol(&index_path, &config.index_symbol)?;

    let mut bars = HashMap::new();
    for symbol in &config.universe {
        let path = data_dir.join(format!("{symbol}.csv"));
        if !path.exists() {
            warn!(symbol = %symbol, "no data file, ticker will count against coverage");
            continue;
        }
        bars.insert(symbol.clone(), load_symbol(&path, symbol)?);
    }

    Ok(UniverseData { bars, index })
}

/// Parse and validate one symbol's CSV file.
pub fn load_symbol(path: &Path, symbol: &str) -> Result<Vec<Bar>, IngestError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut bars: Vec<Bar> = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        let row = row.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let bar = Bar {
            symbol: symbol.to_string(),
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        };
        if !bar.is_sane() {
            return Err(IngestError::InvalidBar {
                symbol: symbol.to_string(),
                date: bar.date,
            });
        }
        if let Some(prev) = bars.last() {
            if bar.date <= prev.date {
                return Err(IngestError::OutOfOrder {
                    symbol: symbol.to_string(),
                    date: bar.date,
                });
            }
        }
        bars.push(bar);
    }
    Ok(bars)
}

/// Restrict a ticker series and the index to their common dates.
///
/// Both inputs are date-sorted, so a single merge pass suffices. The two
/// returned series are positionally aligned, which is what the history
/// builder requires.
pub fn align_with_index(bars: &[Bar], index: &[Bar]) -> (Vec<Bar>, Vec<Bar>) {
    let mut out_bars = Vec::with_capacity(bars.len().min(index.len()));
    let mut out_index = Vec::with_capacity(out_bars.capacity());
    let (mut i, mut j) = (0, 0);
    while i < bars.len() && j < index.len() {
        match bars[i].date.cmp(&index[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out_bars.push(bars[i].clone());
                out_index.push(index[j].clone());
                i += 1;
                j += 1;
            }
        }
    }
    (out_bars, out_index)
}
