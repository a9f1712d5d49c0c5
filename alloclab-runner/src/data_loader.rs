//! Bar loading for the replay driver.
//!
//! Each ticker is read from `<data_dir>/<TICKER>.csv` with the header
//! `date,open,high,low,close,volume`. With `synthetic` set, a deterministic
//! random walk is generated instead. Synthetic data is a developer-only
//! debug mode and results produced on it are tagged.

use alloclab_core::domain::Bar;
use chrono::{Datelike, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {} (use --synthetic for synthetic data)", .path.display())]
    MissingFile { symbol: String, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: row {row}: {reason}", .path.display())]
    BadRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    NoBarsInRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Where a ticker's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub data_dir: PathBuf,
    /// Generate synthetic bars instead of reading CSV files.
    pub synthetic: bool,
    /// Bars to keep from before `start`, as history for the first decisions.
    pub warmup_bars: usize,
}

/// Loaded bars plus provenance.
#[derive(Debug)]
pub struct LoadedData {
    /// Bars per ticker, oldest first: up to `warmup_bars` before `start`,
    /// then everything in `[start, end]`.
    pub bars: BTreeMap<String, Vec<Bar>>,
    pub sources: BTreeMap<String, DataSource>,
    /// BLAKE3 over all bar data in ticker order.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Load bars for every ticker.
pub fn load_bars(tickers: &[String], opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let mut bars = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for symbol in tickers {
        let (all, source) = if opts.synthetic {
            warn!("generating synthetic data for {symbol}; results will be tagged as synthetic");
            (
                generate_synthetic_bars(symbol, synthetic_start(opts), opts.end),
                DataSource::Synthetic,
            )
        } else {
            let path = csv_path(&opts.data_dir, symbol);
            if !path.exists() {
                return Err(LoadError::MissingFile {
                    symbol: symbol.clone(),
                    path,
                });
            }
            (read_csv(&path, symbol)?, DataSource::Csv)
        };

        let series = with_warmup(all, opts);
        if !series.iter().any(|b| b.date >= opts.start) {
            return Err(LoadError::NoBarsInRange {
                symbol: symbol.clone(),
                start: opts.start,
                end: opts.end,
            });
        }
        bars.insert(symbol.clone(), series);
        sources.insert(symbol.clone(), source);
    }

    let dataset_hash = compute_dataset_hash(&bars);
    Ok(LoadedData {
        bars,
        has_synthetic: opts.synthetic,
        sources,
        dataset_hash,
    })
}

/// Keep bars up to `end`, dropping all but the last `warmup_bars` of those
/// before `start`. Input must be sorted by date.
fn with_warmup(bars: Vec<Bar>, opts: &LoadOptions) -> Vec<Bar> {
    let first_in_range = bars.partition_point(|b| b.date < opts.start);
    let keep_from = first_in_range.saturating_sub(opts.warmup_bars);
    bars.into_iter()
        .skip(keep_from)
        .take_while(|b| b.date <= opts.end)
        .collect()
}

/// Calendar start for synthetic data: far enough back to yield
/// `warmup_bars` weekdays before `start`.
fn synthetic_start(opts: &LoadOptions) -> NaiveDate {
    if opts.warmup_bars == 0 {
        return opts.start;
    }
    let calendar_days = (opts.warmup_bars * 7).div_ceil(5) + 7;
    opts.start - chrono::Duration::days(calendar_days as i64)
}

/// `<data_dir>/<TICKER>.csv`
pub fn csv_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{symbol}.csv"))
}

/// Read one ticker's CSV file. Rows are sorted by date; duplicate dates are
/// an error.
pub fn read_csv(path: &Path, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut bars = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row = row.map_err(|e| LoadError::BadRow {
            path: path.to_path_buf(),
            row: line,
            reason: e.to_string(),
        })?;
        let bar = Bar {
            symbol: symbol.to_string(),
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
        };
        if !bar.is_sane() {
            return Err(LoadError::BadRow {
                path: path.to_path_buf(),
                row: line,
                reason: format!("inconsistent OHLC on {}", bar.date),
            });
        }
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::BadRow {
            path: path.to_path_buf(),
            row: 0,
            reason: format!("duplicate date {}", pair[0].date),
        });
    }
    Ok(bars)
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// `BTreeMap` iteration is sorted, so the hash is independent of load order.
pub fn compute_dataset_hash(bars: &BTreeMap<String, Vec<Bar>>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, series) in bars {
        hasher.update(symbol.as_bytes());
        for bar in series {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate synthetic weekday bars: a random walk from 100.0.
///
/// Seeded from the ticker's BLAKE3 hash, so the same ticker and range
/// always produce the same bars.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            symbol: symbol.to_string(),
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
