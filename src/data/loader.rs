//! Price-history loader for CSV and parquet files.
//!
//! Files live at `{data_dir}/{TICKER}.csv` or `{data_dir}/{TICKER}.parquet`
//! and need a date column plus a close column:
//! - date: `date`, `Date` or `trade_date` (string `YYYY-MM-DD...` or Date)
//! - close: `adj_close` / `Adj Close` when present, else `close` / `Close`
//!
//! Synthetic bars are written back out as CSV with
//! `date,open,high,low,close,volume`.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use super::types::{PricePoint, PriceSeries, SyntheticBar};

/// Accepted names for the date column, in priority order.
pub const DATE_COLUMNS: &[&str] = &["date", "Date", "trade_date"];

/// Accepted names for the close column, in priority order. Adjusted
/// closes win over raw closes.
pub const CLOSE_COLUMNS: &[&str] = &["adj_close", "Adj Close", "close", "Close"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplier of historical closes for a ticker.
pub trait PriceSource {
    /// Load closes for `ticker` on or after `start`, in date order.
    fn load_closes(&self, ticker: &str, start: NaiveDate) -> Result<PriceSeries, LoaderError>;
}

/// File-backed price loader.
pub struct DataLoader {
    data_dir: String,
}

impl DataLoader {
    /// Create a new data loader pointing to a directory of price files.
    pub fn new(data_dir: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
        }
    }

    /// Resolve the file for a ticker, preferring parquet over CSV.
    fn price_path(&self, ticker: &str) -> Result<PathBuf, LoaderError> {
        let base = Path::new(&self.data_dir);
        for ext in ["parquet", "csv"] {
            let path = base.join(format!("{}.{}", ticker, ext));
            if path.exists() {
                return Ok(path);
            }
        }
        Err(LoaderError::FileNotFound(format!(
            "{}/{}.{{parquet,csv}}",
            self.data_dir, ticker
        )))
    }

    /// List tickers with a price file in the data directory.
    pub fn available_tickers(&self) -> Result<Vec<String>, LoaderError> {
        let path = Path::new(&self.data_dir);
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut tickers = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name
                .strip_suffix(".csv")
                .or_else(|| name.strip_suffix(".parquet"))
            {
                tickers.push(stem.to_string());
            }
        }
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    /// Load the raw price file as a DataFrame.
    pub fn load_dataframe(&self, ticker: &str) -> Result<DataFrame, LoaderError> {
        let path = self.price_path(ticker)?;
        read_frame(&path)
    }
}

impl PriceSource for DataLoader {
    fn load_closes(&self, ticker: &str, start: NaiveDate) -> Result<PriceSeries, LoaderError> {
        let df = self.load_dataframe(ticker)?;
        let series = dataframe_to_series(&df, ticker)?;
        Ok(series.since(start))
    }
}

/// Price source backed by series already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, PriceSeries>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under its own ticker.
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.ticker.clone(), series);
        self
    }
}

impl PriceSource for InMemorySource {
    fn load_closes(&self, ticker: &str, start: NaiveDate) -> Result<PriceSeries, LoaderError> {
        self.series
            .get(ticker)
            .map(|s| s.since(start))
            .ok_or_else(|| LoaderError::InvalidData(format!("No series registered for {}", ticker)))
    }
}

fn read_frame(path: &Path) -> Result<DataFrame, LoaderError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => {
            let lf = LazyFrame::scan_parquet(path, ScanArgsParquet::default())?;
            Ok(lf.collect()?)
        }
        Some("csv") => {
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?;
            Ok(df)
        }
        _ => Err(LoaderError::UnsupportedFormat(path.display().to_string())),
    }
}

fn find_column<'a>(df: &DataFrame, candidates: &[&'a str]) -> Option<&'a str> {
    let names = df.get_column_names();
    candidates
        .iter()
        .copied()
        .find(|c| names.iter().any(|n| n.as_str() == *c))
}

/// Parse a leading `YYYY-MM-DD`, ignoring any time or zone suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Convert a loaded frame into a sorted close series. Rows with a null or
/// unparseable date or close are dropped.
pub fn dataframe_to_series(df: &DataFrame, ticker: &str) -> Result<PriceSeries, LoaderError> {
    let date_name = find_column(df, DATE_COLUMNS).ok_or_else(|| {
        LoaderError::InvalidData(format!("missing date column (expected one of {:?})", DATE_COLUMNS))
    })?;
    let close_name = find_column(df, CLOSE_COLUMNS).ok_or_else(|| {
        LoaderError::InvalidData(format!("missing close column (expected one of {:?})", CLOSE_COLUMNS))
    })?;

    let dates_col = df.column(date_name)?;
    let dates_col = match dates_col.dtype() {
        DataType::String => dates_col.clone(),
        DataType::Date => dates_col.cast(&DataType::String)?,
        other => {
            return Err(LoaderError::InvalidData(format!(
                "{} column has unexpected type {}",
                date_name, other
            )))
        }
    };
    let closes_col = df.column(close_name)?.cast(&DataType::Float64)?;

    let mut points: Vec<PricePoint> = dates_col
        .str()?
        .into_iter()
        .zip(closes_col.f64()?.into_iter())
        .filter_map(|(date, close)| {
            let date = date.and_then(parse_date)?;
            let close = close?;
            Some(PricePoint { date, close })
        })
        .collect();

    points.sort_by_key(|p| p.date);

    Ok(PriceSeries::new(ticker, points))
}

/// Build a DataFrame from synthetic bars.
pub fn bars_to_dataframe(bars: &[SyntheticBar]) -> Result<DataFrame, LoaderError> {
    let df = df!(
        "date" => bars.iter().map(|b| b.date.to_string()).collect::<Vec<_>>(),
        "open" => bars.iter().map(|b| b.open).collect::<Vec<_>>(),
        "high" => bars.iter().map(|b| b.high).collect::<Vec<_>>(),
        "low" => bars.iter().map(|b| b.low).collect::<Vec<_>>(),
        "close" => bars.iter().map(|b| b.close).collect::<Vec<_>>(),
        "volume" => bars.iter().map(|b| b.volume).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Write synthetic bars to a CSV file.
pub fn write_bars_csv(path: &Path, bars: &[SyntheticBar]) -> Result<(), LoaderError> {
    let mut df = bars_to_dataframe(bars)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}
