//! Core data types for price history and synthetic output.
//!
//! Historical input is a close-only series; synthetic output is a full
//! OHLCV bar per simulated business day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single historical close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered close-price history for one instrument.
///
/// Dates are expected to be strictly increasing. The loader sorts its
/// output; callers building a series by hand should run it through
/// [`crate::validation::SeriesValidator`] before simulating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Instrument identifier (e.g., "SPY")
    pub ticker: String,

    /// Observations in date order
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a new series.
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    /// Build a series from parallel date/close slices.
    pub fn from_parts(ticker: impl Into<String>, dates: &[NaiveDate], closes: &[f64]) -> Self {
        let points = dates
            .iter()
            .zip(closes)
            .map(|(&date, &close)| PricePoint { date, close })
            .collect();
        Self::new(ticker, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Drop observations before `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        Self {
            ticker: self.ticker.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start)
                .copied()
                .collect(),
        }
    }
}

/// One synthetic daily bar.
///
/// `high >= max(open, close)` and `low <= min(open, close)` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}
