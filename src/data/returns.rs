//! Log-return series construction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::PriceSeries;

/// Daily log returns `ln(P_t / P_{t-1})`, aligned with the price series
/// minus its first observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogReturnSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl LogReturnSeries {
    /// Build from a close series. The first price has no predecessor and
    /// produces no return.
    pub fn from_prices(series: &PriceSeries) -> Self {
        let (dates, values) = series
            .points
            .windows(2)
            .map(|w| (w[1].date, (w[1].close / w[0].close).ln()))
            .unzip();
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_drops_first_observation() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = PriceSeries::from_parts(
            "SPY",
            &[d0, d0.succ_opt().unwrap(), d0.succ_opt().unwrap().succ_opt().unwrap()],
            &[100.0, 110.0, 99.0],
        );
        let returns = LogReturnSeries::from_prices(&series);

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.dates[0], series.points[1].date);
        assert_relative_eq!(returns.values[0], (1.1f64).ln(), epsilon = 1e-12);
        assert_relative_eq!(returns.values[1], (0.9f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_single_price_yields_empty() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = PriceSeries::from_parts("SPY", &[d0], &[100.0]);
        assert!(LogReturnSeries::from_prices(&series).is_empty());
    }
}
