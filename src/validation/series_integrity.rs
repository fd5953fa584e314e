//! Integrity checks for historical close series.
//!
//! Validates:
//! - Minimum length
//! - Dates strictly increasing (no duplicates, no out-of-order rows)
//! - Closes finite and strictly positive (log returns must be defined)

use chrono::NaiveDate;

use crate::data::PriceSeries;

/// Result of a single validation check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Integrity report for one series.
#[derive(Debug)]
pub struct SeriesIntegrityReport {
    pub ticker: String,
    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub checks: Vec<CheckResult>,
}

impl SeriesIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        let total = self.checks.len();
        let span = match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => "no data".to_string(),
        };
        format!(
            "{} ({} closes, {}): {}/{} checks passed",
            self.ticker, self.observations, span, passed, total
        )
    }
}

/// Validator for historical close series.
pub struct SeriesValidator {
    min_observations: usize,
}

impl Default for SeriesValidator {
    fn default() -> Self {
        Self { min_observations: 2 }
    }
}

impl SeriesValidator {
    /// Require at least `min_observations` closes.
    pub fn new(min_observations: usize) -> Self {
        Self { min_observations }
    }

    /// Run all checks.
    pub fn validate(&self, series: &PriceSeries) -> SeriesIntegrityReport {
        let checks = vec![
            self.check_length(series),
            self.check_date_order(series),
            self.check_prices(series),
        ];

        SeriesIntegrityReport {
            ticker: series.ticker.clone(),
            observations: series.len(),
            first_date: series.points.first().map(|p| p.date),
            last_date: series.last().map(|p| p.date),
            checks,
        }
    }

    fn check_length(&self, series: &PriceSeries) -> CheckResult {
        if series.len() >= self.min_observations {
            CheckResult::pass(
                "length",
                &format!("{} closes (minimum {})", series.len(), self.min_observations),
            )
        } else {
            CheckResult::fail(
                "length",
                &format!(
                    "Only {} closes, need at least {}",
                    series.len(),
                    self.min_observations
                ),
                None,
            )
        }
    }

    fn check_date_order(&self, series: &PriceSeries) -> CheckResult {
        let mut duplicates = Vec::new();
        let mut out_of_order = Vec::new();

        for pair in series.points.windows(2) {
            if pair[1].date == pair[0].date {
                duplicates.push(pair[1].date);
            } else if pair[1].date < pair[0].date {
                out_of_order.push(pair[1].date);
            }
        }

        if duplicates.is_empty() && out_of_order.is_empty() {
            return CheckResult::pass("date_order", "Dates strictly increasing");
        }

        let mut details = Vec::new();
        if !duplicates.is_empty() {
            details.push(format!(
                "Duplicates: {:?}",
                duplicates.iter().take(5).collect::<Vec<_>>()
            ));
        }
        if !out_of_order.is_empty() {
            details.push(format!(
                "Out of order: {:?}",
                out_of_order.iter().take(5).collect::<Vec<_>>()
            ));
        }

        CheckResult::fail(
            "date_order",
            &format!(
                "{} duplicate and {} out-of-order dates",
                duplicates.len(),
                out_of_order.len()
            ),
            Some(details.join("; ")),
        )
    }

    fn check_prices(&self, series: &PriceSeries) -> CheckResult {
        let bad: Vec<_> = series
            .points
            .iter()
            .filter(|p| !p.close.is_finite() || p.close <= 0.0)
            .collect();

        if bad.is_empty() {
            CheckResult::pass("prices", "All closes finite and positive")
        } else {
            CheckResult::fail(
                "prices",
                &format!("{} non-positive or non-finite closes", bad.len()),
                Some(format!(
                    "First: {:?}",
                    bad.iter().take(5).map(|p| (p.date, p.close)).collect::<Vec<_>>()
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_clean_series_passes() {
        let series = PriceSeries::from_parts("SPY", &[d(2), d(3), d(4)], &[1.0, 2.0, 3.0]);
        let report = SeriesValidator::default().validate(&series);
        assert!(report.all_passed());
        assert_eq!(report.checks.len(), 3);
        assert!(report.summary().contains("3/3"));
    }

    #[test]
    fn test_duplicate_dates_fail() {
        let series = PriceSeries::from_parts("SPY", &[d(2), d(3), d(3)], &[1.0, 2.0, 3.0]);
        let report = SeriesValidator::default().validate(&series);
        let failed = report.failed_checks();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "date_order");
    }

    #[test]
    fn test_out_of_order_fails() {
        let series = PriceSeries::from_parts("SPY", &[d(3), d(2)], &[1.0, 2.0]);
        assert!(!SeriesValidator::default().validate(&series).all_passed());
    }

    #[test]
    fn test_bad_prices_fail() {
        let series = PriceSeries::from_parts("SPY", &[d(2), d(3), d(4)], &[1.0, 0.0, f64::NAN]);
        let report = SeriesValidator::default().validate(&series);
        let failed = report.failed_checks();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "prices");
        assert!(failed[0].message.starts_with('2'));
    }

    #[test]
    fn test_too_short() {
        let series = PriceSeries::from_parts("SPY", &[d(2)], &[1.0]);
        let report = SeriesValidator::new(10).validate(&series);
        assert_eq!(report.failed_checks()[0].name, "length");
    }
}
