//! Path statistics calculator.
//!
//! Summarizes a price path so synthetic runs can be compared with the
//! history they were bootstrapped from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{LogReturnSeries, PriceSeries, SyntheticBar};
use crate::simulation::TRADING_DAYS_PER_YEAR;

/// Summary statistics for one price path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathStatistics {
    pub days: usize,

    // Return metrics
    pub total_return_pct: f64,
    pub cagr: f64,
    pub mean_daily_log_return: f64,

    // Risk metrics
    pub annualized_volatility_pct: f64,
    pub max_drawdown_pct: f64,
    pub drawdown_duration_days: usize,

    // Serial structure
    /// Lag-1 autocorrelation of returns.
    pub return_autocorr: f64,
    /// Lag-1 autocorrelation of absolute returns (volatility clustering).
    pub abs_return_autocorr: f64,
}

impl PathStatistics {
    /// Generate a summary report.
    pub fn summary(&self) -> String {
        format!(
            "Path Summary\n\
             ============\n\
             \n\
             Days: {}\n\
             Total Return: {:.2}%\n\
             CAGR: {:.2}%\n\
             Annualized Vol: {:.2}%\n\
             Max Drawdown: {:.2}% ({} days)\n\
             Return AC(1): {:.3}\n\
             |Return| AC(1): {:.3}",
            self.days,
            self.total_return_pct,
            self.cagr,
            self.annualized_volatility_pct,
            self.max_drawdown_pct,
            self.drawdown_duration_days,
            self.return_autocorr,
            self.abs_return_autocorr
        )
    }
}

/// Drawdown analysis details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    pub max_drawdown_pct: f64,
    /// Index of the peak preceding the deepest trough.
    pub peak_index: Option<usize>,
    /// Index of the deepest trough.
    pub trough_index: Option<usize>,
    /// Steps from peak to deepest trough.
    pub duration_days: usize,
    pub drawdown_periods: usize,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Statistics for a path starting at `anchor` and following `returns`.
    pub fn from_returns(anchor: f64, returns: &[f64]) -> PathStatistics {
        let mut prices = Vec::with_capacity(returns.len() + 1);
        prices.push(anchor);
        let mut cum = 0.0;
        for r in returns {
            cum += r;
            prices.push(anchor * f64::exp(cum));
        }
        Self::build(&prices, returns)
    }

    /// Statistics for a historical close series.
    pub fn from_series(series: &PriceSeries) -> PathStatistics {
        let returns = LogReturnSeries::from_prices(series);
        Self::build(&series.closes(), &returns.values)
    }

    /// Statistics for synthetic bars, starting from the first open.
    pub fn from_bars(bars: &[SyntheticBar]) -> PathStatistics {
        let Some(first) = bars.first() else {
            return PathStatistics::default();
        };
        let mut prices = Vec::with_capacity(bars.len() + 1);
        prices.push(first.open);
        prices.extend(bars.iter().map(|b| b.close));
        let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        Self::build(&prices, &returns)
    }

    fn build(prices: &[f64], returns: &[f64]) -> PathStatistics {
        let days = returns.len();
        if days == 0 || prices.len() < 2 {
            return PathStatistics::default();
        }

        let first = prices[0];
        let last = prices[prices.len() - 1];
        let total_return_pct = (last / first - 1.0) * 100.0;

        let mean = returns.iter().sum::<f64>() / days as f64;
        let annualized_volatility_pct =
            sample_std(returns) * (TRADING_DAYS_PER_YEAR as f64).sqrt() * 100.0;

        let abs: Vec<f64> = returns.iter().map(|r| r.abs()).collect();
        let drawdown = Self::analyze_drawdown(prices);

        PathStatistics {
            days,
            total_return_pct,
            cagr: Self::calculate_cagr(first, last, days),
            mean_daily_log_return: mean,
            annualized_volatility_pct,
            max_drawdown_pct: drawdown.max_drawdown_pct,
            drawdown_duration_days: drawdown.duration_days,
            return_autocorr: lag1_autocorr(returns),
            abs_return_autocorr: lag1_autocorr(&abs),
        }
    }

    /// Calculate CAGR (Compound Annual Growth Rate).
    pub fn calculate_cagr(initial: f64, final_val: f64, trading_days: usize) -> f64 {
        if initial <= 0.0 || trading_days == 0 {
            return 0.0;
        }
        let years = trading_days as f64 / TRADING_DAYS_PER_YEAR as f64;
        ((final_val / initial).powf(1.0 / years) - 1.0) * 100.0
    }

    /// Analyze drawdown over a price path.
    pub fn analyze_drawdown(prices: &[f64]) -> DrawdownAnalysis {
        if prices.is_empty() {
            return DrawdownAnalysis::default();
        }

        let mut peak = prices[0];
        let mut peak_idx = 0;
        let mut in_drawdown = false;
        let mut analysis = DrawdownAnalysis::default();

        for (i, &price) in prices.iter().enumerate() {
            if price >= peak {
                if in_drawdown {
                    analysis.drawdown_periods += 1;
                }
                peak = price;
                peak_idx = i;
                in_drawdown = false;
                continue;
            }

            in_drawdown = true;
            let drawdown_pct = if peak > 0.0 {
                (peak - price) / peak * 100.0
            } else {
                0.0
            };
            if drawdown_pct > analysis.max_drawdown_pct {
                analysis.max_drawdown_pct = drawdown_pct;
                analysis.peak_index = Some(peak_idx);
                analysis.trough_index = Some(i);
                analysis.duration_days = i - peak_idx;
            }
        }

        if in_drawdown {
            analysis.drawdown_periods += 1;
        }

        analysis
    }

    /// Date of the deepest trough in a bar series.
    pub fn max_drawdown_date(bars: &[SyntheticBar]) -> Option<NaiveDate> {
        let first = bars.first()?;
        let mut prices = vec![first.open];
        prices.extend(bars.iter().map(|b| b.close));
        let trough = Self::analyze_drawdown(&prices).trough_index?;
        // Price index 0 is the anchor, index i is bar i - 1's close.
        bars.get(trough.checked_sub(1)?).map(|b| b.date)
    }
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn lag1_autocorr(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let denom: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if denom == 0.0 {
        return 0.0;
    }
    let num: f64 = values
        .windows(2)
        .map(|w| (w[0] - mean) * (w[1] - mean))
        .sum();
    num / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cagr() {
        // 100 -> 121 over 2 years (504 days) = 10% CAGR
        let cagr = MetricsCalculator::calculate_cagr(100.0, 121.0, 504);
        assert_relative_eq!(cagr, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_drawdown_analysis() {
        let analysis = MetricsCalculator::analyze_drawdown(&[100.0, 120.0, 90.0, 110.0, 130.0, 117.0]);
        assert_relative_eq!(analysis.max_drawdown_pct, 25.0, epsilon = 1e-9);
        assert_eq!(analysis.peak_index, Some(1));
        assert_eq!(analysis.trough_index, Some(2));
        assert_eq!(analysis.duration_days, 1);
        assert_eq!(analysis.drawdown_periods, 2);
    }

    #[test]
    fn test_drawdown_analysis_empty() {
        let analysis = MetricsCalculator::analyze_drawdown(&[]);
        assert_eq!(analysis.max_drawdown_pct, 0.0);
        assert_eq!(analysis.trough_index, None);
    }

    #[test]
    fn test_from_returns_total_return() {
        let stats = MetricsCalculator::from_returns(100.0, &[0.1, -0.05, 0.02]);
        assert_eq!(stats.days, 3);
        assert_relative_eq!(
            stats.total_return_pct,
            ((0.07f64).exp() - 1.0) * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_from_bars_matches_from_returns() {
        let returns = [0.01, -0.02, 0.015, 0.003];
        let bars = crate::simulation::PriceReconstructor::default().bars(
            50.0,
            &returns,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        );
        let a = MetricsCalculator::from_bars(&bars);
        let b = MetricsCalculator::from_returns(50.0, &returns);
        assert_relative_eq!(a.total_return_pct, b.total_return_pct, epsilon = 1e-9);
        assert_relative_eq!(a.annualized_volatility_pct, b.annualized_volatility_pct, epsilon = 1e-9);
    }

    #[test]
    fn test_volatility_clustering_detected() {
        // Long calm then long turbulent stretch: |r| strongly autocorrelated.
        let returns: Vec<f64> = (0..200)
            .map(|i| {
                let size = if i < 100 { 0.001 } else { 0.03 };
                if i % 2 == 0 { size } else { -size }
            })
            .collect();
        let stats = MetricsCalculator::from_returns(100.0, &returns);
        assert!(stats.abs_return_autocorr > 0.9);
        assert!(stats.return_autocorr < 0.0);
    }

    #[test]
    fn test_max_drawdown_date() {
        let returns = [0.1, -0.3, 0.05];
        let bars = crate::simulation::PriceReconstructor::default().bars(
            100.0,
            &returns,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        );
        assert_eq!(MetricsCalculator::max_drawdown_date(&bars), Some(bars[1].date));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(MetricsCalculator::from_bars(&[]), PathStatistics::default());
        assert_eq!(MetricsCalculator::from_returns(1.0, &[]).days, 0);
    }
}
