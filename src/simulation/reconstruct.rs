//! Price path and OHLCV bar reconstruction.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::data::SyntheticBar;
use crate::error::{SimulationError, SimulationResult};

/// Default wick size as a multiple of the bar body.
pub const DEFAULT_WICK_FACTOR: f64 = 0.3;

/// Integrates log returns into closes and dresses them as daily bars.
pub struct PriceReconstructor {
    wick_factor: f64,
}

impl Default for PriceReconstructor {
    fn default() -> Self {
        Self {
            wick_factor: DEFAULT_WICK_FACTOR,
        }
    }
}

impl PriceReconstructor {
    /// Fails unless `wick_factor` is finite and non-negative, which keeps
    /// `low <= min(open, close) <= max(open, close) <= high`.
    pub fn new(wick_factor: f64) -> SimulationResult<Self> {
        if !wick_factor.is_finite() || wick_factor < 0.0 {
            return Err(SimulationError::invalid(
                "wick_factor",
                format!("must be finite and >= 0, got {}", wick_factor),
            ));
        }
        Ok(Self { wick_factor })
    }

    /// `close[t] = anchor * exp(sum(returns[0..=t]))`.
    pub fn closes(&self, anchor: f64, returns: &[f64]) -> Vec<f64> {
        returns
            .iter()
            .scan(0.0, |cum, r| {
                *cum += r;
                Some(anchor * cum.exp())
            })
            .collect()
    }

    /// Build one bar per return on consecutive business days from
    /// `start_date`. The first bar opens at `anchor`; every later bar opens
    /// at the previous close.
    pub fn bars(&self, anchor: f64, returns: &[f64], start_date: NaiveDate) -> Vec<SyntheticBar> {
        let closes = self.closes(anchor, returns);
        let dates = business_days(start_date, closes.len());

        let mut open = anchor;
        closes
            .into_iter()
            .zip(dates)
            .map(|(close, date)| {
                let cushion = self.wick_factor * (close - open).abs();
                let bar = SyntheticBar {
                    date,
                    open,
                    high: open.max(close) + cushion,
                    low: open.min(close) - cushion,
                    close,
                    volume: 0,
                };
                open = close;
                bar
            })
            .collect()
    }
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `count` consecutive Monday-Friday dates, starting at `start` or the
/// first business day after it.
pub fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut date = start;
    while dates.len() < count {
        if is_business_day(date) {
            dates.push(date);
        }
        date += Duration::days(1);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_business_days_skip_weekends() {
        // 2025-01-03 is a Friday.
        let days = business_days(d(2025, 1, 3), 3);
        assert_eq!(days, vec![d(2025, 1, 3), d(2025, 1, 6), d(2025, 1, 7)]);
    }

    #[test]
    fn test_business_days_roll_forward_from_weekend() {
        let days = business_days(d(2025, 1, 4), 2);
        assert_eq!(days, vec![d(2025, 1, 6), d(2025, 1, 7)]);
    }

    #[test]
    fn test_closes_are_cumulative() {
        let recon = PriceReconstructor::default();
        let closes = recon.closes(100.0, &[0.1, -0.2, 0.05]);
        assert_relative_eq!(closes[0], 100.0 * (0.1f64).exp(), epsilon = 1e-9);
        assert_relative_eq!(closes[2], 100.0 * (-0.05f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_bars_anchor_and_continuity() {
        let recon = PriceReconstructor::default();
        let bars = recon.bars(50.0, &[0.02, -0.01, 0.0, 0.03], d(2025, 1, 2));

        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].open, 50.0);
        for pair in bars.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
        }
        assert!(bars.iter().all(|b| b.volume == 0));
    }

    #[test]
    fn test_wicks() {
        let recon = PriceReconstructor::new(0.3).unwrap();
        let bars = recon.bars(100.0, &[(110.0f64 / 100.0).ln()], d(2025, 1, 2));
        let bar = bars[0];
        assert_relative_eq!(bar.close, 110.0, epsilon = 1e-9);
        assert_relative_eq!(bar.high, 113.0, epsilon = 1e-9);
        assert_relative_eq!(bar.low, 97.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_bar_has_no_wick() {
        let bars = PriceReconstructor::default().bars(100.0, &[0.0], d(2025, 1, 2));
        assert_eq!(bars[0].high, 100.0);
        assert_eq!(bars[0].low, 100.0);
    }

    #[test]
    fn test_shape_invariant() {
        let returns: Vec<f64> = (0..100).map(|i| ((i * 37) % 19) as f64 * 0.004 - 0.036).collect();
        let bars = PriceReconstructor::default().bars(250.0, &returns, d(2025, 6, 2));
        for bar in &bars {
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.high >= bar.open.max(bar.close));
        }
    }

    #[test]
    fn test_rejects_bad_wick_factor() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                PriceReconstructor::new(bad),
                Err(SimulationError::InvalidParameter { name: "wick_factor", .. })
            ));
        }
        let bars = PriceReconstructor::new(0.0)
            .unwrap()
            .bars(100.0, &[0.05, -0.05], d(2025, 1, 2));
        assert_eq!(bars[0].high, bars[0].close);
        assert_eq!(bars[1].low, bars[1].close);
    }
}
