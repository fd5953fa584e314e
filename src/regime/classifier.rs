//! Volatility regime classifier.
//!
//! Computes trailing realized volatility over a fixed window and buckets
//! the surviving days into `n_regimes` ordinal regimes by empirical
//! quantile. Regime 0 is the calmest bucket, `n_regimes - 1` the most
//! volatile.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::LogReturnSeries;
use crate::error::{SimulationError, SimulationResult};

/// Regime index in `[0, n_regimes)`.
pub type RegimeLabel = usize;

/// A historical return tagged with its rolling volatility and regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeAnnotatedReturn {
    pub date: NaiveDate,
    pub ret: f64,
    pub volatility: f64,
    pub regime: RegimeLabel,
}

/// Regime classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeClassifierConfig {
    /// Rolling window for realized volatility (days).
    pub vol_window: usize,
    /// Number of volatility buckets.
    pub n_regimes: usize,
}

impl Default for RegimeClassifierConfig {
    fn default() -> Self {
        Self {
            vol_window: 20,
            n_regimes: 3,
        }
    }
}

/// Statistics for a regime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegimeStats {
    pub regime: RegimeLabel,
    pub days: usize,
    pub pct_of_total: f64,
    pub avg_volatility: f64,
    pub avg_return: f64,
    pub min_volatility: f64,
    pub max_volatility: f64,
}

/// Output of a classification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeClassification {
    /// Annotated days in chronological order.
    pub observations: Vec<RegimeAnnotatedReturn>,
    /// Volatility at each of the `n_regimes - 1` bucket boundaries.
    pub thresholds: Vec<f64>,
    pub n_regimes: usize,
}

impl RegimeClassification {
    /// Regime labels in chronological order.
    pub fn labels(&self) -> Vec<RegimeLabel> {
        self.observations.iter().map(|o| o.regime).collect()
    }

    /// Regime of the most recent observation.
    pub fn current_regime(&self) -> Option<RegimeLabel> {
        self.observations.last().map(|o| o.regime)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Per-regime statistics, indexed by regime. Regimes never observed
    /// report zero days.
    pub fn stats(&self) -> Vec<RegimeStats> {
        let total = self.observations.len();
        let mut stats: Vec<RegimeStats> = (0..self.n_regimes)
            .map(|regime| RegimeStats {
                regime,
                min_volatility: f64::INFINITY,
                max_volatility: f64::NEG_INFINITY,
                ..Default::default()
            })
            .collect();

        for obs in &self.observations {
            let entry = &mut stats[obs.regime];
            entry.days += 1;
            entry.avg_volatility += obs.volatility;
            entry.avg_return += obs.ret;
            entry.min_volatility = entry.min_volatility.min(obs.volatility);
            entry.max_volatility = entry.max_volatility.max(obs.volatility);
        }

        for entry in &mut stats {
            if entry.days == 0 {
                entry.min_volatility = 0.0;
                entry.max_volatility = 0.0;
                continue;
            }
            entry.avg_volatility /= entry.days as f64;
            entry.avg_return /= entry.days as f64;
            entry.pct_of_total = entry.days as f64 / total as f64 * 100.0;
        }

        stats
    }
}

/// Quantile-based volatility regime classifier.
pub struct RegimeClassifier {
    config: RegimeClassifierConfig,
}

impl RegimeClassifier {
    /// Create a new classifier.
    pub fn new(config: RegimeClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegimeClassifierConfig {
        &self.config
    }

    /// Classify every day with a defined rolling volatility.
    ///
    /// Needs at least `vol_window + 1` returns.
    pub fn classify(&self, returns: &LogReturnSeries) -> SimulationResult<RegimeClassification> {
        let window = self.config.vol_window;
        let n_regimes = self.config.n_regimes;

        if window < 2 {
            return Err(SimulationError::invalid("vol_window", "must be >= 2"));
        }
        if n_regimes < 1 {
            return Err(SimulationError::invalid("n_regimes", "must be >= 1"));
        }
        if returns.len() < window + 1 {
            return Err(SimulationError::InsufficientHistory {
                required: window + 1,
                available: returns.len(),
            });
        }

        let vols = rolling_std(&returns.values, window);
        let (labels, thresholds) = quantile_buckets(&vols, n_regimes);

        let offset = window - 1;
        let observations: Vec<RegimeAnnotatedReturn> = vols
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (&volatility, regime))| RegimeAnnotatedReturn {
                date: returns.dates[i + offset],
                ret: returns.values[i + offset],
                volatility,
                regime,
            })
            .collect();

        debug!(
            "Classified {} days into {} regimes, thresholds {:?}",
            observations.len(),
            n_regimes,
            thresholds
        );

        Ok(RegimeClassification {
            observations,
            thresholds,
            n_regimes,
        })
    }
}

/// Trailing sample standard deviation (n - 1 denominator). Output index `i`
/// covers `values[i..i + window]`, so the result has
/// `values.len() - window + 1` entries.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    if window < 2 || values.len() < window {
        return Vec::new();
    }

    values
        .windows(window)
        .map(|w| {
            let mean = w.iter().sum::<f64>() / window as f64;
            let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
            var.sqrt()
        })
        .collect()
}

/// Assign each value to one of `n_buckets` equal-count buckets by rank.
///
/// Values are ranked by a stable sort, so equal values keep their original
/// relative order and ties straddling a boundary split deterministically.
/// Bucket boundaries sit at ranks `floor(i * len / n_buckets)` for
/// `i in 1..n_buckets`; the returned thresholds are the values at those
/// ranks.
pub fn quantile_buckets(values: &[f64], n_buckets: usize) -> (Vec<RegimeLabel>, Vec<f64>) {
    let len = values.len();
    if len == 0 || n_buckets == 0 {
        return (Vec::new(), Vec::new());
    }

    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let rank_bounds: Vec<usize> = (1..n_buckets).map(|i| i * len / n_buckets).collect();

    let mut labels = vec![0; len];
    for (rank, &idx) in order.iter().enumerate() {
        labels[idx] = rank_bounds.partition_point(|&b| b <= rank);
    }

    let thresholds = rank_bounds.iter().map(|&b| values[order[b]]).collect();

    (labels, thresholds)
}
