//! Regime transition matrix estimation.

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};

use super::classifier::RegimeLabel;

/// Tolerance for the row-sum invariant.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Row-stochastic first-order Markov transition matrix.
///
/// Entry `(i, j)` is the probability of moving from regime `i` to regime
/// `j` on the next step. A regime with no observed outgoing transition
/// gets a self-loop row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    rows: Vec<Vec<f64>>,
    counts: Vec<Vec<u64>>,
}

impl TransitionMatrix {
    /// Estimate from a chronological label sequence.
    pub fn estimate(labels: &[RegimeLabel], n_regimes: usize) -> SimulationResult<Self> {
        if n_regimes == 0 {
            return Err(SimulationError::invalid("n_regimes", "must be >= 1"));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_regimes) {
            return Err(SimulationError::InvalidTransitionMatrix(format!(
                "label {} out of range for {} regimes",
                bad, n_regimes
            )));
        }

        let mut counts = vec![vec![0u64; n_regimes]; n_regimes];
        for pair in labels.windows(2) {
            counts[pair[0]][pair[1]] += 1;
        }

        let rows = counts
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let total: u64 = row.iter().sum();
                if total == 0 {
                    let mut one_hot = vec![0.0; n_regimes];
                    one_hot[i] = 1.0;
                    one_hot
                } else {
                    row.iter().map(|&c| c as f64 / total as f64).collect()
                }
            })
            .collect();

        Ok(Self { rows, counts })
    }

    /// Build from explicit probabilities. Rows must be square, non-negative
    /// and sum to one.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> SimulationResult<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(SimulationError::InvalidTransitionMatrix(
                "matrix has no rows".to_string(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SimulationError::InvalidTransitionMatrix(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(SimulationError::InvalidTransitionMatrix(format!(
                    "row {} has a negative or non-finite entry",
                    i
                )));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SimulationError::InvalidTransitionMatrix(format!(
                    "row {} sums to {}",
                    i, sum
                )));
            }
        }

        Ok(Self {
            counts: vec![vec![0; n]; n],
            rows,
        })
    }

    pub fn n_regimes(&self) -> usize {
        self.rows.len()
    }

    /// Outgoing probabilities for a regime.
    pub fn row(&self, regime: RegimeLabel) -> &[f64] {
        &self.rows[regime]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Probability of moving from `from` to `to`.
    pub fn probability(&self, from: RegimeLabel, to: RegimeLabel) -> f64 {
        self.rows[from][to]
    }

    /// Raw transition counts (all zero when built with [`Self::from_rows`]).
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Regimes whose row fell back to a self-loop for lack of data.
    pub fn degenerate_rows(&self) -> Vec<RegimeLabel> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|&c| c == 0))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether every row sums to one within `tolerance`.
    pub fn is_row_stochastic(&self, tolerance: f64) -> bool {
        self.rows
            .iter()
            .all(|row| (row.iter().sum::<f64>() - 1.0).abs() <= tolerance)
    }

    /// Whether `to` can be entered from a different regime in one step.
    pub fn is_reachable(&self, to: RegimeLabel) -> bool {
        self.rows
            .iter()
            .enumerate()
            .any(|(from, row)| from != to && row[to] > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_estimate_counts_and_normalizes() {
        let labels = [0, 0, 1, 1, 1, 0, 2, 2];
        let matrix = TransitionMatrix::estimate(&labels, 3).unwrap();

        assert_eq!(matrix.counts()[0], vec![1, 1, 1]);
        assert_eq!(matrix.counts()[1], vec![1, 2, 0]);
        assert_eq!(matrix.counts()[2], vec![0, 0, 1]);
        assert_relative_eq!(matrix.probability(0, 1), 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(matrix.probability(1, 1), 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(matrix.probability(2, 2), 1.0, epsilon = 1e-12);
        assert!(matrix.is_row_stochastic(ROW_SUM_TOLERANCE));
    }

    #[test]
    fn test_terminal_only_regime_gets_self_loop() {
        // Regime 2 only appears as the final observation.
        let labels = [0, 1, 0, 1, 2];
        let matrix = TransitionMatrix::estimate(&labels, 3).unwrap();
        assert_eq!(matrix.row(2), &[0.0, 0.0, 1.0]);
        assert_eq!(matrix.degenerate_rows(), vec![2]);
    }

    #[test]
    fn test_unobserved_regime_is_unreachable() {
        let labels = [0, 0, 2, 2, 0];
        let matrix = TransitionMatrix::estimate(&labels, 3).unwrap();
        assert!(!matrix.is_reachable(1));
        assert_eq!(matrix.row(1), &[0.0, 1.0, 0.0]);
        assert!(matrix.is_row_stochastic(ROW_SUM_TOLERANCE));
    }

    #[test]
    fn test_single_regime() {
        let matrix = TransitionMatrix::estimate(&[0, 0, 0, 0], 1).unwrap();
        assert_eq!(matrix.rows(), &[vec![1.0]]);
    }

    #[test]
    fn test_rows_sum_to_one_for_irregular_counts() {
        let labels: Vec<usize> = (0..997).map(|i| (i * i + 3 * i) % 7).collect();
        let matrix = TransitionMatrix::estimate(&labels, 7).unwrap();
        assert!(matrix.is_row_stochastic(ROW_SUM_TOLERANCE));
    }

    #[test]
    fn test_out_of_range_label() {
        assert!(matches!(
            TransitionMatrix::estimate(&[0, 3], 2),
            Err(SimulationError::InvalidTransitionMatrix(_))
        ));
    }

    #[test]
    fn test_from_rows_validation() {
        assert!(TransitionMatrix::from_rows(vec![vec![0.5, 0.5], vec![0.0, 1.0]]).is_ok());
        assert!(TransitionMatrix::from_rows(vec![vec![0.5, 0.4], vec![0.0, 1.0]]).is_err());
        assert!(TransitionMatrix::from_rows(vec![vec![1.0], vec![0.0, 1.0]]).is_err());
        assert!(TransitionMatrix::from_rows(vec![vec![1.5, -0.5], vec![0.0, 1.0]]).is_err());
        assert!(TransitionMatrix::from_rows(vec![]).is_err());
    }
}
