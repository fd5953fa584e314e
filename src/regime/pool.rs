//! Per-regime historical return pools.

use serde::{Deserialize, Serialize};

use super::classifier::{RegimeAnnotatedReturn, RegimeLabel};

/// Historical returns grouped by regime, indexed by regime label.
///
/// Chronological order is kept inside each pool so bootstrap blocks are
/// contiguous slices of real history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimePools {
    pools: Vec<Vec<f64>>,
}

impl RegimePools {
    /// Partition annotated returns into `n_regimes` pools.
    ///
    /// Observations labelled outside `[0, n_regimes)` are ignored.
    pub fn build(observations: &[RegimeAnnotatedReturn], n_regimes: usize) -> Self {
        let mut pools = vec![Vec::new(); n_regimes];
        for obs in observations {
            if let Some(pool) = pools.get_mut(obs.regime) {
                pool.push(obs.ret);
            }
        }
        Self { pools }
    }

    /// Wrap pre-grouped pools.
    pub fn from_pools(pools: Vec<Vec<f64>>) -> Self {
        Self { pools }
    }

    pub fn n_regimes(&self) -> usize {
        self.pools.len()
    }

    /// Returns for a regime; empty for unknown regimes.
    pub fn pool(&self, regime: RegimeLabel) -> &[f64] {
        self.pools.get(regime).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self, regime: RegimeLabel) -> bool {
        self.pool(regime).is_empty()
    }

    /// Regimes with no historical observations.
    pub fn empty_regimes(&self) -> Vec<RegimeLabel> {
        (0..self.pools.len()).filter(|&r| self.is_empty(r)).collect()
    }

    /// Pool length per regime.
    pub fn sizes(&self) -> Vec<usize> {
        self.pools.iter().map(Vec::len).collect()
    }

    /// Total observations across all pools.
    pub fn total_len(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(ret: f64, regime: RegimeLabel) -> RegimeAnnotatedReturn {
        RegimeAnnotatedReturn {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ret,
            volatility: 0.0,
            regime,
        }
    }

    #[test]
    fn test_partition_preserves_order() {
        let observations = vec![
            obs(0.1, 0),
            obs(0.2, 1),
            obs(0.3, 0),
            obs(0.4, 1),
            obs(0.5, 0),
        ];
        let pools = RegimePools::build(&observations, 2);

        assert_eq!(pools.pool(0), &[0.1, 0.3, 0.5]);
        assert_eq!(pools.pool(1), &[0.2, 0.4]);
        assert_eq!(pools.total_len(), observations.len());
    }

    #[test]
    fn test_partition_is_exact() {
        let observations: Vec<_> = (0..50).map(|i| obs(i as f64, (i * 7) % 3)).collect();
        let pools = RegimePools::build(&observations, 3);

        let mut union: Vec<f64> = (0..3).flat_map(|r| pools.pool(r).to_vec()).collect();
        union.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(union, expected);
    }

    #[test]
    fn test_empty_pool_flagged() {
        let pools = RegimePools::build(&[obs(0.1, 0), obs(0.2, 2)], 3);
        assert_eq!(pools.empty_regimes(), vec![1]);
        assert_eq!(pools.sizes(), vec![1, 0, 1]);
        assert!(pools.is_empty(1));
        assert!(pools.pool(9).is_empty());
    }
}
