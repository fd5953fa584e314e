//! Markov-chain regime path simulation.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::regime::{RegimeLabel, TransitionMatrix};

use crate::error::{SimulationError, SimulationResult};

/// Walks a transition matrix forward from a starting regime.
pub struct RegimePathSimulator {
    samplers: Vec<WeightedIndex<f64>>,
}

impl RegimePathSimulator {
    /// Prepare one categorical sampler per matrix row.
    pub fn new(matrix: &TransitionMatrix) -> SimulationResult<Self> {
        let samplers = matrix
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                WeightedIndex::new(row.iter().copied()).map_err(|e| {
                    SimulationError::InvalidTransitionMatrix(format!("row {}: {}", i, e))
                })
            })
            .collect::<SimulationResult<Vec<_>>>()?;
        Ok(Self { samplers })
    }

    pub fn n_regimes(&self) -> usize {
        self.samplers.len()
    }

    /// Simulate `n_steps` labels. The first label is `start`; each later
    /// label is drawn from the previous label's row.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        start: RegimeLabel,
        n_steps: usize,
        rng: &mut R,
    ) -> SimulationResult<Vec<RegimeLabel>> {
        if start >= self.samplers.len() {
            return Err(SimulationError::invalid(
                "start_regime",
                format!("{} out of range for {} regimes", start, self.samplers.len()),
            ));
        }

        let mut path = Vec::with_capacity(n_steps);
        let mut current = start;
        for step in 0..n_steps {
            path.push(current);
            if step + 1 < n_steps {
                current = self.samplers[current].sample(rng);
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_state() -> TransitionMatrix {
        TransitionMatrix::from_rows(vec![vec![0.7, 0.3], vec![0.4, 0.6]]).unwrap()
    }

    #[test]
    fn test_path_starts_at_start_regime() {
        let sim = RegimePathSimulator::new(&two_state()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let path = sim.simulate(1, 50, &mut rng).unwrap();
        assert_eq!(path.len(), 50);
        assert_eq!(path[0], 1);
        assert!(path.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_same_seed_same_path() {
        let sim = RegimePathSimulator::new(&two_state()).unwrap();
        let a = sim.simulate(0, 200, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let b = sim.simulate(0, 200, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let c = sim.simulate(0, 200, &mut ChaCha8Rng::seed_from_u64(12)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_probability_never_drawn() {
        let matrix = TransitionMatrix::from_rows(vec![
            vec![0.5, 0.0, 0.5],
            vec![0.0, 1.0, 0.0],
            vec![0.5, 0.0, 0.5],
        ])
        .unwrap();
        let sim = RegimePathSimulator::new(&matrix).unwrap();
        let path = sim.simulate(0, 1000, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        assert!(!path.contains(&1));
    }

    #[test]
    fn test_absorbing_regime() {
        let matrix = TransitionMatrix::from_rows(vec![vec![0.0, 1.0], vec![0.0, 1.0]]).unwrap();
        let sim = RegimePathSimulator::new(&matrix).unwrap();
        let path = sim.simulate(0, 5, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert_eq!(path, vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_single_regime_constant_path() {
        let matrix = TransitionMatrix::estimate(&[0, 0, 0], 1).unwrap();
        let sim = RegimePathSimulator::new(&matrix).unwrap();
        let path = sim.simulate(0, 30, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert!(path.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_start_out_of_range() {
        let sim = RegimePathSimulator::new(&two_state()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(sim.simulate(2, 10, &mut rng).is_err());
    }

    #[test]
    fn test_zero_steps() {
        let sim = RegimePathSimulator::new(&two_state()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(sim.simulate(0, 0, &mut rng).unwrap().is_empty());
    }
}
