//! Regime-conditional block bootstrap.
//!
//! Fills a simulated regime path with contiguous slices of historical
//! returns. The regime at the fill cursor picks the pool; a block may run
//! past a regime switch in the path, which is accepted.

use rand::Rng;

use crate::regime::{RegimeLabel, RegimePools};

use crate::error::{SimulationError, SimulationResult};

pub struct BlockBootstrapSampler {
    block_size: usize,
}

impl BlockBootstrapSampler {
    pub fn new(block_size: usize) -> SimulationResult<Self> {
        if block_size == 0 {
            return Err(SimulationError::invalid("block_size", "must be >= 1"));
        }
        Ok(Self { block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Check that `regime`'s pool can supply a full block.
    fn check_pool(&self, pools: &RegimePools, regime: RegimeLabel, position: usize) -> SimulationResult<()> {
        let pool_len = pools.pool(regime).len();
        if pool_len == 0 {
            return Err(SimulationError::EmptyRegimePool { regime, position });
        }
        if pool_len < self.block_size {
            return Err(SimulationError::BlockOverflow {
                regime,
                pool_len,
                block_size: self.block_size,
            });
        }
        Ok(())
    }

    /// Produce one return per path position.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        path: &[RegimeLabel],
        pools: &RegimePools,
        rng: &mut R,
    ) -> SimulationResult<Vec<f64>> {
        let n_steps = path.len();
        let mut out = Vec::with_capacity(n_steps);

        while out.len() < n_steps {
            let position = out.len();
            let regime = path[position];
            self.check_pool(pools, regime, position)?;

            let pool = pools.pool(regime);
            let offset = rng.gen_range(0..=pool.len() - self.block_size);
            let take = self.block_size.min(n_steps - position);
            out.extend_from_slice(&pool[offset..offset + take]);
        }

        Ok(out)
    }
}
