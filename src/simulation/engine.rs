//! Synthetic market generator.
//!
//! Runs the pipeline:
//! 1. Validate the close series
//! 2. Convert closes to log returns
//! 3. Classify volatility regimes
//! 4. Estimate the regime transition matrix
//! 5. Pool historical returns by regime
//! 6. Simulate a future regime path (seed)
//! 7. Fill it with bootstrapped return blocks (seed + 1)
//! 8. Rebuild closes and OHLCV bars from the anchor price
//!
//! Steps 1-5 only depend on history and produce a [`RegimeModel`] that can be
//! shared read-only across any number of runs.

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{LogReturnSeries, PriceSeries, PriceSource, SyntheticBar};
use crate::regime::{
    RegimeClassification, RegimeClassifier, RegimeClassifierConfig, RegimeLabel, RegimePools,
    RegimeStats, TransitionMatrix,
};
use crate::validation::SeriesValidator;

use super::bootstrap::BlockBootstrapSampler;
use super::config::SimulationConfig;
use crate::error::{SimulationError, SimulationResult};
use super::path::RegimePathSimulator;
use super::reconstruct::PriceReconstructor;

/// Regime model fitted to one price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeModel {
    pub ticker: String,
    /// Last historical close; every synthetic path starts here.
    pub anchor_price: f64,
    pub last_date: NaiveDate,
    pub classification: RegimeClassification,
    pub transitions: TransitionMatrix,
    pub pools: RegimePools,
    /// Regime of the most recent historical day.
    pub start_regime: RegimeLabel,
}

impl RegimeModel {
    /// Fit a model to a validated close series.
    pub fn fit(history: &PriceSeries, vol_window: usize, n_regimes: usize) -> SimulationResult<Self> {
        let report = SeriesValidator::default().validate(history);
        if !report.all_passed() {
            let failed: Vec<_> = report
                .failed_checks()
                .iter()
                .map(|c| format!("{}: {}", c.name, c.message))
                .collect();
            return Err(SimulationError::InvalidSeries(failed.join("; ")));
        }

        let last = history
            .last()
            .ok_or_else(|| SimulationError::InvalidSeries("empty series".to_string()))?;

        let returns = LogReturnSeries::from_prices(history);
        debug!("{}: {} log returns", history.ticker, returns.len());

        let classifier = RegimeClassifier::new(RegimeClassifierConfig {
            vol_window,
            n_regimes,
        });
        let classification = classifier.classify(&returns)?;
        let start_regime = classification
            .current_regime()
            .ok_or(SimulationError::InsufficientHistory {
                required: vol_window + 1,
                available: returns.len(),
            })?;

        let transitions = TransitionMatrix::estimate(&classification.labels(), n_regimes)?;
        let pools = RegimePools::build(&classification.observations, n_regimes);

        info!(
            "{}: {} annotated days, thresholds {:?}, pool sizes {:?}, current regime {}",
            history.ticker,
            classification.len(),
            classification.thresholds,
            pools.sizes(),
            start_regime
        );
        debug!("{}: transition matrix {:?}", history.ticker, transitions.rows());

        let degenerate = transitions.degenerate_rows();
        if !degenerate.is_empty() {
            debug!("{}: self-loop fallback for regimes {:?}", history.ticker, degenerate);
        }
        let (reachable, unreachable): (Vec<_>, Vec<_>) = pools
            .empty_regimes()
            .into_iter()
            .partition(|&r| transitions.is_reachable(r));
        if !reachable.is_empty() {
            warn!(
                "{}: regimes {:?} have empty return pools but can be entered",
                history.ticker, reachable
            );
        }
        if !unreachable.is_empty() {
            debug!("{}: empty, unreachable regimes {:?}", history.ticker, unreachable);
        }

        Ok(Self {
            ticker: history.ticker.clone(),
            anchor_price: last.close,
            last_date: last.date,
            classification,
            transitions,
            pools,
            start_regime,
        })
    }

    pub fn n_regimes(&self) -> usize {
        self.transitions.n_regimes()
    }

    /// Per-regime statistics over the fitted history.
    pub fn stats(&self) -> Vec<RegimeStats> {
        self.classification.stats()
    }
}

/// One simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub seed: u64,
    pub regime_path: Vec<RegimeLabel>,
    pub returns: Vec<f64>,
    pub bars: Vec<SyntheticBar>,
}

/// Regime-switching block-bootstrap generator.
pub struct SyntheticMarketGenerator {
    config: SimulationConfig,
}

impl SyntheticMarketGenerator {
    /// Create a generator; fails on out-of-range parameters.
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fit the regime model to a history.
    pub fn fit(&self, history: &PriceSeries) -> SimulationResult<RegimeModel> {
        RegimeModel::fit(history, self.config.vol_window, self.config.n_regimes)
    }

    /// Simulate the configured horizon with the configured seed.
    pub fn generate(&self, model: &RegimeModel) -> SimulationResult<SimulationOutput> {
        self.generate_with_seed(model, self.config.seed)
    }

    /// Simulate the configured horizon with an explicit master seed.
    pub fn generate_with_seed(&self, model: &RegimeModel, seed: u64) -> SimulationResult<SimulationOutput> {
        self.generate_steps(model, self.config.n_steps(), seed)
    }

    /// Simulate `n_steps` days. The regime path draws from `seed`, the
    /// bootstrap from `seed + 1`.
    pub fn generate_steps(
        &self,
        model: &RegimeModel,
        n_steps: usize,
        seed: u64,
    ) -> SimulationResult<SimulationOutput> {
        let mut path_rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sample_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

        let simulator = RegimePathSimulator::new(&model.transitions)?;
        let regime_path = simulator.simulate(model.start_regime, n_steps, &mut path_rng)?;

        let sampler = BlockBootstrapSampler::new(self.config.block_size)?;
        let returns = sampler.sample(&regime_path, &model.pools, &mut sample_rng)?;

        let bars = PriceReconstructor::new(self.config.wick_factor)?.bars(
            model.anchor_price,
            &returns,
            self.config.start_date,
        );

        debug!(
            "{}: simulated {} steps with seed {}, final close {:?}",
            model.ticker,
            n_steps,
            seed,
            bars.last().map(|b| b.close)
        );

        Ok(SimulationOutput {
            seed,
            regime_path,
            returns,
            bars,
        })
    }

    /// Fit and simulate in one call.
    pub fn run(&self, history: &PriceSeries) -> SimulationResult<SimulationOutput> {
        let model = self.fit(history)?;
        self.generate(&model)
    }

    /// Run one simulation per seed in parallel against a shared model.
    /// Results come back in seed order and match sequential runs exactly.
    pub fn simulate_batch(
        &self,
        model: &RegimeModel,
        seeds: &[u64],
    ) -> SimulationResult<Vec<SimulationOutput>> {
        self.simulate_batch_with_progress(model, seeds, |_| {})
    }

    /// [`Self::simulate_batch`], calling `on_done` from the worker thread as
    /// each run finishes.
    pub fn simulate_batch_with_progress<F>(
        &self,
        model: &RegimeModel,
        seeds: &[u64],
        on_done: F,
    ) -> SimulationResult<Vec<SimulationOutput>>
    where
        F: Fn(&SimulationOutput) + Sync,
    {
        info!(
            "{}: running {} simulations of {} steps",
            model.ticker,
            seeds.len(),
            self.config.n_steps()
        );
        seeds
            .par_iter()
            .map(|&seed| {
                let out = self.generate_with_seed(model, seed)?;
                on_done(&out);
                Ok(out)
            })
            .collect()
    }
}

/// Load history for `ticker` from `source` and produce synthetic bars.
pub fn simulate<S: PriceSource + ?Sized>(
    source: &S,
    ticker: &str,
    config: &SimulationConfig,
) -> SimulationResult<Vec<SyntheticBar>> {
    let generator = SyntheticMarketGenerator::new(config.clone())?;
    let history = source.load_closes(ticker, config.history_start)?;
    info!(
        "{}: loaded {} closes since {}",
        ticker,
        history.len(),
        config.history_start
    );
    Ok(generator.run(&history)?.bars)
}
