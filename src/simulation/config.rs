//! Simulation configuration.
//!
//! Every parameter of a run except the ticker. Loadable from TOML; keys
//! left out of the file take their default.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SimulationError;

/// Trading days per simulated year.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] SimulationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Horizon in years; the run produces `252 * years` bars.
    pub years: u32,

    /// Earliest historical date requested from the price source.
    pub history_start: NaiveDate,

    /// Rolling window (days) for realized volatility.
    pub vol_window: usize,

    /// Number of volatility regimes.
    pub n_regimes: usize,

    /// Bootstrap block length in days.
    pub block_size: usize,

    /// Master seed. The regime path uses `seed`, the bootstrap `seed + 1`.
    pub seed: u64,

    /// First calendar date of the synthetic output (rolled forward to a
    /// business day if needed).
    pub start_date: NaiveDate,

    /// Wick size as a multiple of the bar body.
    pub wick_factor: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            years: 1,
            history_start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            vol_window: 20, // ~1 month
            n_regimes: 3,
            block_size: 5,
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            wick_factor: 0.3,
        }
    }
}

impl SimulationConfig {
    /// Load from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of simulated trading days.
    pub fn n_steps(&self) -> usize {
        TRADING_DAYS_PER_YEAR * self.years as usize
    }

    /// Seed for the regime-path generator.
    pub fn path_seed(&self) -> u64 {
        self.seed
    }

    /// Seed for the block-bootstrap generator.
    pub fn bootstrap_seed(&self) -> u64 {
        self.seed.wrapping_add(1)
    }

    /// Copy of this config with a different master seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.years < 1 {
            return Err(SimulationError::invalid("years", "must be >= 1"));
        }
        if self.vol_window < 2 {
            return Err(SimulationError::invalid(
                "vol_window",
                format!("must be >= 2, got {}", self.vol_window),
            ));
        }
        if self.n_regimes < 1 {
            return Err(SimulationError::invalid("n_regimes", "must be >= 1"));
        }
        if self.block_size < 1 {
            return Err(SimulationError::invalid("block_size", "must be >= 1"));
        }
        if !self.wick_factor.is_finite() || self.wick_factor < 0.0 {
            return Err(SimulationError::invalid(
                "wick_factor",
                format!("must be finite and >= 0, got {}", self.wick_factor),
            ));
        }
        Ok(())
    }
}
