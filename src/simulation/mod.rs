//! Synthetic path simulation.
//!
//! Regime path from the fitted Markov chain, block-bootstrapped returns
//! per regime, and OHLCV reconstruction on a business-day calendar.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod path;
pub mod reconstruct;

pub use crate::error::{SimulationError, SimulationResult};

pub use bootstrap::BlockBootstrapSampler;
pub use config::{ConfigError, SimulationConfig, TRADING_DAYS_PER_YEAR};
pub use engine::{simulate, RegimeModel, SimulationOutput, SyntheticMarketGenerator};
pub use path::RegimePathSimulator;
pub use reconstruct::{business_days, PriceReconstructor, DEFAULT_WICK_FACTOR};
