//! Path metrics module.
//!
//! Summary statistics for historical and synthetic price paths:
//! - Total return, CAGR
//! - Annualized volatility, maximum drawdown
//! - Lag-1 autocorrelation of returns and absolute returns

pub mod calculator;

pub use calculator::{DrawdownAnalysis, MetricsCalculator, PathStatistics};
