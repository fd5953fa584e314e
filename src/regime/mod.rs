//! Volatility regime model.
//!
//! - Classifier: rolling realized volatility bucketed by quantile
//! - Transition matrix: first-order Markov chain over regime labels
//! - Pools: historical returns grouped by the regime active that day

pub mod classifier;
pub mod pool;
pub mod transition;

pub use classifier::{
    quantile_buckets, rolling_std, RegimeAnnotatedReturn, RegimeClassification, RegimeClassifier,
    RegimeClassifierConfig, RegimeLabel, RegimeStats,
};
pub use pool::RegimePools;
pub use transition::{TransitionMatrix, ROW_SUM_TOLERANCE};
