//! Error taxonomy shared by every pipeline stage.

use thiserror::Error;

use crate::data::LoaderError;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid price series: {0}")]
    InvalidSeries(String),

    #[error("Insufficient history: need at least {required} returns, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Regime {regime} has no historical returns but is required at step {position}")]
    EmptyRegimePool { regime: usize, position: usize },

    #[error("Block size {block_size} exceeds regime {regime} pool length {pool_len}")]
    BlockOverflow {
        regime: usize,
        pool_len: usize,
        block_size: usize,
    },

    #[error("Invalid transition matrix: {0}")]
    InvalidTransitionMatrix(String),

    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
}

pub type SimulationResult<T> = Result<T, SimulationError>;

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
