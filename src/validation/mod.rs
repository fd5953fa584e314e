//! Input validation module.
//!
//! Checks the historical close series supplied by the price source before
//! it enters the simulation pipeline.

pub mod series_integrity;

pub use series_integrity::{CheckResult, SeriesIntegrityReport, SeriesValidator};
