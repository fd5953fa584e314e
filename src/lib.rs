pub mod data;
pub mod error;
pub mod metrics;
pub mod regime;
pub mod simulation;
pub mod validation;

// Re-export commonly used types
pub use data::{DataLoader, InMemorySource, LogReturnSeries, PriceSeries, PriceSource, SyntheticBar};
pub use error::{SimulationError, SimulationResult};
pub use metrics::{MetricsCalculator, PathStatistics};
pub use regime::{RegimeClassifier, RegimePools, TransitionMatrix};
pub use simulation::{simulate, RegimeModel, SimulationConfig, SimulationOutput, SyntheticMarketGenerator};
pub use validation::SeriesValidator;
