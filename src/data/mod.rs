pub mod loader;
pub mod returns;
pub mod types;

pub use loader::{
    bars_to_dataframe, dataframe_to_series, write_bars_csv, DataLoader, InMemorySource,
    LoaderError, PriceSource, CLOSE_COLUMNS, DATE_COLUMNS,
};
pub use returns::LogReturnSeries;
pub use types::{PricePoint, PriceSeries, SyntheticBar};
