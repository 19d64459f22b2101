//! Partition Data Sources
//!
//! A [`PartitionSource`] supplies quote data one partition at a time. The
//! response pipeline never touches files directly; swapping the source is
//! enough to run the same analysis on a different vendor or on synthetic
//! data.
//!
//! # Implementations
//!
//! - [`MemorySource`]: in-process map, for tests and precomputed series
//! - [`HistDataSource`]: HistData ASCII tick CSV files on disk
//!
//! # Example
//!
//! ```ignore
//! use fx_response::source::{HistDataSource, PartitionSource};
//!
//! let source = HistDataSource::new("/data/histdata");
//! for week in source.list_partitions("eur_usd", "2019")? {
//!     let key = PartitionKey::new("eur_usd", "2019", week);
//!     let (prices, signs) = source.get_series_pair(&key)?;
//! }
//! ```

pub mod histdata;
pub mod memory;

pub use histdata::HistDataSource;
pub use memory::MemorySource;

use crate::error::{PartitionKey, Result};
use crate::features::derive_trade_signs;
use crate::series::{PriceSeries, QuoteSeries, SignSeries};

/// Provider of per-partition quote data.
///
/// Implementations must return [`ResponseError::MissingPartition`] when a
/// partition has no data, so batch runs can skip it.
///
/// [`ResponseError::MissingPartition`]: crate::error::ResponseError::MissingPartition
pub trait PartitionSource: Send + Sync {
    /// Partition identifiers available for an instrument and period, sorted.
    fn list_partitions(&self, instrument: &str, period: &str) -> Result<Vec<String>>;

    /// Raw quotes of one partition.
    fn get_quotes(&self, key: &PartitionKey) -> Result<QuoteSeries>;

    /// Midpoint series of one partition.
    fn get_price_series(&self, key: &PartitionKey) -> Result<PriceSeries> {
        self.get_quotes(key)?.midpoint_series()
    }

    /// Trade signs of one partition, derived from its midpoints.
    fn get_sign_series(&self, key: &PartitionKey) -> Result<SignSeries> {
        derive_trade_signs(&self.get_price_series(key)?)
    }

    /// Prices and matching signs from a single load.
    fn get_series_pair(&self, key: &PartitionKey) -> Result<(PriceSeries, SignSeries)> {
        let prices = self.get_price_series(key)?;
        let signs = derive_trade_signs(&prices)?;
        Ok((prices, signs))
    }
}
