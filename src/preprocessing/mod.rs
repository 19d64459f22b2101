//! Preprocessing applied between series extraction and response computation.
//!
//! - [`physical_time`]: trade-time → fixed-width time bins

pub mod physical_time;

pub use physical_time::{resample_physical, ONE_SECOND_NS};
