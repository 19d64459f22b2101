//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use fx_response::prelude::*;
//!
//! let source = HistDataSource::new("/data/histdata");
//! let pipeline = ResponsePipeline::new(source, AnalysisConfig::default())?;
//! let year = pipeline.instrument_year_response("eur_usd", "2019")?;
//! ```
//!
//! # What's Included
//!
//! - Pipeline: [`ResponsePipeline`], [`AnalysisConfig`], [`YearResponse`], [`GroupResponse`]
//! - Series: [`QuoteSeries`], [`PriceSeries`], [`SignSeries`]
//! - Computation: [`derive_trade_signs`], [`compute_response`], [`combine_partitions`],
//!   [`combine_instruments`]
//! - Data: [`PartitionSource`], [`HistDataSource`], [`MemorySource`]
//! - Persistence: [`CurveStore`], [`NpyCurveStore`], [`MemoryCurveStore`]

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::config::{
    AnalysisConfig, DataConfig, ExperimentMetadata, ResponseConfig, SpreadConfig, TimeScale,
};
pub use crate::error::{PartitionKey, ResponseError, Result};
pub use crate::pipeline::{GroupResponse, ResponsePipeline, YearResponse};

// ============================================================================
// Series and Computation
// ============================================================================

pub use crate::features::derive_trade_signs;
pub use crate::preprocessing::{resample_physical, ONE_SECOND_NS};
pub use crate::response::{
    accumulate_response, combine_instruments, combine_partitions, compute_response,
    ObservationCounts, ResponseAccumulator, ResponseCurve, SignAlignment,
};
pub use crate::series::{PriceSeries, QuoteSeries, QuoteTick, SignKind, SignSeries};

// ============================================================================
// Spread Classification
// ============================================================================

pub use crate::spread::{SpreadBand, SpreadMeasure, SpreadTable, SpreadThresholds};

// ============================================================================
// Sources and Stores
// ============================================================================

pub use crate::source::{HistDataSource, MemorySource, PartitionSource};
pub use crate::store::{CurveKey, CurveKind, CurveStore, MemoryCurveStore, NpyCurveStore};

// ============================================================================
// Batch Processing
// ============================================================================

pub use crate::batch::{
    BatchConfig, BatchOutput, BatchProcessor, ConsoleProgress, ProgressCallback, ProgressInfo,
};
