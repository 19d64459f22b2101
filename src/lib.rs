//! FX Price Response
//!
//! Trade-sign inference and price-response functions for foreign-exchange
//! tick data.
//!
//! # Overview
//!
//! Top-of-book quotes are reduced to midpoint prices, the direction of each
//! trade is inferred from midpoint changes, and the response function
//!
//! ```text
//! R(τ) = ⟨ (m(t + τ) - m(t)) / m(t) · ε(t) ⟩
//! ```
//!
//! is measured per weekly partition, combined into year curves per
//! instrument, and averaged across instruments with similar spreads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        FX Response                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  series/        - Quotes, price and sign series                 │
//! │  features/      - Trade-sign derivation                         │
//! │  preprocessing/ - Physical-time resampling                      │
//! │  response/      - Per-partition aggregation and combination     │
//! │  spread         - Average spreads and group classification      │
//! │  source/        - Partition data sources (memory, HistData CSV) │
//! │  store/         - Curve persistence (memory, NumPy)             │
//! │  batch          - Parallel fan-out over partitions              │
//! │  pipeline       - Partition → instrument → group analysis       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use fx_response::{compute_response, derive_trade_signs, PriceSeries};
//!
//! let prices = PriceSeries::from_prices(vec![100.0, 100.0, 101.0, 99.0, 99.0, 100.0])?;
//! let signs = derive_trade_signs(&prices)?;
//! let (curve, counts) = compute_response(&prices, &signs, 2)?;
//!
//! assert_eq!(counts, vec![5, 4]);
//! assert!(curve.values().iter().all(|v| v.is_finite()));
//! # Ok::<(), fx_response::ResponseError>(())
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod response;
pub mod series;
pub mod source;
pub mod spread;
pub mod store;
pub mod validation;

// Re-exports - Errors
pub use error::{PartitionKey, ResponseError, Result};

// Re-exports - Config
pub use config::{AnalysisConfig, DataConfig, ExperimentMetadata, ResponseConfig, SpreadConfig, TimeScale};

// Re-exports - Series
pub use series::{PriceSeries, QuoteSeries, QuoteTick, SignKind, SignSeries};

// Re-exports - Features and preprocessing
pub use features::derive_trade_signs;
pub use preprocessing::{resample_physical, ONE_SECOND_NS};

// Re-exports - Response
pub use response::{
    accumulate_response, combine_instruments, combine_partitions, compute_response,
    ObservationCounts, ResponseAccumulator, ResponseCurve, SignAlignment,
};

// Re-exports - Spread
pub use spread::{
    InstrumentSpread, SpreadBand, SpreadMeasure, SpreadTable, SpreadThresholds, WeeklySpread,
};

// Re-exports - Sources and stores
pub use source::{HistDataSource, MemorySource, PartitionSource};
pub use store::{CurveKey, CurveKind, CurveStore, MemoryCurveStore, NpyCurveStore};

// Re-exports - Validation
pub use validation::{QuoteValidator, ValidationConfig, ValidationLevel, ValidationResult};

// Re-exports - Pipeline
pub use batch::{BatchConfig, BatchOutput, BatchProcessor};
pub use pipeline::{GroupResponse, ResponsePipeline, YearResponse};
