//! Time series model.
//!
//! - [`QuoteTick`] / [`QuoteSeries`]: raw bid/ask ticks for one partition
//! - [`PriceSeries`]: ordered `(timestamp, price)` pairs, usually midpoints
//! - [`SignSeries`]: one direction label per price, in `{-1, 0, +1}`
//!
//! Both series validate on construction and are immutable afterwards, so
//! anything holding one can rely on its invariants without re-checking.

pub mod quotes;

pub use quotes::{QuoteSeries, QuoteTick};

use crate::error::{ResponseError, Result};
use crate::validation::{validate_prices, validate_timestamps};
use std::ops::Range;

/// Ordered `(timestamp, price)` pairs for one instrument over one partition.
///
/// # Invariants
///
/// - `timestamps.len() == prices.len()`
/// - timestamps non-decreasing (nanoseconds, or tick index in trade time)
/// - every price finite and strictly positive
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    timestamps: Vec<u64>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series, validating every invariant.
    pub fn new(timestamps: Vec<u64>, prices: Vec<f64>) -> Result<Self> {
        if timestamps.len() != prices.len() {
            return Err(ResponseError::config(format!(
                "timestamp/price length mismatch: {} vs {}",
                timestamps.len(),
                prices.len()
            )));
        }

        let time_check = validate_timestamps(&timestamps, u64::MAX);
        if time_check.has_errors() {
            return Err(ResponseError::invariant(time_check.errors().join("; ")));
        }

        let price_check = validate_prices(&prices);
        if price_check.has_errors() {
            return Err(ResponseError::invariant(price_check.errors().join("; ")));
        }

        Ok(Self { timestamps, prices })
    }

    /// Build a trade-time series: timestamps are the tick indices.
    pub fn from_prices(prices: Vec<f64>) -> Result<Self> {
        let timestamps = (0..prices.len() as u64).collect();
        Self::new(timestamps, prices)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Copy a contiguous sub-range. Sub-ranges keep every invariant.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            timestamps: self.timestamps[range.clone()].to_vec(),
            prices: self.prices[range].to_vec(),
        }
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (Vec<u64>, Vec<f64>) {
        (self.timestamps, self.prices)
    }
}

/// How a [`SignSeries`] was produced, which decides whether zeros are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignKind {
    /// One sign per tick, derived from midpoint changes. Never zero.
    Trade,
    /// One sign per time bin. Zero marks a bin without net order flow.
    Physical,
}

/// Ordered trade-direction labels, one per element of a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignSeries {
    values: Vec<i8>,
    kind: SignKind,
}

impl SignSeries {
    /// Trade-time signs: every value must be exactly `-1` or `+1`.
    pub fn trade(values: Vec<i8>) -> Result<Self> {
        if let Some(i) = values.iter().position(|&s| s != 1 && s != -1) {
            return Err(ResponseError::invariant(format!(
                "trade sign at index {i} is {}, expected -1 or +1",
                values[i]
            )));
        }
        Ok(Self {
            values,
            kind: SignKind::Trade,
        })
    }

    /// Physical-time signs: values in `{-1, 0, +1}`.
    pub fn physical(values: Vec<i8>) -> Result<Self> {
        if let Some(i) = values.iter().position(|&s| !(-1..=1).contains(&s)) {
            return Err(ResponseError::invariant(format!(
                "sign at index {i} is {}, expected -1, 0 or +1",
                values[i]
            )));
        }
        Ok(Self {
            values,
            kind: SignKind::Physical,
        })
    }

    pub fn values(&self) -> &[i8] {
        &self.values
    }

    pub fn kind(&self) -> SignKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of non-zero labels.
    pub fn nonzero_count(&self) -> usize {
        self.values.iter().filter(|&&s| s != 0).count()
    }

    /// Copy a contiguous sub-range, keeping the kind.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            values: self.values[range].to_vec(),
            kind: self.kind,
        }
    }
}
