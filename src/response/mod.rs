//! Price Response Functions
//!
//! The response function measures how the midpoint moves, on average, in the
//! direction of the order flow that preceded it:
//!
//! ```text
//! R(τ) = ⟨ r_τ(t) · ε(t) ⟩ ,    r_τ(t) = (m(t + τ) - m(t)) / m(t)
//! ```
//!
//! # Module Layout
//!
//! - [`aggregator`]: single-partition accumulation over every lag
//! - [`combine`]: partition → year (observation-weighted) and
//!   instrument → group (unweighted) combination
//!
//! # Storage Convention
//!
//! Curves have `tau_max` slots; slot `k` (0-based) holds lag `τ = k + 1`.
//!
//! # Why Accumulators
//!
//! Weekly results are kept as `(Σ r·ε, n)` pairs rather than divided curves.
//! Summing pairs across weeks and dividing once weights every week by its
//! number of observations; averaging divided curves would not.

pub mod aggregator;
pub mod combine;

pub use aggregator::{accumulate_response, compute_response, SignAlignment};
pub use combine::{combine_instruments, combine_partitions};

use crate::error::{ResponseError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Number of non-zero-sign observations per lag slot.
pub type ObservationCounts = Vec<u64>;

/// Normalised response values, one per lag slot.
///
/// Slots with no observations hold `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    values: Vec<f64>,
}

impl ResponseCurve {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// A curve with every slot undefined.
    pub fn nan(tau_max: usize) -> Self {
        Self {
            values: vec![f64::NAN; tau_max],
        }
    }

    pub fn tau_max(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Response at lag `tau` (1-based). `None` outside `1..=tau_max`.
    pub fn at_lag(&self, tau: usize) -> Option<f64> {
        tau.checked_sub(1).and_then(|k| self.values.get(k).copied())
    }

    /// Number of defined (finite) slots.
    pub fn finite_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.values.clone())
    }

    pub fn from_array(array: Array1<f64>) -> Self {
        Self {
            values: array.to_vec(),
        }
    }
}

/// Un-normalised per-partition response: `(Σ r·ε, n)` for every lag slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseAccumulator {
    numerators: Vec<f64>,
    counts: ObservationCounts,
}

impl ResponseAccumulator {
    /// An empty accumulator; contributes nothing when merged.
    pub fn zeros(tau_max: usize) -> Self {
        Self {
            numerators: vec![0.0; tau_max],
            counts: vec![0; tau_max],
        }
    }

    pub fn from_parts(numerators: Vec<f64>, counts: ObservationCounts) -> Result<Self> {
        if numerators.len() != counts.len() {
            return Err(ResponseError::config(format!(
                "numerator/count length mismatch: {} vs {}",
                numerators.len(),
                counts.len()
            )));
        }
        Ok(Self { numerators, counts })
    }

    pub fn tau_max(&self) -> usize {
        self.numerators.len()
    }

    pub fn numerators(&self) -> &[f64] {
        &self.numerators
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Observations at the first lag, i.e. the partition's usable sample size.
    pub fn sample_size(&self) -> u64 {
        self.counts.first().copied().unwrap_or(0)
    }

    /// Add another accumulator slot by slot.
    pub fn merge(&mut self, other: &ResponseAccumulator) -> Result<()> {
        if other.tau_max() != self.tau_max() {
            return Err(ResponseError::config(format!(
                "cannot merge accumulators with tau_max {} and {}",
                self.tau_max(),
                other.tau_max()
            )));
        }

        for (acc, v) in self.numerators.iter_mut().zip(&other.numerators) {
            *acc += v;
        }
        for (acc, c) in self.counts.iter_mut().zip(&other.counts) {
            *acc += c;
        }
        Ok(())
    }

    /// Divide each numerator by its count; empty slots become `NaN`.
    pub fn normalize(&self) -> ResponseCurve {
        let values = self
            .numerators
            .iter()
            .zip(&self.counts)
            .map(|(&num, &n)| if n == 0 { f64::NAN } else { num / n as f64 })
            .collect();
        ResponseCurve::new(values)
    }
}
