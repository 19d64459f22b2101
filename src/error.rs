//! Error types for response computation.
//!
//! Partition-level data problems ([`ResponseError::MissingPartition`],
//! [`ResponseError::InsufficientData`]) are recoverable: batch runs log them
//! and carry on with the remaining partitions. Everything else indicates a
//! bug upstream or a bad configuration and is propagated to the caller.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ResponseError>;

/// Identifies one independent slice of data: an instrument, a period
/// (typically a year) and a partition inside it (typically a week).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub instrument: String,
    pub period: String,
    pub partition: String,
}

impl PartitionKey {
    pub fn new(
        instrument: impl Into<String>,
        period: impl Into<String>,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            period: period.into(),
            partition: partition.into(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.instrument, self.period, self.partition)
    }
}

/// All errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// Upstream data is absent for a partition.
    #[error("no data for partition {key}: {reason}")]
    MissingPartition { key: String, reason: String },

    /// A series is too short to derive any sign or return.
    #[error("insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A derived or supplied series breaks one of its invariants.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Invalid parameters or mismatched inputs.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A curve lookup in a store found nothing under the key.
    #[error("no stored curve for {0}")]
    MissingCurve(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ResponseError {
    pub fn missing_partition(key: &PartitionKey, reason: impl Into<String>) -> Self {
        ResponseError::MissingPartition {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ResponseError::Configuration(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        ResponseError::InvariantViolation(msg.into())
    }

    /// True for errors a batch run skips past instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResponseError::MissingPartition { .. } | ResponseError::InsufficientData { .. }
        )
    }
}

impl From<serde_json::Error> for ResponseError {
    fn from(e: serde_json::Error) -> Self {
        ResponseError::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for ResponseError {
    fn from(e: toml::ser::Error) -> Self {
        ResponseError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ResponseError {
    fn from(e: toml::de::Error) -> Self {
        ResponseError::Serialization(e.to_string())
    }
}
