//! Data Validation Module
//!
//! Validation utilities for quote and price data, run before series enter the
//! response computation so that bad ticks are caught at the partition that
//! produced them.
//!
//! # Validation Categories
//!
//! 1. **Quote Consistency**: crossed quotes, locked quotes, spread bounds
//! 2. **Price Ranges**: NaN/Inf detection, non-positive prices
//! 3. **Timestamp Ordering**: monotonic timestamps, gap detection
//!
//! Errors are what [`crate::series::PriceSeries::new`] refuses to build;
//! warnings are logged and otherwise ignored.
//!
//! # Usage
//!
//! ```ignore
//! use fx_response::validation::{QuoteValidator, ValidationResult};
//!
//! let validator = QuoteValidator::default();
//! let result = validator.validate_quotes(&quotes);
//!
//! for warning in result.warnings() {
//!     log::warn!("{}", warning);
//! }
//! ```

use crate::series::QuoteTick;
use std::fmt;

/// Validation result for a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Data is valid
    Valid,
    /// Data has minor issues (warnings)
    Warning(String),
    /// Data has serious issues (errors)
    Error(String),
}

impl ValidationLevel {
    /// Check if this result indicates valid data.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationLevel::Valid)
    }

    /// Check if this result is a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationLevel::Warning(_))
    }

    /// Check if this result is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationLevel::Error(_))
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "Valid"),
            ValidationLevel::Warning(msg) => write!(f, "Warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Aggregated validation result.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    results: Vec<(String, ValidationLevel)>,
}

impl ValidationResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation result.
    pub fn add(&mut self, check_name: &str, level: ValidationLevel) {
        self.results.push((check_name.to_string(), level));
    }

    /// Append all checks from another result.
    pub fn extend(&mut self, other: ValidationResult) {
        self.results.extend(other.results);
    }

    /// Check if all validations passed (no errors or warnings).
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, level)| level.is_valid())
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_error())
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_warning())
    }

    /// Get all warnings, prefixed with the check name.
    pub fn warnings(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Warning(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// Get all errors, prefixed with the check name.
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Error(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// Get the number of checks performed.
    pub fn check_count(&self) -> usize {
        self.results.len()
    }

    /// Get the number of passed checks.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|(_, l)| l.is_valid()).count()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let passed = self.passed_count();
        let total = self.check_count();
        writeln!(f, "Validation: {passed}/{total} checks passed")?;

        for (name, level) in &self.results {
            if !level.is_valid() {
                writeln!(f, "  - {name}: {level}")?;
            }
        }

        Ok(())
    }
}

/// Configuration for quote validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Maximum allowed relative spread in basis points
    pub max_spread_bps: f64,

    /// Check for crossed quotes (bid > ask)
    pub check_crossed_quotes: bool,

    /// Check for locked quotes (bid == ask)
    pub check_locked_quotes: bool,

    /// Gap between consecutive timestamps reported as a warning (nanoseconds)
    pub max_gap_ns: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_spread_bps: 1000.0,
            check_crossed_quotes: true,
            check_locked_quotes: true,
            // FX weekly partitions have no intra-week closures; an hour of
            // silence is worth a look.
            max_gap_ns: 3_600_000_000_000,
        }
    }
}

/// Validator for bid/ask quote ticks.
#[derive(Debug, Clone, Default)]
pub struct QuoteValidator {
    config: ValidationConfig,
}

impl QuoteValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a sequence of quote ticks.
    ///
    /// Stops at the first offending tick per check so a badly broken file
    /// does not produce one message per row.
    pub fn validate_quotes(&self, ticks: &[QuoteTick]) -> ValidationResult {
        let mut result = ValidationResult::new();

        let timestamps: Vec<u64> = ticks.iter().map(|t| t.timestamp_ns).collect();
        result.extend(validate_timestamps(&timestamps, self.config.max_gap_ns));

        let mut prices = Vec::with_capacity(ticks.len() * 2);
        for tick in ticks {
            prices.push(tick.bid);
            prices.push(tick.ask);
        }
        result.extend(validate_prices(&prices));

        self.validate_quote_consistency(ticks, &mut result);
        self.validate_spread(ticks, &mut result);

        result
    }

    /// Validate quote consistency (crossed/locked).
    fn validate_quote_consistency(&self, ticks: &[QuoteTick], result: &mut ValidationResult) {
        let crossed = ticks.iter().position(|t| t.bid > t.ask);
        let locked = ticks.iter().position(|t| t.bid == t.ask);

        let mut consistent = true;

        if self.config.check_crossed_quotes {
            if let Some(i) = crossed {
                consistent = false;
                result.add(
                    "crossed_quotes",
                    ValidationLevel::Warning(format!(
                        "Crossed quotes at tick {i}: bid {} > ask {}",
                        ticks[i].bid, ticks[i].ask
                    )),
                );
            }
        }

        if self.config.check_locked_quotes {
            if let Some(i) = locked {
                consistent = false;
                result.add(
                    "locked_quotes",
                    ValidationLevel::Warning(format!(
                        "Locked quotes at tick {i}: bid == ask = {}",
                        ticks[i].bid
                    )),
                );
            }
        }

        if consistent {
            result.add("quote_consistency", ValidationLevel::Valid);
        }
    }

    /// Validate relative spread bounds.
    fn validate_spread(&self, ticks: &[QuoteTick], result: &mut ValidationResult) {
        let wide = ticks
            .iter()
            .enumerate()
            .find(|(_, t)| t.relative_spread_bps() > self.config.max_spread_bps);

        match wide {
            Some((i, tick)) => result.add(
                "spread",
                ValidationLevel::Warning(format!(
                    "Spread {:.2} bps at tick {i} exceeds max {:.2} bps",
                    tick.relative_spread_bps(),
                    self.config.max_spread_bps
                )),
            ),
            None => result.add("spread", ValidationLevel::Valid),
        }
    }
}

/// Validate a sequence of timestamps for monotonicity.
///
/// Equal consecutive timestamps are allowed (several ticks in the same
/// millisecond are common in FX feeds).
pub fn validate_timestamps(timestamps: &[u64], max_gap_ns: u64) -> ValidationResult {
    let mut result = ValidationResult::new();

    if timestamps.is_empty() {
        result.add(
            "timestamps",
            ValidationLevel::Warning("No timestamps to validate".to_string()),
        );
        return result;
    }

    let mut monotonic = true;
    let mut max_gap = 0u64;

    for i in 1..timestamps.len() {
        if timestamps[i] < timestamps[i - 1] {
            monotonic = false;
            result.add(
                "timestamp_ordering",
                ValidationLevel::Error(format!(
                    "Non-monotonic timestamp at index {}: {} < {}",
                    i,
                    timestamps[i],
                    timestamps[i - 1]
                )),
            );
            break;
        }

        max_gap = max_gap.max(timestamps[i] - timestamps[i - 1]);
    }

    if monotonic {
        result.add("timestamp_ordering", ValidationLevel::Valid);

        if max_gap > max_gap_ns {
            result.add(
                "timestamp_gaps",
                ValidationLevel::Warning(format!(
                    "Max timestamp gap: {:.2} seconds",
                    max_gap as f64 / 1e9
                )),
            );
        } else {
            result.add("timestamp_gaps", ValidationLevel::Valid);
        }
    }

    result
}

/// Validate that every price is finite and strictly positive.
pub fn validate_prices(prices: &[f64]) -> ValidationResult {
    let mut result = ValidationResult::new();

    for (i, &p) in prices.iter().enumerate() {
        if p.is_nan() {
            result.add(
                "price_range",
                ValidationLevel::Error(format!("NaN price at index {i}")),
            );
            return result;
        }
        if p.is_infinite() {
            result.add(
                "price_range",
                ValidationLevel::Error(format!("Infinite price at index {i}")),
            );
            return result;
        }
        if p <= 0.0 {
            result.add(
                "price_range",
                ValidationLevel::Error(format!("Non-positive price {p} at index {i}")),
            );
            return result;
        }
    }

    result.add("price_range", ValidationLevel::Valid);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ts: u64, bid: f64, ask: f64) -> QuoteTick {
        QuoteTick::new(ts, bid, ask)
    }

    fn valid_quotes() -> Vec<QuoteTick> {
        vec![
            tick(1_000, 1.1450, 1.1452),
            tick(2_000, 1.1451, 1.1453),
            tick(3_000, 1.1449, 1.1451),
        ]
    }

    #[test]
    fn test_valid_quotes() {
        let result = QuoteValidator::new().validate_quotes(&valid_quotes());

        assert!(result.is_valid(), "{result}");
        assert!(!result.has_errors());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_crossed_quotes() {
        let mut quotes = valid_quotes();
        quotes[1] = tick(2_000, 1.1455, 1.1453);

        let result = QuoteValidator::new().validate_quotes(&quotes);

        assert!(result.has_warnings());
        assert!(result.warnings()[0].contains("crossed_quotes"));
    }

    #[test]
    fn test_locked_quotes() {
        let mut quotes = valid_quotes();
        quotes[2] = tick(3_000, 1.1450, 1.1450);

        let result = QuoteValidator::new().validate_quotes(&quotes);

        assert!(result.has_warnings());
        assert!(!result.has_errors());
    }

    #[test]
    fn test_wide_spread_warning() {
        let config = ValidationConfig {
            max_spread_bps: 1.0,
            ..Default::default()
        };
        let quotes = vec![tick(1_000, 1.1400, 1.1500)];

        let result = QuoteValidator::with_config(config).validate_quotes(&quotes);

        assert!(result.has_warnings());
    }

    #[test]
    fn test_validate_timestamps_monotonic() {
        let timestamps = vec![1_000_000, 2_000_000, 2_000_000, 4_000_000];
        let result = validate_timestamps(&timestamps, u64::MAX);

        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_timestamps_non_monotonic() {
        let timestamps = vec![1_000_000, 3_000_000, 2_000_000, 4_000_000];
        let result = validate_timestamps(&timestamps, u64::MAX);

        assert!(result.has_errors());
    }

    #[test]
    fn test_validate_timestamps_gap() {
        let timestamps = vec![0, 10, 5_000];
        let result = validate_timestamps(&timestamps, 100);

        assert!(result.has_warnings());
        assert!(!result.has_errors());
    }

    #[test]
    fn test_validate_prices() {
        assert!(validate_prices(&[1.0, 2.0, 3.0]).is_valid());
        assert!(validate_prices(&[1.0, f64::NAN]).has_errors());
        assert!(validate_prices(&[1.0, f64::INFINITY]).has_errors());
        assert!(validate_prices(&[1.0, 0.0]).has_errors());
        assert!(validate_prices(&[-1.0]).has_errors());
    }

    #[test]
    fn test_validation_result_display() {
        let mut result = ValidationResult::new();
        result.add("test1", ValidationLevel::Valid);
        result.add("test2", ValidationLevel::Warning("minor issue".to_string()));
        result.add("test3", ValidationLevel::Error("major issue".to_string()));

        let display = format!("{result}");
        assert!(display.contains("1/3"));
        assert!(display.contains("major issue"));
    }
}
