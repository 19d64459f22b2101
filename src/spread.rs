//! Average Spread Statistics and Group Classification
//!
//! Instruments are grouped by their average bid/ask spread over a period so
//! that response functions can be averaged within liquidity classes.
//!
//! # Pipeline
//!
//! ```text
//! QuoteSeries (per week) → WeeklySpread → InstrumentSpread (nan-mean over weeks)
//!                                      → SpreadTable (sorted) → classify_by_spread
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fx_response::spread::{SpreadTable, SpreadThresholds};
//!
//! let table = SpreadTable::new("2019", SpreadMeasure::BasisPoints, entries);
//! let groups = table.classify_by_spread(&SpreadThresholds::default(), &["eur_usd", "usd_try"]);
//! assert!(groups["group_1"].contains(&"eur_usd".to_string()));
//! ```

use crate::error::{ResponseError, Result};
use crate::series::QuoteSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Measures and Bands
// ============================================================================

/// Unit in which spreads are measured.
///
/// Basis points are the default so one band table fits instruments quoted
/// at very different price levels; [`SpreadThresholds::default`] is in the
/// same unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadMeasure {
    /// `ask - bid` in price units
    Absolute,
    /// `(ask - bid) / midpoint × 10⁴`
    #[default]
    BasisPoints,
}

/// Half-open band `[lower, upper)` with a group label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadBand {
    pub label: String,
    pub lower: f64,
    /// `f64::INFINITY` for an unbounded top band. Omitted when serialized.
    #[serde(with = "unbounded", default = "unbounded::infinite")]
    pub upper: f64,
}

impl SpreadBand {
    pub fn new(label: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
        }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }
}

/// TOML and JSON have no infinity literal; store the open end as `None`.
mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn infinite() -> f64 {
        f64::INFINITY
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Ordered, non-overlapping spread bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadThresholds {
    pub bands: Vec<SpreadBand>,
}

impl Default for SpreadThresholds {
    /// Bands for the FX majors/minors/exotics split, in basis points to match
    /// the default [`SpreadMeasure::BasisPoints`]. Runs that switch to
    /// [`SpreadMeasure::Absolute`] (raw `ask - bid`) need bands in price units.
    fn default() -> Self {
        Self {
            bands: vec![
                SpreadBand::new("group_1", 0.0, 0.6),
                SpreadBand::new("group_2", 0.6, 7.0),
                SpreadBand::new("group_3", 7.0, f64::INFINITY),
            ],
        }
    }
}

impl SpreadThresholds {
    pub fn new(bands: Vec<SpreadBand>) -> Result<Self> {
        let thresholds = Self { bands };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Bands must be non-empty, sorted, non-overlapping and uniquely labelled.
    pub fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(ResponseError::config("spread thresholds need at least one band"));
        }

        for band in &self.bands {
            if band.lower.is_nan() || band.upper.is_nan() || band.lower >= band.upper {
                return Err(ResponseError::config(format!(
                    "band '{}' has invalid bounds [{}, {})",
                    band.label, band.lower, band.upper
                )));
            }
        }

        for pair in self.bands.windows(2) {
            if pair[1].lower < pair[0].upper {
                return Err(ResponseError::config(format!(
                    "bands '{}' and '{}' overlap or are out of order",
                    pair[0].label, pair[1].label
                )));
            }
        }

        let mut labels: Vec<&str> = self.bands.iter().map(|b| b.label.as_str()).collect();
        labels.sort_unstable();
        if labels.windows(2).any(|w| w[0] == w[1]) {
            return Err(ResponseError::config("band labels must be unique"));
        }

        Ok(())
    }

    /// Label of the band containing `value`, if any.
    pub fn classify(&self, value: f64) -> Option<&str> {
        self.bands
            .iter()
            .find(|b| b.contains(value))
            .map(|b| b.label.as_str())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Spread summary of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklySpread {
    pub num_quotes: usize,
    /// `NaN` when the partition has no usable quotes
    pub avg_spread: f64,
}

impl WeeklySpread {
    pub fn from_quotes(quotes: &QuoteSeries, measure: SpreadMeasure) -> Self {
        Self {
            num_quotes: quotes.len(),
            avg_spread: quotes.mean_spread(measure).unwrap_or(f64::NAN),
        }
    }
}

/// Spread summary of one instrument over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpread {
    pub instrument: String,
    /// Mean number of quotes per partition
    pub avg_quotes: f64,
    pub avg_spread: f64,
}

impl InstrumentSpread {
    /// NaN-ignoring mean over the available weeks.
    pub fn from_weeks(instrument: impl Into<String>, weeks: &[WeeklySpread]) -> Self {
        Self {
            instrument: instrument.into(),
            avg_quotes: nan_mean(weeks.iter().map(|w| w.num_quotes as f64)),
            avg_spread: nan_mean(weeks.iter().map(|w| w.avg_spread)),
        }
    }
}

fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

// ============================================================================
// Spread Table
// ============================================================================

/// Per-instrument average spreads for one period, sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadTable {
    pub period: String,
    pub measure: SpreadMeasure,
    entries: Vec<InstrumentSpread>,
}

impl SpreadTable {
    pub fn new(
        period: impl Into<String>,
        measure: SpreadMeasure,
        mut entries: Vec<InstrumentSpread>,
    ) -> Self {
        entries.sort_by(|a, b| a.avg_spread.total_cmp(&b.avg_spread));
        Self {
            period: period.into(),
            measure,
            entries,
        }
    }

    pub fn entries(&self) -> &[InstrumentSpread] {
        &self.entries
    }

    pub fn get(&self, instrument: &str) -> Option<&InstrumentSpread> {
        self.entries.iter().find(|e| e.instrument == instrument)
    }

    /// Group the given instruments by spread band.
    ///
    /// Every band label appears in the result, possibly with no members.
    /// Instruments missing from the table, with an undefined average, or
    /// outside every band are logged and left out.
    pub fn classify_by_spread<S: AsRef<str>>(
        &self,
        thresholds: &SpreadThresholds,
        instrument_ids: &[S],
    ) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = thresholds
            .bands
            .iter()
            .map(|b| (b.label.clone(), Vec::new()))
            .collect();

        for id in instrument_ids {
            let id = id.as_ref();
            let Some(entry) = self.get(id) else {
                log::warn!("No spread statistic for {id} in {}, not classified", self.period);
                continue;
            };
            if entry.avg_spread.is_nan() {
                log::warn!("Average spread of {id} in {} is undefined, not classified", self.period);
                continue;
            }
            match thresholds.classify(entry.avg_spread) {
                Some(label) => {
                    if let Some(members) = groups.get_mut(label) {
                        members.push(id.to_string());
                    }
                }
                None => log::warn!(
                    "Average spread {:.4} of {id} is outside every band, not classified",
                    entry.avg_spread
                ),
            }
        }

        groups
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let table: SpreadTable = serde_json::from_str(&contents)?;
        Ok(table)
    }
}
