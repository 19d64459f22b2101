//! Analysis configuration management.
//!
//! One serializable struct describes a complete response analysis: the lag
//! range and time scale, the spread classification, the batch thread count
//! and where data lives. Configurations are saved next to results so every
//! curve can be traced back to the parameters that produced it.
//!
//! # Example
//!
//! ```ignore
//! use fx_response::config::{AnalysisConfig, TimeScale};
//!
//! let config = AnalysisConfig::default().with_time_scale(TimeScale::Physical);
//! config.save_toml("physical_2019.toml")?;
//!
//! let loaded = AnalysisConfig::load_toml("physical_2019.toml")?;
//! assert_eq!(loaded.response.time_scale, TimeScale::Physical);
//! ```

use crate::error::{ResponseError, Result};
use crate::preprocessing::ONE_SECOND_NS;
use crate::response::SignAlignment;
use crate::spread::{SpreadMeasure, SpreadThresholds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration of a response analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Response computation parameters
    #[serde(default)]
    pub response: ResponseConfig,

    /// Spread statistic and group bands
    #[serde(default)]
    pub spread: SpreadConfig,

    /// Worker threads for partition jobs (None = one per CPU)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,

    /// Data locations and the instruments/periods to process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataConfig>,

    /// Experiment metadata (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

/// Time axis on which lags are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    /// One step per quote tick
    #[default]
    Trade,
    /// One step per fixed-width time bin
    Physical,
}

impl TimeScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeScale::Trade => "trade",
            TimeScale::Physical => "physical",
        }
    }
}

/// Response computation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Number of lags; slot k holds lag k + 1
    pub tau_max: usize,

    pub time_scale: TimeScale,

    /// Bin width for [`TimeScale::Physical`], in nanoseconds
    pub bin_width_ns: u64,

    pub alignment: SignAlignment,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            tau_max: 1000,
            time_scale: TimeScale::Trade,
            bin_width_ns: ONE_SECOND_NS,
            alignment: SignAlignment::PreviousMidpoint,
        }
    }
}

impl ResponseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tau_max == 0 {
            return Err(ResponseError::config("tau_max must be > 0"));
        }
        if self.time_scale == TimeScale::Physical && self.bin_width_ns == 0 {
            return Err(ResponseError::config(
                "bin_width_ns must be > 0 for physical time",
            ));
        }
        Ok(())
    }

    /// Short tag naming every parameter that changes a computed curve.
    ///
    /// Curves computed under different tags never share a store slot.
    ///
    /// ```text
    /// trade     tau1000_previous_midpoint
    /// physical  tau1000_bin1000000000ns_previous_midpoint
    /// ```
    pub fn variant(&self) -> String {
        match self.time_scale {
            TimeScale::Trade => format!("tau{}_{}", self.tau_max, self.alignment.as_str()),
            TimeScale::Physical => format!(
                "tau{}_bin{}ns_{}",
                self.tau_max,
                self.bin_width_ns,
                self.alignment.as_str()
            ),
        }
    }
}

/// Spread statistic and classification bands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    pub measure: SpreadMeasure,
    pub thresholds: SpreadThresholds,
}

/// Data locations and the work list of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root of `<instrument>/<period>/<partition>.csv`
    pub quotes_dir: PathBuf,

    /// Root of the curve store
    pub output_dir: PathBuf,

    pub instruments: Vec<String>,

    pub periods: Vec<String>,

    /// Expected partitions per period. When absent, whatever the source
    /// lists is used and absent weeks go unnoticed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<String>>,
}

impl DataConfig {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(quotes_dir: P1, output_dir: P2) -> Self {
        Self {
            quotes_dir: quotes_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            instruments: Vec::new(),
            periods: Vec::new(),
            partitions: None,
        }
    }

    pub fn with_instruments<S: Into<String>>(mut self, instruments: impl IntoIterator<Item = S>) -> Self {
        self.instruments = instruments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_periods<S: Into<String>>(mut self, periods: impl IntoIterator<Item = S>) -> Self {
        self.periods = periods.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_partitions<S: Into<String>>(mut self, partitions: impl IntoIterator<Item = S>) -> Self {
        self.partitions = Some(partitions.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(ResponseError::config("data.instruments is empty"));
        }
        if self.periods.is_empty() {
            return Err(ResponseError::config("data.periods is empty"));
        }
        if matches!(&self.partitions, Some(p) if p.is_empty()) {
            return Err(ResponseError::config(
                "data.partitions is empty; omit it to use the source listing",
            ));
        }
        Ok(())
    }
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Version or git commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ExperimentMetadata {
    /// Metadata stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            version: None,
            tags: None,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_response(mut self, config: ResponseConfig) -> Self {
        self.response = config;
        self
    }

    pub fn with_tau_max(mut self, tau_max: usize) -> Self {
        self.response.tau_max = tau_max;
        self
    }

    pub fn with_time_scale(mut self, scale: TimeScale) -> Self {
        self.response.time_scale = scale;
        self
    }

    pub fn with_spread(mut self, config: SpreadConfig) -> Self {
        self.spread = config;
        self
    }

    pub fn with_data(mut self, config: DataConfig) -> Self {
        self.data = Some(config);
        self
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.response.validate()?;
        self.spread.thresholds.validate()?;

        if self.num_threads == Some(0) {
            return Err(ResponseError::config("num_threads must be > 0"));
        }

        if let Some(data) = &self.data {
            data.validate()?;
        }

        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load and validate configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load and validate configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}
