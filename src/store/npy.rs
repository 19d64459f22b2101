//! NumPy curve store.
//!
//! # Layout
//!
//! ```text
//! <root>/<scale>/<variant>/<period>/instruments/<instrument>.npy   float64 array, length tau_max
//! <root>/<scale>/<variant>/<period>/groups/<label>.npy             float64 array, length tau_max
//! <root>/<scale>/<variant>/<period>/<kind>/<subject>.json          CurveMetadata
//! ```
//!
//! `<variant>` is [`ResponseConfig::variant`](crate::config::ResponseConfig::variant).
//!
//! `NaN` slots are written as-is so plotting code can mask them.

use super::{CurveKey, CurveStore};
use crate::error::{ResponseError, Result};
use crate::response::ResponseCurve;
use ndarray::Array1;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// Sidecar written next to every curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveMetadata {
    pub scale: String,
    pub variant: String,
    /// `instruments` or `groups`
    pub kind: String,
    pub subject: String,
    pub period: String,
    pub tau_max: usize,
    /// Slots holding a finite value
    pub finite_entries: usize,
    /// RFC 3339
    pub export_timestamp: String,
}

/// Curves as `.npy` files under a root directory.
#[derive(Debug, Clone)]
pub struct NpyCurveStore {
    root: PathBuf,
}

impl NpyCurveStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, key: &CurveKey) -> PathBuf {
        self.root
            .join(key.scale.as_str())
            .join(&key.variant)
            .join(&key.period)
            .join(key.kind.as_str())
    }

    pub fn curve_path(&self, key: &CurveKey) -> PathBuf {
        self.dir(key).join(format!("{}.npy", key.subject))
    }

    pub fn metadata_path(&self, key: &CurveKey) -> PathBuf {
        self.dir(key).join(format!("{}.json", key.subject))
    }

    pub fn load_metadata(&self, key: &CurveKey) -> Result<CurveMetadata> {
        let contents = fs::read_to_string(self.metadata_path(key))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl CurveStore for NpyCurveStore {
    fn save_curve(&self, key: &CurveKey, curve: &ResponseCurve) -> Result<()> {
        fs::create_dir_all(self.dir(key))?;

        let path = self.curve_path(key);
        let mut file = File::create(&path)?;
        curve.to_array().write_npy(&mut file).map_err(|e| {
            ResponseError::Serialization(format!("failed to write {}: {e}", path.display()))
        })?;

        let metadata = CurveMetadata {
            scale: key.scale.as_str().to_string(),
            variant: key.variant.clone(),
            kind: key.kind.as_str().to_string(),
            subject: key.subject.clone(),
            period: key.period.clone(),
            tau_max: curve.tau_max(),
            finite_entries: curve.finite_count(),
            export_timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let file = File::create(self.metadata_path(key))?;
        serde_json::to_writer_pretty(file, &metadata)?;

        log::debug!("Saved curve {} to {}", key, path.display());
        Ok(())
    }

    fn load_curve(&self, key: &CurveKey) -> Result<ResponseCurve> {
        let path = self.curve_path(key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ResponseError::MissingCurve(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let array = Array1::<f64>::read_npy(BufReader::new(file)).map_err(|e| {
            ResponseError::Serialization(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(ResponseCurve::from_array(array))
    }

    fn contains(&self, key: &CurveKey) -> bool {
        self.curve_path(key).is_file()
    }
}
