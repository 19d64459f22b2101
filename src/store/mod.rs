//! Response Curve Persistence
//!
//! Curves are stored under a [`CurveKey`] naming the time scale, the
//! response parameters, the kind of subject (instrument or spread group),
//! the subject itself and the period. The pipeline checks the store for
//! instrument curves before computing them, so a rerun only computes what
//! is missing.
//!
//! # Implementations
//!
//! - [`MemoryCurveStore`]: process-local cache
//! - [`NpyCurveStore`]: one `.npy` array per curve plus a JSON sidecar

pub mod npy;

pub use npy::{CurveMetadata, NpyCurveStore};

use crate::config::{ResponseConfig, TimeScale};
use crate::error::{ResponseError, Result};
use crate::response::ResponseCurve;
use ahash::AHashMap;
use std::fmt;
use std::sync::RwLock;

/// What a stored curve describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    /// Year curve of one instrument
    Instrument,
    /// Mean curve of a spread group
    Group,
}

impl CurveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveKind::Instrument => "instruments",
            CurveKind::Group => "groups",
        }
    }
}

/// Identity of a stored curve.
///
/// `variant` is [`ResponseConfig::variant`], so curves computed with a
/// different lag count, bin width or alignment live under different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurveKey {
    pub scale: TimeScale,
    pub variant: String,
    pub kind: CurveKind,
    /// Instrument id or group label
    pub subject: String,
    pub period: String,
}

impl CurveKey {
    pub fn new(
        response: &ResponseConfig,
        kind: CurveKind,
        subject: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            scale: response.time_scale,
            variant: response.variant(),
            kind,
            subject: subject.into(),
            period: period.into(),
        }
    }

    /// Key of an instrument year curve.
    pub fn instrument(
        response: &ResponseConfig,
        instrument: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self::new(response, CurveKind::Instrument, instrument, period)
    }

    /// Key of a spread-group curve.
    pub fn group(response: &ResponseConfig, label: impl Into<String>, period: impl Into<String>) -> Self {
        Self::new(response, CurveKind::Group, label, period)
    }
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.scale.as_str(),
            self.variant,
            self.period,
            self.kind.as_str(),
            self.subject
        )
    }
}

/// Key-addressed storage of response curves.
pub trait CurveStore: Send + Sync {
    fn save_curve(&self, key: &CurveKey, curve: &ResponseCurve) -> Result<()>;

    /// # Errors
    ///
    /// [`ResponseError::MissingCurve`] if nothing is stored under `key`.
    fn load_curve(&self, key: &CurveKey) -> Result<ResponseCurve>;

    fn contains(&self, key: &CurveKey) -> bool;
}

/// Thread-safe in-memory curve store.
#[derive(Debug, Default)]
pub struct MemoryCurveStore {
    curves: RwLock<AHashMap<CurveKey, ResponseCurve>>,
}

impl MemoryCurveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.curves.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> ResponseError {
    ResponseError::invariant("curve store lock poisoned")
}

impl CurveStore for MemoryCurveStore {
    fn save_curve(&self, key: &CurveKey, curve: &ResponseCurve) -> Result<()> {
        self.curves
            .write()
            .map_err(|_| poisoned())?
            .insert(key.clone(), curve.clone());
        Ok(())
    }

    fn load_curve(&self, key: &CurveKey) -> Result<ResponseCurve> {
        self.curves
            .read()
            .map_err(|_| poisoned())?
            .get(key)
            .cloned()
            .ok_or_else(|| ResponseError::MissingCurve(key.to_string()))
    }

    fn contains(&self, key: &CurveKey) -> bool {
        self.curves
            .read()
            .map(|m| m.contains_key(key))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::SignAlignment;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryCurveStore::new();
        let key = CurveKey::instrument(&ResponseConfig::default(), "eur_usd", "2019");
        assert!(!store.contains(&key));
        assert!(matches!(
            store.load_curve(&key),
            Err(ResponseError::MissingCurve(_))
        ));

        let curve = ResponseCurve::new(vec![1.0, 2.0]);
        store.save_curve(&key, &curve).unwrap();

        assert!(store.contains(&key));
        assert_eq!(store.load_curve(&key).unwrap(), curve);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_key_display() {
        let response = ResponseConfig {
            tau_max: 50,
            time_scale: TimeScale::Physical,
            ..ResponseConfig::default()
        };
        let key = CurveKey::group(&response, "group_1", "2019");
        assert_eq!(
            key.to_string(),
            "physical/tau50_bin1000000000ns_previous_midpoint/2019/groups/group_1"
        );
    }

    #[test]
    fn test_keys_separate_parameters_and_kinds() {
        let base = ResponseConfig::default();
        let shifted = ResponseConfig {
            alignment: SignAlignment::Contemporaneous,
            ..ResponseConfig::default()
        };

        assert_ne!(
            CurveKey::instrument(&base, "eur_usd", "2019"),
            CurveKey::instrument(&shifted, "eur_usd", "2019")
        );
        assert_ne!(
            CurveKey::instrument(&base, "group_1", "2019"),
            CurveKey::group(&base, "group_1", "2019")
        );
    }
}
