//! Response Analysis Pipeline
//!
//! Connects a [`PartitionSource`], the response computation and an optional
//! [`CurveStore`] into the three levels of analysis:
//!
//! ```text
//! partition   quotes → midpoints → trade signs [→ physical bins] → alignment
//!                    → ResponseAccumulator
//! instrument  accumulators of every week (parallel) → year curve   (weighted)
//! group       spread table → classify → year curves of members → group curve (mean)
//! ```
//!
//! Instrument year curves are looked up in the store before being computed
//! and saved after, so reruns only compute what is missing. Store keys carry
//! the response parameters, so one store can hold runs with different lag
//! counts, bin widths or alignments. Group curves depend on the spread table
//! and the instrument list of the call; they are always averaged afresh from
//! the member curves and then saved.
//!
//! # Example
//!
//! ```ignore
//! use fx_response::prelude::*;
//!
//! let source = HistDataSource::new("/data/histdata");
//! let pipeline = ResponsePipeline::new(source, AnalysisConfig::default())?
//!     .with_store(Arc::new(NpyCurveStore::new("/data/curves")));
//!
//! let year = pipeline.instrument_year_response("eur_usd", "2019")?;
//! let groups = pipeline.group_responses(&["eur_usd", "usd_try"], "2019")?;
//! ```

use crate::batch::{BatchConfig, BatchProcessor, ProgressCallback};
use crate::config::{AnalysisConfig, TimeScale};
use crate::error::{PartitionKey, ResponseError, Result};
use crate::preprocessing::resample_physical;
use crate::response::{
    accumulate_response, combine_instruments, ObservationCounts, ResponseAccumulator,
    ResponseCurve,
};
use crate::series::{PriceSeries, SignSeries};
use crate::source::PartitionSource;
use crate::spread::{InstrumentSpread, SpreadTable, WeeklySpread};
use crate::store::{CurveKey, CurveStore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Year-level response of one instrument.
#[derive(Debug, Clone)]
pub struct YearResponse {
    pub curve: ResponseCurve,
    /// Observations per lag slot, summed over the used partitions
    pub counts: ObservationCounts,
    pub partitions_used: Vec<String>,
    pub partitions_missing: Vec<String>,
}

/// Averaged response of one spread group.
#[derive(Debug, Clone)]
pub struct GroupResponse {
    pub label: String,
    pub members: Vec<String>,
    pub curve: ResponseCurve,
}

/// Response analysis over one partition source.
pub struct ResponsePipeline<S: PartitionSource> {
    source: S,
    config: AnalysisConfig,
    processor: BatchProcessor,
    store: Option<Arc<dyn CurveStore>>,
}

impl<S: PartitionSource> ResponsePipeline<S> {
    /// Create a pipeline. The configuration is validated first.
    pub fn new(source: S, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let mut batch_config = BatchConfig::new();
        batch_config.num_threads = config.num_threads;

        Ok(Self {
            source,
            config,
            processor: BatchProcessor::new(batch_config),
            store: None,
        })
    }

    /// Cache year and group curves in `store`.
    pub fn with_store(mut self, store: Arc<dyn CurveStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Report per-partition progress to `callback`.
    pub fn with_progress_callback(mut self, callback: Box<dyn ProgressCallback>) -> Self {
        let batch_config = self.processor.config().clone().with_progress(true);
        self.processor = BatchProcessor::new(batch_config).with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn scale(&self) -> TimeScale {
        self.config.response.time_scale
    }

    /// Partitions to process for an instrument and period.
    ///
    /// Uses the configured partition list when present, so absent weeks are
    /// reported as missing; otherwise whatever the source lists.
    pub fn partition_keys(&self, instrument: &str, period: &str) -> Result<Vec<PartitionKey>> {
        let configured = self.config.data.as_ref().and_then(|d| d.partitions.clone());
        let partitions = match configured {
            Some(p) => p,
            None => self.source.list_partitions(instrument, period)?,
        };
        Ok(partitions
            .into_iter()
            .map(|p| PartitionKey::new(instrument, period, p))
            .collect())
    }

    // ========================================================================
    // Partition level
    // ========================================================================

    /// Prices and signs of one partition, on the configured time scale and
    /// with the configured alignment applied.
    pub fn partition_series(&self, key: &PartitionKey) -> Result<(PriceSeries, SignSeries)> {
        let response = &self.config.response;
        let (prices, signs) = self.source.get_series_pair(key)?;

        let (prices, signs) = match response.time_scale {
            TimeScale::Trade => (prices, signs),
            TimeScale::Physical => resample_physical(&prices, &signs, response.bin_width_ns)?,
        };

        response.alignment.apply(&prices, &signs)
    }

    /// Un-normalised response of one partition.
    pub fn partition_accumulator(&self, key: &PartitionKey) -> Result<ResponseAccumulator> {
        let (prices, signs) = self.partition_series(key)?;
        accumulate_response(&prices, &signs, self.config.response.tau_max)
    }

    /// Normalised response of one partition.
    pub fn partition_response(&self, key: &PartitionKey) -> Result<(ResponseCurve, ObservationCounts)> {
        let acc = self.partition_accumulator(key)?;
        Ok((acc.normalize(), acc.counts().to_vec()))
    }

    // ========================================================================
    // Instrument level
    // ========================================================================

    /// Observation-weighted response of one instrument over one period.
    ///
    /// Missing partitions are skipped; if all are missing the curve is
    /// all-`NaN`.
    pub fn instrument_year_response(&self, instrument: &str, period: &str) -> Result<YearResponse> {
        let tau_max = self.config.response.tau_max;
        let keys = self.partition_keys(instrument, period)?;

        log::info!(
            "Computing {} response of {} {} over {} partitions",
            self.scale().as_str(),
            instrument,
            period,
            keys.len()
        );

        let output = self
            .processor
            .process_partitions(&keys, |key| self.partition_accumulator(key))?;

        let partitions_missing: Vec<String> =
            output.skipped.iter().map(|s| s.key.partition.clone()).collect();
        let partitions_used: Vec<String> =
            output.results.iter().map(|r| r.key.partition.clone()).collect();

        if partitions_used.is_empty() {
            log::warn!("No usable partitions for {instrument} {period}");
        }

        let mut total = ResponseAccumulator::zeros(tau_max);
        for acc in output.values() {
            total.merge(acc)?;
        }

        Ok(YearResponse {
            curve: total.normalize(),
            counts: total.counts().to_vec(),
            partitions_used,
            partitions_missing,
        })
    }

    /// Year curve of an instrument, from the store when available.
    pub fn instrument_curve(&self, instrument: &str, period: &str) -> Result<ResponseCurve> {
        let key = CurveKey::instrument(&self.config.response, instrument, period);
        if let Some(curve) = self.load_cached(&key)? {
            return Ok(curve);
        }

        let curve = self.instrument_year_response(instrument, period)?.curve;
        self.save(&key, &curve)?;
        Ok(curve)
    }

    // ========================================================================
    // Group level
    // ========================================================================

    /// Average spread of every instrument over a period.
    ///
    /// Instruments without a single readable partition are left out.
    pub fn spread_statistics<I: AsRef<str>>(&self, instruments: &[I], period: &str) -> Result<SpreadTable> {
        let measure = self.config.spread.measure;
        let mut entries = Vec::with_capacity(instruments.len());

        for instrument in instruments {
            let instrument = instrument.as_ref();
            let keys = self.partition_keys(instrument, period)?;
            let output = self.processor.process_partitions(&keys, |key| {
                let quotes = self.source.get_quotes(key)?;
                Ok(WeeklySpread::from_quotes(&quotes, measure))
            })?;

            let weeks = output.into_values();
            let entry = InstrumentSpread::from_weeks(instrument, &weeks);
            if entry.avg_spread.is_nan() {
                log::warn!("No spread data for {instrument} {period}");
                continue;
            }
            log::debug!("{} {}: average spread {:.4}", instrument, period, entry.avg_spread);
            entries.push(entry);
        }

        Ok(SpreadTable::new(period, measure, entries))
    }

    /// Group instruments by average spread and average their year curves.
    ///
    /// Groups with no members are left out of the result. Member curves come
    /// from the store when present; the group means are recomputed on every
    /// call and overwrite any stored group curve.
    pub fn group_responses<I: AsRef<str>>(
        &self,
        instruments: &[I],
        period: &str,
    ) -> Result<BTreeMap<String, GroupResponse>> {
        let table = self.spread_statistics(instruments, period)?;
        self.group_responses_with(&table, instruments, period)
    }

    /// [`group_responses`](Self::group_responses) with a precomputed spread table.
    pub fn group_responses_with<I: AsRef<str>>(
        &self,
        table: &SpreadTable,
        instruments: &[I],
        period: &str,
    ) -> Result<BTreeMap<String, GroupResponse>> {
        let groups = table.classify_by_spread(&self.config.spread.thresholds, instruments);
        let mut responses = BTreeMap::new();

        for (label, members) in groups {
            if members.is_empty() {
                log::warn!("Spread group {label} has no instruments in {period}");
                continue;
            }

            let curves = members
                .iter()
                .map(|m| self.instrument_curve(m, period))
                .collect::<Result<Vec<_>>>()?;
            let curve = combine_instruments(&curves)?;
            self.save(&CurveKey::group(&self.config.response, label.as_str(), period), &curve)?;

            log::info!("Group {} {}: {} instruments", label, period, members.len());
            responses.insert(
                label.clone(),
                GroupResponse {
                    label,
                    members,
                    curve,
                },
            );
        }

        Ok(responses)
    }

    // ========================================================================
    // Store helpers
    // ========================================================================

    fn load_cached(&self, key: &CurveKey) -> Result<Option<ResponseCurve>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        if !store.contains(key) {
            return Ok(None);
        }
        match store.load_curve(key) {
            Ok(curve) if curve.tau_max() == self.config.response.tau_max => {
                log::debug!("Using stored curve {key}");
                Ok(Some(curve))
            }
            Ok(curve) => {
                log::warn!(
                    "Stored curve {} has tau_max {}, expected {}; recomputing",
                    key,
                    curve.tau_max(),
                    self.config.response.tau_max
                );
                Ok(None)
            }
            Err(ResponseError::MissingCurve(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &CurveKey, curve: &ResponseCurve) -> Result<()> {
        match &self.store {
            Some(store) => store.save_curve(key, curve),
            None => Ok(()),
        }
    }
}
