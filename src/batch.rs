//! Parallel batch processing over partitions.
//!
//! Partitions (instrument × period × week) are independent, so a year of
//! data is processed as one job per partition on a local Rayon pool. Each job
//! loads its own data, reduces it to a small result (typically a
//! [`ResponseAccumulator`](crate::response::ResponseAccumulator)) and drops
//! the series before returning. Results are only combined after every job
//! has finished.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    BatchProcessor                         │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │                Rayon Thread Pool                    │  │
//! │  │                                                     │  │
//! │  │   Thread 1        Thread 2        Thread N          │  │
//! │  │   job(w01)        job(w02)        job(wNN)          │  │
//! │  │      │               │               │              │  │
//! │  │      ▼               ▼               ▼              │  │
//! │  │   Ok(T)        MissingPartition     Ok(T)           │  │
//! │  └─────────────────────┬──────────────────────────────┘  │
//! │                        ▼  (join)                          │
//! │         BatchOutput { results, skipped }                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Policy
//!
//! Recoverable errors ([`ResponseError::is_recoverable`]) are logged and the
//! partition is recorded as skipped. Any other error fails the whole batch.
//!
//! # Example
//!
//! ```ignore
//! use fx_response::batch::{BatchConfig, BatchProcessor};
//!
//! let processor = BatchProcessor::new(BatchConfig::new().with_threads(8));
//! let output = processor.process_partitions(&keys, |key| {
//!     let (prices, signs) = source.get_series_pair(key)?;
//!     accumulate_response(&prices, &signs, 1000)
//! })?;
//! println!("{} weeks, {} missing", output.successful_count(), output.skipped_count());
//! ```

use crate::error::{PartitionKey, ResponseError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Configuration
// ============================================================================

/// Batch processing configuration.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Number of threads to use.
    ///
    /// - `None`: Rayon default (one per CPU)
    /// - `Some(n)`: exactly n threads
    pub num_threads: Option<usize>,

    /// Enable progress reporting via callback.
    pub report_progress: bool,

    /// Stack size per thread in bytes (advanced).
    pub stack_size: Option<usize>,
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads to use.
    ///
    /// # Panics
    ///
    /// Panics if threads is 0.
    pub fn with_threads(mut self, threads: usize) -> Self {
        assert!(threads > 0, "Thread count must be > 0");
        self.num_threads = Some(threads);
        self
    }

    pub fn with_progress(mut self, report: bool) -> Self {
        self.report_progress = report;
        self
    }

    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Configured threads, or the Rayon default.
    #[cfg(feature = "parallel")]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Without the `parallel` feature everything runs on the caller's thread.
    #[cfg(not(feature = "parallel"))]
    pub fn effective_threads(&self) -> usize {
        1
    }
}

// ============================================================================
// Results
// ============================================================================

/// Output of one successful partition job.
#[derive(Debug, Clone)]
pub struct PartitionResult<T> {
    pub key: PartitionKey,
    pub value: T,
    pub elapsed: Duration,
}

/// A partition left out because of a recoverable error.
#[derive(Debug, Clone)]
pub struct SkippedPartition {
    pub key: PartitionKey,
    pub reason: String,
}

/// Collected output of a batch run, in input order.
#[derive(Debug)]
pub struct BatchOutput<T> {
    pub results: Vec<PartitionResult<T>>,
    pub skipped: Vec<SkippedPartition>,
    pub elapsed: Duration,
    pub threads_used: usize,
}

impl<T> BatchOutput<T> {
    pub fn successful_count(&self) -> usize {
        self.results.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn all_successful(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.results.iter().map(|r| &r.value)
    }

    pub fn into_values(self) -> Vec<T> {
        self.results.into_iter().map(|r| r.value).collect()
    }

    /// Sum of per-job times divided by wall time.
    pub fn speedup_factor(&self) -> f64 {
        let busy: f64 = self.results.iter().map(|r| r.elapsed.as_secs_f64()).sum();
        let wall = self.elapsed.as_secs_f64();
        if wall > 0.0 {
            busy / wall
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            processed: self.successful_count(),
            skipped: self.skipped_count(),
            elapsed: self.elapsed,
            threads_used: self.threads_used,
            speedup: self.speedup_factor(),
        }
    }
}

/// Type-erased totals handed to [`ProgressCallback::on_complete`].
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
    pub threads_used: usize,
    pub speedup: f64,
}

// ============================================================================
// Progress Reporting
// ============================================================================

/// Progress information for callbacks.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Partition about to be processed.
    pub current: String,

    /// Index of the partition in the input (0-based).
    pub current_index: usize,

    pub total: usize,

    /// Partitions finished so far.
    pub completed: usize,

    /// Partitions skipped so far.
    pub skipped: usize,

    pub elapsed: Duration,
}

impl ProgressInfo {
    /// Completion percentage (0.0 to 100.0).
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed + self.skipped) as f64 / self.total as f64 * 100.0
        }
    }

    /// Estimate remaining time from the average time per finished partition.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let done = self.completed + self.skipped;
        if done == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(done);
        let avg_time = self.elapsed.as_secs_f64() / done as f64;
        Some(Duration::from_secs_f64(avg_time * remaining as f64))
    }
}

/// Receives progress updates during batch processing.
pub trait ProgressCallback: Send + Sync {
    /// Called when a partition job starts.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called once all jobs have finished.
    fn on_complete(&self, summary: &BatchSummary);
}

/// Simple console progress reporter.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    pub verbose: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if self.verbose {
            println!(
                "[{:3}/{:3}] Processing: {} ({:.1}% complete)",
                info.completed + info.skipped + 1,
                info.total,
                info.current,
                info.percent_complete()
            );
        } else {
            print!(
                "\r[{:3}/{:3}] {:.1}%",
                info.completed + info.skipped,
                info.total,
                info.percent_complete()
            );
            use std::io::Write;
            std::io::stdout().flush().ok();
        }
    }

    fn on_complete(&self, summary: &BatchSummary) {
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!("Batch Processing Complete");
        println!("═══════════════════════════════════════════════════════════════");
        println!("  Partitions processed: {}", summary.processed);
        println!("  Partitions skipped:   {}", summary.skipped);
        println!("  Threads:              {}", summary.threads_used);
        println!("  Total time:           {:?}", summary.elapsed);
        println!("  Speedup:              {:.2}x", summary.speedup);
        println!("═══════════════════════════════════════════════════════════════");
    }
}

// ============================================================================
// Batch Processor
// ============================================================================

enum Outcome<T> {
    Done(PartitionResult<T>),
    Skipped(SkippedPartition),
    Failed(ResponseError),
}

/// Runs one job per partition, in parallel when the `parallel` feature is on.
#[derive(Default)]
pub struct BatchProcessor {
    config: BatchConfig,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    /// Set a progress callback. Only used when `report_progress` is on.
    pub fn with_progress_callback(mut self, callback: Box<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(Arc::from(callback));
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run `job` for every key and collect the results.
    ///
    /// # Errors
    ///
    /// The first non-recoverable job error, in input order. Recoverable
    /// errors never fail the batch.
    pub fn process_partitions<T, F>(&self, keys: &[PartitionKey], job: F) -> Result<BatchOutput<T>>
    where
        T: Send,
        F: Fn(&PartitionKey) -> Result<T> + Sync,
    {
        let start = Instant::now();
        let total = keys.len();
        let threads_used = self.config.effective_threads();

        let completed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        let run_one = |index: usize, key: &PartitionKey| -> Outcome<T> {
            if let Some(callback) = self.callback() {
                callback.on_progress(&ProgressInfo {
                    current: key.to_string(),
                    current_index: index,
                    total,
                    completed: completed.load(Ordering::Relaxed),
                    skipped: skipped.load(Ordering::Relaxed),
                    elapsed: start.elapsed(),
                });
            }

            let job_start = Instant::now();
            match job(key) {
                Ok(value) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Processed {} in {:?}", key, job_start.elapsed());
                    Outcome::Done(PartitionResult {
                        key: key.clone(),
                        value,
                        elapsed: job_start.elapsed(),
                    })
                }
                Err(e) if e.is_recoverable() => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Skipping {}: {}", key, e);
                    Outcome::Skipped(SkippedPartition {
                        key: key.clone(),
                        reason: e.to_string(),
                    })
                }
                Err(e) => Outcome::Failed(e),
            }
        };

        let outcomes = self.run_all(keys, &run_one)?;

        let mut results = Vec::with_capacity(total);
        let mut skipped_list = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Done(r) => results.push(r),
                Outcome::Skipped(s) => skipped_list.push(s),
                Outcome::Failed(e) => return Err(e),
            }
        }

        let output = BatchOutput {
            results,
            skipped: skipped_list,
            elapsed: start.elapsed(),
            threads_used,
        };

        log::info!(
            "Batch finished: {} processed, {} skipped in {:?}",
            output.successful_count(),
            output.skipped_count(),
            output.elapsed
        );

        if let Some(callback) = self.callback() {
            callback.on_complete(&output.summary());
        }

        Ok(output)
    }

    fn callback(&self) -> Option<&Arc<dyn ProgressCallback>> {
        if self.config.report_progress {
            self.progress_callback.as_ref()
        } else {
            None
        }
    }

    #[cfg(feature = "parallel")]
    fn run_all<T, R>(&self, keys: &[PartitionKey], run_one: &R) -> Result<Vec<Outcome<T>>>
    where
        T: Send,
        R: Fn(usize, &PartitionKey) -> Outcome<T> + Sync,
    {
        // Local pool: build_global() can only run once per process.
        let mut pool_builder =
            rayon::ThreadPoolBuilder::new().num_threads(self.config.effective_threads());
        if let Some(stack_size) = self.config.stack_size {
            pool_builder = pool_builder.stack_size(stack_size);
        }
        let pool = pool_builder
            .build()
            .map_err(|e| ResponseError::config(format!("failed to create thread pool: {e}")))?;

        Ok(pool.install(|| {
            keys.par_iter()
                .enumerate()
                .map(|(index, key)| run_one(index, key))
                .collect()
        }))
    }

    #[cfg(not(feature = "parallel"))]
    fn run_all<T, R>(&self, keys: &[PartitionKey], run_one: &R) -> Result<Vec<Outcome<T>>>
    where
        T: Send,
        R: Fn(usize, &PartitionKey) -> Outcome<T> + Sync,
    {
        Ok(keys
            .iter()
            .enumerate()
            .map(|(index, key)| run_one(index, key))
            .collect())
    }
}
