//! HistData ASCII tick files.
//!
//! # Layout
//!
//! ```text
//! <root>/<instrument>/<period>/<partition>.csv
//! ```
//!
//! # Row Format
//!
//! ```text
//! 20190107 170000123,1.14410,1.14430,0
//! YYYYMMDD HHMMSSfff,bid,ask[,volume]
//! ```
//!
//! Timestamps are Eastern Standard Time all year round (UTC-5, no daylight
//! saving) with millisecond precision; they are converted to UTC. The volume
//! column is always zero in these files and is ignored.

use super::PartitionSource;
use crate::error::{PartitionKey, ResponseError, Result};
use crate::series::{QuoteSeries, QuoteTick};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// Offset of HistData file times from UTC, in seconds west.
const EST_OFFSET_SECS: i32 = 5 * 3600;

/// Quote source over a directory of HistData CSV files.
#[derive(Debug, Clone)]
pub struct HistDataSource {
    root: PathBuf,
}

impl HistDataSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding one partition.
    pub fn partition_path(&self, key: &PartitionKey) -> PathBuf {
        self.root
            .join(&key.instrument)
            .join(&key.period)
            .join(format!("{}.csv", key.partition))
    }
}

impl PartitionSource for HistDataSource {
    fn list_partitions(&self, instrument: &str, period: &str) -> Result<Vec<String>> {
        let dir = self.root.join(instrument).join(period);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("No data directory {}", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut partitions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                partitions.push(stem.to_string());
            }
        }
        partitions.sort();
        Ok(partitions)
    }

    fn get_quotes(&self, key: &PartitionKey) -> Result<QuoteSeries> {
        let path = self.partition_path(key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ResponseError::missing_partition(
                    key,
                    format!("{} not found", path.display()),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let mut ticks = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let tick = parse_tick_line(line).map_err(|e| {
                ResponseError::Parse(format!("{}:{}: {}", path.display(), line_no + 1, e))
            })?;
            ticks.push(tick);
        }

        log::debug!("Loaded {} quotes for {}", ticks.len(), key);

        if ticks.is_empty() {
            return Err(ResponseError::missing_partition(key, "file has no quotes"));
        }
        QuoteSeries::new(ticks)
    }
}

/// Parse one `YYYYMMDD HHMMSSfff,bid,ask[,volume]` row.
pub fn parse_tick_line(line: &str) -> std::result::Result<QuoteTick, String> {
    let mut fields = line.split(',');
    let stamp = fields.next().ok_or("missing timestamp")?;
    let bid = parse_price(fields.next(), "bid")?;
    let ask = parse_price(fields.next(), "ask")?;

    let timestamp_ns = parse_timestamp(stamp.trim())?;
    Ok(QuoteTick::new(timestamp_ns, bid, ask))
}

fn parse_price(field: Option<&str>, name: &str) -> std::result::Result<f64, String> {
    let field = field.ok_or_else(|| format!("missing {name}"))?;
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad {name} '{field}': {e}"))
}

/// `YYYYMMDD HHMMSSfff` (EST) → nanoseconds since the Unix epoch.
fn parse_timestamp(stamp: &str) -> std::result::Result<u64, String> {
    let bad = || format!("bad timestamp '{stamp}'");

    let (date, time) = stamp.split_once(' ').ok_or_else(bad)?;
    if date.len() != 8 || time.len() != 9 || !date.is_ascii() || !time.is_ascii() {
        return Err(bad());
    }

    let num = |s: &str| s.parse::<u32>().map_err(|_| bad());
    let year = date[0..4].parse::<i32>().map_err(|_| bad())?;

    let datetime: NaiveDateTime = NaiveDate::from_ymd_opt(year, num(&date[4..6])?, num(&date[6..8])?)
        .and_then(|d| {
            d.and_hms_milli_opt(
                num(&time[0..2]).ok()?,
                num(&time[2..4]).ok()?,
                num(&time[4..6]).ok()?,
                num(&time[6..9]).ok()?,
            )
        })
        .ok_or_else(bad)?;

    let est = FixedOffset::west_opt(EST_OFFSET_SECS).ok_or_else(bad)?;
    datetime
        .and_local_timezone(est)
        .single()
        .ok_or_else(bad)?
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .ok_or_else(bad)
}
