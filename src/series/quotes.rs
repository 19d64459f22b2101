//! Bid/ask quote ticks and midpoint extraction.

use super::PriceSeries;
use crate::error::{ResponseError, Result};
use crate::spread::SpreadMeasure;
use crate::validation::QuoteValidator;

/// One top-of-book quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteTick {
    /// Nanoseconds since the Unix epoch
    pub timestamp_ns: u64,
    pub bid: f64,
    pub ask: f64,
}

impl QuoteTick {
    pub fn new(timestamp_ns: u64, bid: f64, ask: f64) -> Self {
        Self {
            timestamp_ns,
            bid,
            ask,
        }
    }

    /// `(bid + ask) / 2`
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// `ask - bid`, in price units.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Spread relative to the midpoint, in basis points.
    #[inline]
    pub fn relative_spread_bps(&self) -> f64 {
        let mid = self.midpoint();
        if mid > 0.0 {
            self.spread() / mid * 10_000.0
        } else {
            f64::NAN
        }
    }

    /// Spread in the requested unit.
    pub fn spread_in(&self, measure: SpreadMeasure) -> f64 {
        match measure {
            SpreadMeasure::Absolute => self.spread(),
            SpreadMeasure::BasisPoints => self.relative_spread_bps(),
        }
    }
}

/// Ordered quote ticks for one partition.
#[derive(Debug, Clone, Default)]
pub struct QuoteSeries {
    ticks: Vec<QuoteTick>,
}

impl QuoteSeries {
    /// Build a series. Ticks must be in non-decreasing time order.
    ///
    /// Quote-quality issues (crossed or locked books, very wide spreads) are
    /// logged but do not reject the series.
    pub fn new(ticks: Vec<QuoteTick>) -> Result<Self> {
        if let Some(i) = (1..ticks.len()).find(|&i| ticks[i].timestamp_ns < ticks[i - 1].timestamp_ns)
        {
            return Err(ResponseError::invariant(format!(
                "quote timestamps out of order at index {i}"
            )));
        }

        if !ticks.is_empty() {
            let report = QuoteValidator::new().validate_quotes(&ticks);
            for warning in report.warnings() {
                log::warn!("{warning}");
            }
        }

        Ok(Self { ticks })
    }

    pub fn ticks(&self) -> &[QuoteTick] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Midpoint price series, one point per tick.
    pub fn midpoint_series(&self) -> Result<PriceSeries> {
        let timestamps = self.ticks.iter().map(|t| t.timestamp_ns).collect();
        let prices = self.ticks.iter().map(QuoteTick::midpoint).collect();
        PriceSeries::new(timestamps, prices)
    }

    /// Mean spread over all ticks, ignoring non-finite values.
    ///
    /// Returns `None` when there are no usable ticks.
    pub fn mean_spread(&self, measure: SpreadMeasure) -> Option<f64> {
        let (sum, n) = self
            .ticks
            .iter()
            .map(|t| t.spread_in(measure))
            .filter(|s| s.is_finite())
            .fold((0.0, 0usize), |(sum, n), s| (sum + s, n + 1));

        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }
}
