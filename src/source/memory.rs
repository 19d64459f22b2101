//! In-memory partition source.

use super::PartitionSource;
use crate::error::{PartitionKey, ResponseError, Result};
use crate::series::{PriceSeries, QuoteSeries};
use ahash::AHashMap;

/// Partition data held in memory.
///
/// Partitions can be registered either as quotes or directly as midpoint
/// price series. Price-only partitions have no quotes, so
/// [`get_quotes`](PartitionSource::get_quotes) reports them as missing.
#[derive(Debug, Default)]
pub struct MemorySource {
    quotes: AHashMap<PartitionKey, QuoteSeries>,
    prices: AHashMap<PartitionKey, PriceSeries>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_quotes(&mut self, key: PartitionKey, quotes: QuoteSeries) {
        self.quotes.insert(key, quotes);
    }

    pub fn insert_prices(&mut self, key: PartitionKey, prices: PriceSeries) {
        self.prices.insert(key, prices);
    }

    pub fn with_quotes(mut self, key: PartitionKey, quotes: QuoteSeries) -> Self {
        self.insert_quotes(key, quotes);
        self
    }

    pub fn with_prices(mut self, key: PartitionKey, prices: PriceSeries) -> Self {
        self.insert_prices(key, prices);
        self
    }

    pub fn len(&self) -> usize {
        self.list_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty() && self.prices.is_empty()
    }

    fn list_keys(&self) -> Vec<&PartitionKey> {
        let mut keys: Vec<&PartitionKey> = self.quotes.keys().chain(self.prices.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl PartitionSource for MemorySource {
    fn list_partitions(&self, instrument: &str, period: &str) -> Result<Vec<String>> {
        Ok(self
            .list_keys()
            .into_iter()
            .filter(|k| k.instrument == instrument && k.period == period)
            .map(|k| k.partition.clone())
            .collect())
    }

    fn get_quotes(&self, key: &PartitionKey) -> Result<QuoteSeries> {
        self.quotes
            .get(key)
            .cloned()
            .ok_or_else(|| ResponseError::missing_partition(key, "no quotes in memory"))
    }

    fn get_price_series(&self, key: &PartitionKey) -> Result<PriceSeries> {
        if let Some(prices) = self.prices.get(key) {
            return Ok(prices.clone());
        }
        self.get_quotes(key)?.midpoint_series()
    }
}
