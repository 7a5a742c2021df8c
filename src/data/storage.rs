use std::collections::BTreeMap;

use crate::data::bar::Bar;
use crate::error::{NetError, Result};

/// Ordered bars plus named indicator series, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct DataStorage {
    bars: Vec<Bar>,
    indicators: BTreeMap<String, Vec<f64>>,
}

impl DataStorage {
    pub fn new() -> DataStorage {
        DataStorage::default()
    }

    pub fn from_bars(bars: Vec<Bar>) -> DataStorage {
        DataStorage { bars, indicators: BTreeMap::new() }
    }

    pub fn add_bar(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    pub fn add_ohlc(&mut self, open: f64, close: f64, high: f64, low: f64) {
        self.bars.push(Bar::new(open, close, high, low));
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Result<Bar> {
        self.bars.get(index).copied().ok_or_else(|| {
            NetError::MissingData(format!("bar index {} out of range ({} bars)", index, self.bars.len()))
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Drops every bar and every indicator series.
    pub fn clear(&mut self) {
        self.bars.clear();
        self.indicators.clear();
    }

    /// Swaps in a new bar sequence; indicator series are kept.
    pub fn replace_bars(&mut self, bars: Vec<Bar>) {
        self.bars = bars;
    }

    /// Inserts or overwrites the series stored under `name`.
    pub fn add_indicator(&mut self, name: impl Into<String>, series: Vec<f64>) {
        self.indicators.insert(name.into(), series);
    }

    pub fn indicator(&self, name: &str) -> Result<&[f64]> {
        self.indicators
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| NetError::MissingData(format!("indicator not found: {}", name)))
    }

    pub fn indicators(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.indicators
    }

    pub fn has_indicator(&self, name: &str) -> bool {
        self.indicators.contains_key(name)
    }

    pub fn remove_indicator(&mut self, name: &str) -> Option<Vec<f64>> {
        self.indicators.remove(name)
    }

    pub fn indicator_count(&self) -> usize {
        self.indicators.len()
    }
}
