use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Serialize, Deserialize};

use crate::data::{bar::Bar, storage::DataStorage};
use crate::error::{NetError, Result};

/// Which rescaling strategy a [`Normalizer`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationKind {
    /// Each bar rescaled into `[min_range, max_range]` from its own extremes.
    MinMax,
    /// Every bar centred and scaled by the close-price mean/std of the whole set.
    ZScore,
}

impl NormalizationKind {
    pub fn tag(&self) -> u8 {
        match self {
            NormalizationKind::MinMax => 0,
            NormalizationKind::ZScore => 1,
        }
    }

    pub fn from_tag(tag: i64) -> Result<NormalizationKind> {
        match tag {
            0 => Ok(NormalizationKind::MinMax),
            1 => Ok(NormalizationKind::ZScore),
            _ => Err(NetError::Config(format!("unknown normalization tag {}", tag))),
        }
    }
}

impl FromStr for NormalizationKind {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MinMax" => Ok(NormalizationKind::MinMax),
            "ZScore" => Ok(NormalizationKind::ZScore),
            _ => Err(NetError::Config(format!("unknown normalization '{}'", s))),
        }
    }
}

impl fmt::Display for NormalizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationKind::MinMax => f.write_str("MinMax"),
            NormalizationKind::ZScore => f.write_str("ZScore"),
        }
    }
}

/// Parameters of the active strategy, as persisted next to a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NormalizationState {
    MinMax { min_range: f64, max_range: f64 },
    ZScore { mean: f64, std: f64 },
}

impl NormalizationState {
    pub fn kind(&self) -> NormalizationKind {
        match self {
            NormalizationState::MinMax { .. } => NormalizationKind::MinMax,
            NormalizationState::ZScore { .. } => NormalizationKind::ZScore,
        }
    }

    /// The two strategy parameters in file order.
    pub fn params(&self) -> (f64, f64) {
        match *self {
            NormalizationState::MinMax { min_range, max_range } => (min_range, max_range),
            NormalizationState::ZScore { mean, std } => (mean, std),
        }
    }

    pub fn from_params(kind: NormalizationKind, a: f64, b: f64) -> NormalizationState {
        match kind {
            NormalizationKind::MinMax => NormalizationState::MinMax { min_range: a, max_range: b },
            NormalizationKind::ZScore => NormalizationState::ZScore { mean: a, std: b },
        }
    }
}

/// Rescales bars before they reach the network.
///
/// MinMax works bar by bar and needs no fitting. Z-Score is fitted once on the
/// close prices of a batch: the first normalization without a fit fits on that
/// batch, and the fit sticks until [`Normalizer::reset_fit`] or an explicit
/// [`Normalizer::set_mean_std`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    kind: NormalizationKind,
    min_range: f64,
    max_range: f64,
    mean: f64,
    std: f64,
    fitted: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(NormalizationKind::MinMax)
    }
}

impl Normalizer {
    pub fn new(kind: NormalizationKind) -> Normalizer {
        Normalizer {
            kind,
            min_range: 0.0,
            max_range: 1.0,
            mean: 0.0,
            std: 1.0,
            fitted: false,
        }
    }

    /// Restores a normalizer from persisted parameters. A Z-Score state counts
    /// as fitted.
    pub fn from_state(state: NormalizationState) -> Normalizer {
        let mut normalizer = Normalizer::new(state.kind());
        match state {
            NormalizationState::MinMax { min_range, max_range } => {
                normalizer.set_min_max_range(min_range, max_range)
            }
            NormalizationState::ZScore { mean, std } => normalizer.set_mean_std(mean, std),
        }
        normalizer
    }

    pub fn kind(&self) -> NormalizationKind {
        self.kind
    }

    /// Switches strategy; parameters of both strategies are retained.
    pub fn set_kind(&mut self, kind: NormalizationKind) {
        self.kind = kind;
    }

    pub fn state(&self) -> NormalizationState {
        match self.kind {
            NormalizationKind::MinMax => NormalizationState::MinMax {
                min_range: self.min_range,
                max_range: self.max_range,
            },
            NormalizationKind::ZScore => NormalizationState::ZScore { mean: self.mean, std: self.std },
        }
    }

    pub fn set_min_max_range(&mut self, min: f64, max: f64) {
        self.min_range = min;
        self.max_range = max;
    }

    pub fn min_max_range(&self) -> (f64, f64) {
        (self.min_range, self.max_range)
    }

    pub fn set_mean_std(&mut self, mean: f64, std: f64) {
        self.mean = mean;
        self.std = std;
        self.fitted = true;
    }

    pub fn mean_std(&self) -> (f64, f64) {
        (self.mean, self.std)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Forgets the Z-Score fit; the next normalization refits.
    pub fn reset_fit(&mut self) {
        self.fitted = false;
    }

    /// Fits mean and population standard deviation of `close`. An empty slice
    /// leaves the state untouched.
    pub fn fit(&mut self, bars: &[Bar]) {
        if bars.is_empty() {
            return;
        }
        let n = bars.len() as f64;
        let mean = bars.iter().map(|b| b.close).sum::<f64>() / n;
        let variance = bars.iter().map(|b| (b.close - mean).powi(2)).sum::<f64>() / n;

        self.mean = mean;
        self.std = variance.sqrt();
        self.fitted = true;
        debug!("z-score fitted on {} bars: mean={} std={}", bars.len(), self.mean, self.std);
    }

    /// Transforms one bar with the active strategy and current parameters.
    pub fn transform(&self, bar: &Bar) -> Bar {
        match self.kind {
            NormalizationKind::MinMax => self.transform_min_max(bar),
            NormalizationKind::ZScore => self.transform_z_score(bar),
        }
    }

    fn transform_min_max(&self, bar: &Bar) -> Bar {
        let min_val = bar.min_field();
        let max_val = bar.max_field();
        if min_val == max_val {
            return Bar::flat(self.min_range);
        }
        bar.map(|field| {
            self.min_range + (field - min_val) * (self.max_range - self.min_range) / (max_val - min_val)
        })
    }

    fn transform_z_score(&self, bar: &Bar) -> Bar {
        if self.std == 0.0 {
            return *bar;
        }
        bar.map(|field| (field - self.mean) / self.std)
    }

    fn ensure_fitted(&mut self, bars: &[Bar]) {
        if self.kind == NormalizationKind::ZScore && !self.fitted {
            self.fit(bars);
        }
    }

    /// Normalizes a batch, fitting Z-Score on it first if no fit exists yet.
    pub fn normalize_bars(&mut self, bars: &[Bar]) -> Vec<Bar> {
        self.ensure_fitted(bars);
        bars.iter().map(|bar| self.transform(bar)).collect()
    }

    /// Replaces the stored bars with their normalized form. Indicator series
    /// are left as they are.
    pub fn normalize_storage(&mut self, storage: &mut DataStorage) {
        let normalized = self.normalize_bars(storage.bars());
        storage.replace_bars(normalized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn closes(values: &[f64]) -> Vec<Bar> {
        values.iter().map(|&c| Bar::new(c, c, c + 1.0, c - 1.0)).collect()
    }

    #[test]
    fn min_max_scales_each_bar_on_its_own_range() {
        let mut normalizer = Normalizer::new(NormalizationKind::MinMax);
        let out = normalizer.normalize_bars(&[Bar::new(1.0, 2.0, 3.0, 0.0)]);
        assert_relative_eq!(out[0].open, 1.0 / 3.0);
        assert_relative_eq!(out[0].close, 2.0 / 3.0);
        assert_relative_eq!(out[0].high, 1.0);
        assert_relative_eq!(out[0].low, 0.0);
    }

    #[test]
    fn min_max_flat_bar_maps_to_min_range() {
        let mut normalizer = Normalizer::new(NormalizationKind::MinMax);
        normalizer.set_min_max_range(-1.0, 1.0);
        for value in [0.0, 7.5, -3.0] {
            assert_eq!(normalizer.transform(&Bar::flat(value)), Bar::flat(-1.0));
        }
    }

    #[test]
    fn min_max_output_stays_in_range() {
        let normalizer = {
            let mut n = Normalizer::new(NormalizationKind::MinMax);
            n.set_min_max_range(2.0, 5.0);
            n
        };
        let bars = [
            Bar::new(10.0, 12.0, 13.0, 9.0),
            Bar::new(-4.0, 3.0, 10.0, -6.0),
            Bar::new(0.5, 0.5, 0.75, 0.5),
        ];
        for bar in &bars {
            let out = normalizer.transform(bar);
            for field in out.to_array() {
                assert!((2.0..=5.0).contains(&field), "{} out of range", field);
            }
            assert_relative_eq!(out.min_field(), 2.0);
            assert_relative_eq!(out.max_field(), 5.0);
        }
    }

    #[test]
    fn min_max_is_idempotent_once_bar_spans_the_range() {
        let mut normalizer = Normalizer::new(NormalizationKind::MinMax);
        let once = normalizer.normalize_bars(&[Bar::new(4.0, 8.0, 10.0, 2.0)]);
        let twice = normalizer.normalize_bars(&once);
        for (a, b) in once[0].to_array().iter().zip(twice[0].to_array()) {
            assert_relative_eq!(*a, b);
        }
    }

    #[test]
    fn z_score_fit_uses_population_std_of_close() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);
        normalizer.fit(&closes(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let (mean, std) = normalizer.mean_std();
        assert_relative_eq!(mean, 3.0);
        assert_relative_eq!(std, 2.0_f64.sqrt());
    }

    #[test]
    fn z_score_scales_all_fields_by_close_statistics() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);
        normalizer.set_mean_std(10.0, 2.0);
        let out = normalizer.transform(&Bar::new(12.0, 10.0, 14.0, 6.0));
        assert_eq!(out, Bar::new(1.0, 0.0, 2.0, -2.0));
    }

    #[test]
    fn z_score_zero_std_returns_bar_unchanged() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);
        normalizer.fit(&closes(&[4.0, 4.0, 4.0]));
        assert_eq!(normalizer.mean_std().1, 0.0);

        let bar = Bar::new(3.0, 4.0, 9.0, 1.0);
        assert_eq!(normalizer.transform(&bar), bar);
    }

    #[test]
    fn z_score_empty_fit_is_a_no_op() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);
        normalizer.set_mean_std(5.0, 0.5);
        normalizer.fit(&[]);
        assert_eq!(normalizer.mean_std(), (5.0, 0.5));
    }

    #[test]
    fn z_score_fit_is_lazy_and_sticky() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);
        assert!(!normalizer.is_fitted());

        let first = normalizer.normalize_bars(&closes(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert!(normalizer.is_fitted());
        assert_relative_eq!(first[2].close, 0.0);

        // A second batch reuses the first fit.
        let second = normalizer.normalize_bars(&closes(&[100.0]));
        assert_relative_eq!(second[0].close, 97.0 / 2.0_f64.sqrt());

        normalizer.set_mean_std(0.0, 1.0);
        assert_eq!(normalizer.normalize_bars(&closes(&[7.0]))[0].close, 7.0);

        normalizer.reset_fit();
        normalizer.normalize_bars(&closes(&[2.0, 4.0]));
        assert_eq!(normalizer.mean_std(), (3.0, 1.0));
    }

    #[test]
    fn single_bar_fit_sticks_until_reset() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);

        // Fitting on one bar gives std 0, so bars pass through unchanged.
        let single = closes(&[10.0]);
        assert_eq!(normalizer.normalize_bars(&single), single);
        assert_eq!(normalizer.mean_std(), (10.0, 0.0));

        let batch = closes(&[1.0, 2.0, 3.0]);
        assert_eq!(normalizer.normalize_bars(&batch), batch);

        normalizer.reset_fit();
        assert_relative_eq!(normalizer.normalize_bars(&batch)[1].close, 0.0);
    }

    #[test]
    fn normalize_storage_replaces_bars_and_keeps_indicators() {
        let mut storage = DataStorage::from_bars(vec![Bar::new(1.0, 2.0, 3.0, 0.0), Bar::flat(9.0)]);
        storage.add_indicator("rsi", vec![50.0, 60.0]);

        let mut normalizer = Normalizer::default();
        normalizer.normalize_storage(&mut storage);

        assert_eq!(storage.len(), 2);
        assert_relative_eq!(storage.bars()[0].high, 1.0);
        assert_eq!(storage.bars()[1], Bar::flat(0.0));
        assert_eq!(storage.indicator("rsi").unwrap(), &[50.0, 60.0]);
    }

    #[test]
    fn kinds_parse_from_names_and_tags() {
        assert_eq!("MinMax".parse::<NormalizationKind>().unwrap(), NormalizationKind::MinMax);
        assert_eq!(NormalizationKind::from_tag(1).unwrap(), NormalizationKind::ZScore);
        assert!(matches!("Robust".parse::<NormalizationKind>(), Err(NetError::Config(_))));
        assert!(matches!(NormalizationKind::from_tag(2), Err(NetError::Config(_))));
    }

    #[test]
    fn state_round_trips_through_from_state() {
        let mut normalizer = Normalizer::new(NormalizationKind::ZScore);
        normalizer.set_mean_std(1.25, 0.5);
        let state = normalizer.state();
        assert_eq!(state.params(), (1.25, 0.5));

        let restored = Normalizer::from_state(state);
        assert!(restored.is_fitted());
        assert_eq!(restored.state(), state);

        let min_max = NormalizationState::from_params(NormalizationKind::MinMax, -1.0, 1.0);
        assert_eq!(Normalizer::from_state(min_max).min_max_range(), (-1.0, 1.0));
    }
}
