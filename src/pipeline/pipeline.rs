use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{
    data::{bar::Bar, storage::DataStorage},
    error::{NetError, Result},
    network::network::{Network, OHLC_INPUTS},
    normalization::normalizer::Normalizer,
    train::{example::TrainingExample, train_config::TrainConfig},
};

/// Whether [`Pipeline::process`] trains or predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Training,
    #[default]
    Inference,
}

/// Wires bars and indicators through the normalizer into the network.
pub struct Pipeline<'a> {
    network: &'a mut Network,
    normalizer: &'a mut Normalizer,
    mode: Mode,
    config: TrainConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(network: &'a mut Network, normalizer: &'a mut Normalizer) -> Self {
        Pipeline {
            network,
            normalizer,
            mode: Mode::default(),
            config: TrainConfig::default(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_config(mut self, config: TrainConfig) -> Self {
        self.config = config;
        self
    }

    /// Trains on the whole batch (returning an empty vector) or predicts one
    /// value per bar, depending on the mode.
    pub fn process(
        &mut self,
        bars: &[Bar],
        indicators: &BTreeMap<String, Vec<f64>>,
        use_indicators: bool,
    ) -> Result<Vec<f64>> {
        match self.mode {
            Mode::Training => {
                self.train(bars, indicators, use_indicators)?;
                Ok(Vec::new())
            }
            Mode::Inference => self.predict(bars, indicators, use_indicators),
        }
    }

    fn train(&mut self, bars: &[Bar], indicators: &BTreeMap<String, Vec<f64>>, use_indicators: bool) -> Result<()> {
        let mut storage = DataStorage::from_bars(bars.to_vec());
        if use_indicators {
            // Short series are zero-filled up to the batch length.
            for (name, series) in indicators {
                let mut series = series.clone();
                if series.len() < bars.len() {
                    series.resize(bars.len(), 0.0);
                }
                storage.add_indicator(name.clone(), series);
            }
        }

        self.normalizer.normalize_storage(&mut storage);

        if self.network.num_inputs() != OHLC_INPUTS && storage.indicator_count() > 0 {
            return Err(NetError::Config(format!(
                "network declares {} inputs but training only feeds OHLC; {} indicator series ignored",
                self.network.num_inputs(),
                storage.indicator_count()
            )));
        }
        if storage.indicator_count() > 0 {
            warn!("training uses OHLC inputs only; {} indicator series not fed", storage.indicator_count());
        }

        let examples = TrainingExample::from_bars(storage.bars());
        self.network.train(&examples, self.config.epochs, self.config.learning_rate)?;
        Ok(())
    }

    fn predict(&mut self, bars: &[Bar], indicators: &BTreeMap<String, Vec<f64>>, use_indicators: bool) -> Result<Vec<f64>> {
        let mut result = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let mut single = DataStorage::from_bars(vec![*bar]);
            if use_indicators {
                // A series shorter than the bar sequence leaves this bar's
                // slice empty, which input-vector construction rejects.
                for (name, series) in indicators {
                    single.add_indicator(name.clone(), series.get(i).copied().into_iter().collect());
                }
            }

            self.normalizer.normalize_storage(&mut single);
            let input = create_input_vector(&single.bar(0)?, single.indicators(), use_indicators)?;
            if input.len() != self.network.num_inputs() {
                return Err(NetError::shape("input vector", self.network.num_inputs(), input.len()));
            }

            let output = self.network.predict(&input)?;
            let value = output.first().copied().ok_or(NetError::EmptyNetwork)?;
            result.push(value);
        }

        debug!("predicted {} bars", result.len());
        Ok(result)
    }
}

/// `[open, close, high, low]` followed, when requested, by the first value of
/// each indicator series in name order.
pub fn create_input_vector(
    bar: &Bar,
    indicators: &BTreeMap<String, Vec<f64>>,
    use_indicators: bool,
) -> Result<Vec<f64>> {
    let mut input = bar.to_array().to_vec();
    if use_indicators {
        for (name, series) in indicators {
            let value = series
                .first()
                .ok_or_else(|| NetError::MissingData(format!("indicator '{}' has no value", name)))?;
            input.push(*value);
        }
    }
    Ok(input)
}
