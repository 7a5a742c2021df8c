use std::collections::BTreeMap;
use std::path::Path;

use log::{error, info};

use crate::{
    activation::activation::ActivationFunction,
    context::model_file::{load_model_file, save_model_file},
    data::bar::Bar,
    error::{NetError, Result},
    network::network::Network,
    normalization::normalizer::{NormalizationKind, Normalizer},
    pipeline::pipeline::{Mode, Pipeline},
    train::train_config::TrainConfig,
};

pub const DEFAULT_MODEL_VERSION: &str = "1.0";

/// Owns the active network, its normalizer and the model version for a host.
///
/// Every boundary call reports failure as `false` or an empty vector after
/// logging the cause; the `try_*` variants return the error instead. Callers
/// sharing one context across threads must serialize access themselves.
#[derive(Debug, Clone)]
pub struct ModelContext {
    network: Option<Network>,
    normalizer: Option<Normalizer>,
    model_version: String,
    train_config: TrainConfig,
}

impl Default for ModelContext {
    fn default() -> Self {
        ModelContext::new()
    }
}

impl ModelContext {
    pub fn new() -> ModelContext {
        ModelContext {
            network: None,
            normalizer: None,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            train_config: TrainConfig::default(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.network.is_some() && self.normalizer.is_some()
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    pub fn normalizer(&self) -> Option<&Normalizer> {
        self.normalizer.as_ref()
    }

    pub fn normalizer_mut(&mut self) -> Option<&mut Normalizer> {
        self.normalizer.as_mut()
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn train_config(&self) -> TrainConfig {
        self.train_config
    }

    pub fn set_train_config(&mut self, config: TrainConfig) {
        self.train_config = config;
    }

    /// Replaces the network and normalizer with fresh ones.
    pub fn set_network_parameters(
        &mut self,
        num_inputs: usize,
        num_outputs: usize,
        normalization: &str,
        model_version: &str,
    ) -> bool {
        report("setting network parameters", self.try_set_network_parameters(num_inputs, num_outputs, normalization, model_version))
            .is_some()
    }

    pub fn try_set_network_parameters(
        &mut self,
        num_inputs: usize,
        num_outputs: usize,
        normalization: &str,
        model_version: &str,
    ) -> Result<()> {
        let kind: NormalizationKind = normalization.parse()?;
        if model_version.contains('\n') {
            return Err(NetError::Config("model version must be a single line".to_string()));
        }

        self.network = Some(Network::new(num_inputs, num_outputs));
        self.normalizer = Some(Normalizer::new(kind));
        self.model_version = model_version.to_string();
        info!("configured network {} -> {} with {} normalization, version {}", num_inputs, num_outputs, kind, model_version);
        Ok(())
    }

    /// Appends a layer of `num_outputs` neurons with the named activation.
    pub fn add_layer(&mut self, num_outputs: usize, activation: &str) -> bool {
        report("adding layer", self.try_add_layer(num_outputs, activation)).is_some()
    }

    pub fn try_add_layer(&mut self, num_outputs: usize, activation: &str) -> Result<()> {
        let activation: ActivationFunction = activation.parse()?;
        let network = self.network.as_mut().ok_or(NetError::State("network not initialized"))?;
        network.add_layer(num_outputs, activation)
    }

    /// Trains on `bars` (returning an empty vector) or predicts one value per
    /// bar. Any failure yields an empty vector.
    pub fn process_data(
        &mut self,
        bars: &[Bar],
        indicators: &BTreeMap<String, Vec<f64>>,
        use_indicators: bool,
        is_training: bool,
    ) -> Vec<f64> {
        report("processing data", self.try_process_data(bars, indicators, use_indicators, is_training))
            .unwrap_or_default()
    }

    pub fn try_process_data(
        &mut self,
        bars: &[Bar],
        indicators: &BTreeMap<String, Vec<f64>>,
        use_indicators: bool,
        is_training: bool,
    ) -> Result<Vec<f64>> {
        let (network, normalizer) = match (self.network.as_mut(), self.normalizer.as_mut()) {
            (Some(network), Some(normalizer)) => (network, normalizer),
            _ => return Err(NetError::State("network not initialized")),
        };
        let mode = if is_training { Mode::Training } else { Mode::Inference };

        Pipeline::new(network, normalizer)
            .with_mode(mode)
            .with_config(self.train_config)
            .process(bars, indicators, use_indicators)
    }

    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> bool {
        report("saving model", self.try_save_model(path)).is_some()
    }

    pub fn try_save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (network, normalizer) = match (self.network.as_ref(), self.normalizer.as_ref()) {
            (Some(network), Some(normalizer)) => (network, normalizer),
            _ => return Err(NetError::State("network not initialized")),
        };
        save_model_file(&path, &self.model_version, &normalizer.state(), network)?;
        info!("saved model version {} to {}", self.model_version, path.as_ref().display());
        Ok(())
    }

    /// Replaces version, normalizer and network with the file's contents. On
    /// failure the context is left as it was.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> bool {
        report("loading model", self.try_load_model(path)).is_some()
    }

    pub fn try_load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = load_model_file(&path)?;
        self.model_version = file.version;
        self.normalizer = Some(Normalizer::from_state(file.normalization));
        self.network = Some(file.network);
        info!("loaded model version {} from {}", self.model_version, path.as_ref().display());
        Ok(())
    }
}

/// Logs an error and turns the result into an `Option`.
fn report<T>(action: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!("error {}: {}", action, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn configured() -> ModelContext {
        let mut context = ModelContext::new();
        assert!(context.set_network_parameters(4, 1, "MinMax", "1.0"));
        assert!(context.add_layer(3, "ReLU"));
        assert!(context.add_layer(1, "Linear"));
        context
    }

    #[test]
    fn uninitialized_context_degrades_to_failure() {
        let mut context = ModelContext::new();
        assert!(!context.is_initialized());
        assert!(!context.add_layer(3, "ReLU"));
        assert!(context.process_data(&[Bar::flat(1.0)], &BTreeMap::new(), false, false).is_empty());
        assert!(!context.save_model("/tmp/never-written.model"));
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let mut context = ModelContext::new();
        assert!(!context.set_network_parameters(4, 1, "Robust", "1.0"));
        assert!(!context.is_initialized());

        let mut context = configured();
        assert!(!context.add_layer(2, "Softmax"));
        assert_eq!(context.network().unwrap().layers().len(), 2);
    }

    #[test]
    fn multi_line_version_is_rejected() {
        let mut context = ModelContext::new();
        assert!(matches!(
            context.try_set_network_parameters(4, 1, "ZScore", "1.0\n2"),
            Err(NetError::Config(_))
        ));
    }

    #[test]
    fn predicts_one_value_per_bar() {
        let mut context = configured();
        let bars = [Bar::new(1.0, 2.0, 3.0, 0.0), Bar::new(3.0, 2.0, 4.0, 1.0)];
        let out = context.process_data(&bars, &BTreeMap::new(), false, false);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn training_failure_returns_empty_and_keeps_network() {
        let mut context = ModelContext::new();
        assert!(context.set_network_parameters(5, 1, "MinMax", "1.0"));
        assert!(context.add_layer(1, "Linear"));
        assert!(context.try_process_data(&[Bar::flat(1.0)], &BTreeMap::new(), false, true).is_err());
        assert!(context.process_data(&[Bar::flat(1.0)], &BTreeMap::new(), false, true).is_empty());
        assert_eq!(context.network().unwrap().layers().len(), 1);
    }

    #[test]
    fn save_then_load_restores_model_and_normalizer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ohlc.model");

        let mut context = ModelContext::new();
        assert!(context.set_network_parameters(4, 1, "ZScore", "2024.06"));
        assert!(context.add_layer(2, "Tanh"));
        assert!(context.add_layer(1, "Linear"));
        let bars = [
            Bar::new(10.0, 11.0, 12.0, 9.0),
            Bar::new(11.0, 12.0, 13.0, 10.0),
            Bar::new(12.0, 13.0, 14.0, 11.0),
        ];
        assert!(context.try_process_data(&bars, &BTreeMap::new(), false, true).unwrap().is_empty());
        let before = context.process_data(&bars, &BTreeMap::new(), false, false);
        assert!(context.save_model(&path));

        let mut restored = ModelContext::new();
        assert!(restored.load_model(&path));
        assert_eq!(restored.model_version(), "2024.06");

        let (mean, std) = restored.normalizer().unwrap().mean_std();
        assert_relative_eq!(mean, 12.0);
        assert_relative_eq!(std, (2.0f64 / 3.0).sqrt());

        let after = restored.process_data(&bars, &BTreeMap::new(), false, false);
        assert_eq!(after, before);
    }

    #[test]
    fn failed_load_leaves_context_untouched() {
        let mut context = configured();
        assert!(!context.load_model("/nonexistent/dir/model.txt"));
        assert_eq!(context.model_version(), "1.0");
        assert_eq!(context.network().unwrap().layers().len(), 2);
    }
}
