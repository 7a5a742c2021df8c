use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    data::bar::Bar,
    error::{NetError, Result},
    layers::dense::Layer,
    loss::mse::MseLoss,
    optim::momentum::Momentum,
    train::example::TrainingExample,
};

/// Input width the training loop is specialized to: open, close, high, low.
pub const OHLC_INPUTS: usize = 4;

/// Ordered stack of dense layers trained with online momentum SGD.
///
/// `num_inputs` tracks the first layer's input width once a layer exists and
/// `num_outputs` follows the last layer's output width.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    num_inputs: usize,
    num_outputs: usize,
    layers: Vec<Layer>,
    #[serde(skip)]
    momentum: Momentum,
}

impl Network {
    /// Creates an empty network with the declared widths.
    pub fn new(num_inputs: usize, num_outputs: usize) -> Network {
        Network {
            num_inputs,
            num_outputs,
            layers: Vec::new(),
            momentum: Momentum::new(),
        }
    }

    /// Appends a freshly initialized layer fed by the current last layer (or
    /// by the declared input width when the network is empty).
    pub fn add_layer(&mut self, num_outputs: usize, activation: ActivationFunction) -> Result<()> {
        let num_inputs = self.layers.last().map_or(self.num_inputs, Layer::output_size);
        let layer = Layer::new(num_inputs, num_outputs, activation)?;
        self.push_layer(layer)
    }

    /// Appends an existing layer. Fails without modifying the network when its
    /// input width differs from the previous layer's output width.
    pub fn push_layer(&mut self, layer: Layer) -> Result<()> {
        match self.layers.last() {
            Some(last) if last.output_size() != layer.input_size() => {
                return Err(NetError::shape("appended layer input", last.output_size(), layer.input_size()));
            }
            Some(_) => {}
            None => self.num_inputs = layer.input_size(),
        }
        self.num_outputs = layer.output_size();
        self.momentum.on_layer_added(&layer);
        self.layers.push(layer);
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to one layer; its widths cannot change through this.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if self.layers.is_empty() {
            return Err(NetError::EmptyNetwork);
        }
        if input.len() != self.num_inputs {
            return Err(NetError::shape("network input", self.num_inputs, input.len()));
        }
        Ok(())
    }

    /// Runs inference. Neither weights nor cached layer outputs are touched.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.compute(&current)?;
        }
        Ok(current)
    }

    /// Forward pass that caches every layer's output for backprop.
    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Trains on `examples` in order for `epochs` passes and returns the mean
    /// loss of the last epoch.
    ///
    /// The loop is specialized to OHLC regression: the network must declare 4
    /// inputs and 1 output. A violation fails this call only.
    pub fn train(&mut self, examples: &[TrainingExample], epochs: usize, learning_rate: f64) -> Result<f64> {
        if self.layers.is_empty() {
            return Err(NetError::EmptyNetwork);
        }
        if examples.is_empty() {
            return Err(NetError::MissingData("training set is empty".to_string()));
        }
        if self.num_inputs != OHLC_INPUTS {
            return Err(NetError::Config(format!(
                "training expects {} inputs (OHLC), network declares {}",
                OHLC_INPUTS, self.num_inputs
            )));
        }
        if self.num_outputs != 1 {
            return Err(NetError::Config(format!(
                "training expects a single output, network declares {}",
                self.num_outputs
            )));
        }

        self.momentum.ensure_allocated(&self.layers);

        let mut last_loss = 0.0;
        for epoch in 1..=epochs {
            let mut total_loss = 0.0;
            for example in examples {
                let output = self.forward(&example.input)?;
                total_loss += MseLoss::loss(&output, &example.target);
                self.backpropagate(&example.target, &output, &example.input)?;
                self.update_weights(learning_rate, &example.input)?;
            }
            last_loss = total_loss / examples.len() as f64;
            debug!("epoch {}/{}: loss = {:.6}", epoch, epochs, last_loss);
        }

        info!(
            "trained {} epochs on {} examples, final loss = {:.6}",
            epochs,
            examples.len(),
            last_loss
        );
        Ok(last_loss)
    }

    /// [`Network::train`] on examples built from bars (`[o, c, h, l]` → `[c]`).
    pub fn train_bars(&mut self, bars: &[Bar], epochs: usize, learning_rate: f64) -> Result<f64> {
        self.train(&TrainingExample::from_bars(bars), epochs, learning_rate)
    }

    /// Computes and stages every layer's deltas for one example.
    ///
    /// `output` must be the result of the forward pass on `input`. Hidden
    /// layers are re-forwarded from `input` (layer 0) or the previous layer's
    /// cached output so the derivative always sees this example's activations.
    pub(crate) fn backpropagate(&mut self, target: &[f64], output: &[f64], input: &[f64]) -> Result<()> {
        let last = self.layers.len().checked_sub(1).ok_or(NetError::EmptyNetwork)?;
        let out_width = self.layers[last].output_size();
        if target.len() != out_width {
            return Err(NetError::shape("backprop target", out_width, target.len()));
        }
        if output.len() != out_width {
            return Err(NetError::shape("backprop output", out_width, output.len()));
        }

        let mut deltas = vec![Vec::new(); self.layers.len()];

        let act = self.layers[last].activation();
        deltas[last] = MseLoss::error(output, target)
            .into_iter()
            .zip(output)
            .map(|(err, o)| err * act.derivative(*o))
            .collect();

        // Counts down from last - 1 to 0 inclusive.
        for step in 0..last {
            let i = last - 1 - step;
            let propagated = self.layers[i + 1].weights().transpose_mul_vec(&deltas[i + 1]);
            let prev_output = if i == 0 {
                input.to_vec()
            } else {
                self.layers[i - 1].output()?.to_vec()
            };
            let effective = self.layers[i].forward(&prev_output)?;
            let act = self.layers[i].activation();
            deltas[i] = propagated
                .iter()
                .zip(&effective)
                .map(|(sum, v)| sum * act.derivative(*v))
                .collect();
        }

        for (layer, delta) in self.layers.iter_mut().zip(deltas) {
            layer.set_deltas(delta);
        }
        Ok(())
    }

    /// Applies the staged deltas left to right with momentum.
    ///
    /// Each layer's input is the re-forwarded output of the layer before it,
    /// taken after that layer's own update.
    pub(crate) fn update_weights(&mut self, learning_rate: f64, input: &[f64]) -> Result<()> {
        self.check_input(input)?;
        self.momentum.ensure_allocated(&self.layers);

        let mut layer_input = input.to_vec();
        for (i, layer) in self.layers.iter_mut().enumerate() {
            self.momentum.step(i, layer, learning_rate, &layer_input);
            layer_input = layer.forward(&layer_input)?;
        }
        Ok(())
    }

    /// Momentum buffers carried between training calls.
    pub fn momentum(&self) -> &Momentum {
        &self.momentum
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let network: Network = serde_json::from_reader(reader)?;
        network.validate()?;
        Ok(network)
    }

    /// Re-checks every layer and the layer chain of a network built outside
    /// `push_layer`.
    fn validate(&self) -> Result<()> {
        for layer in &self.layers {
            layer.check_shape()?;
        }
        for pair in self.layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(NetError::shape("layer chain", pair[0].output_size(), pair[1].input_size()));
            }
        }
        if let (Some(first), Some(last)) = (self.layers.first(), self.layers.last()) {
            if first.input_size() != self.num_inputs {
                return Err(NetError::shape("network input", first.input_size(), self.num_inputs));
            }
            if last.output_size() != self.num_outputs {
                return Err(NetError::shape("network output", last.output_size(), self.num_outputs));
            }
        }
        Ok(())
    }
}
