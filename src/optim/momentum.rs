use crate::{layers::dense::Layer, math::matrix::Matrix};

/// Fixed classical-momentum coefficient.
pub const MOMENTUM: f64 = 0.9;

/// Previous weight/bias updates per layer, shaped like each layer's params.
///
/// Buffers are allocated lazily on the first training step and then persist
/// across examples and epochs.
#[derive(Debug, Clone, Default)]
pub struct Momentum {
    weights: Vec<Matrix>,
    biases: Vec<Vec<f64>>,
}

impl Momentum {
    pub fn new() -> Momentum {
        Momentum::default()
    }

    pub fn is_allocated(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Allocates zeroed buffers for every layer, once.
    pub fn ensure_allocated(&mut self, layers: &[Layer]) {
        if self.is_allocated() {
            return;
        }
        for layer in layers {
            self.push_layer(layer);
        }
    }

    /// Extends already-allocated buffers for a newly appended layer.
    pub fn on_layer_added(&mut self, layer: &Layer) {
        if self.is_allocated() {
            self.push_layer(layer);
        }
    }

    fn push_layer(&mut self, layer: &Layer) {
        self.weights.push(Matrix::zeros(layer.output_size(), layer.input_size()));
        self.biases.push(vec![0.0; layer.output_size()]);
    }

    /// Applies one momentum step to layer `index` using its staged deltas.
    ///
    /// `dw[j][k] = lr·δ[j]·input[k] + μ·dw_prev[j][k]`; biases drop the input factor.
    pub fn step(&mut self, index: usize, layer: &mut Layer, learning_rate: f64, layer_input: &[f64]) {
        let deltas = layer.deltas().to_vec();
        let prev_w = &mut self.weights[index];
        let prev_b = &mut self.biases[index];
        let (weights, biases) = layer.params_mut();

        for (j, delta) in deltas.iter().enumerate() {
            for (k, x) in layer_input.iter().enumerate() {
                let update = learning_rate * delta * x + MOMENTUM * prev_w.data[j][k];
                weights.data[j][k] += update;
                prev_w.data[j][k] = update;
            }

            let update = learning_rate * delta + MOMENTUM * prev_b[j];
            biases[j] += update;
            prev_b[j] = update;
        }
    }

    pub fn weight_updates(&self, index: usize) -> Option<&Matrix> {
        self.weights.get(index)
    }

    pub fn bias_updates(&self, index: usize) -> Option<&[f64]> {
        self.biases.get(index).map(Vec::as_slice)
    }
}
