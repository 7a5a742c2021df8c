use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    math::matrix::Matrix,
};

/// One fully connected layer: `output = activation(W·input + b)`.
///
/// The input/output widths are fixed at construction. The last forward
/// output and the staged deltas belong to the training loop and are not
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    num_inputs: usize,
    num_outputs: usize,
    weights: Matrix,
    biases: Vec<f64>,
    activation: ActivationFunction,
    #[serde(skip)]
    output: Option<Vec<f64>>,
    #[serde(skip)]
    deltas: Vec<f64>,
}

impl Layer {
    /// Creates a layer with fan-in scaled random weights and zero biases.
    pub fn new(num_inputs: usize, num_outputs: usize, activation: ActivationFunction) -> Result<Layer> {
        if num_inputs == 0 {
            return Err(NetError::shape("layer input width", 1, 0));
        }
        if num_outputs == 0 {
            return Err(NetError::shape("layer output width", 1, 0));
        }

        Ok(Layer {
            num_inputs,
            num_outputs,
            weights: Matrix::xavier(num_outputs, num_inputs),
            biases: vec![0.0; num_outputs],
            activation,
            output: None,
            deltas: Vec::new(),
        })
    }

    /// Creates a layer from explicit parameters; `weights` is `outputs × inputs`.
    pub fn with_params(weights: Vec<Vec<f64>>, biases: Vec<f64>, activation: ActivationFunction) -> Result<Layer> {
        let num_outputs = weights.len();
        let num_inputs = weights.first().map_or(0, Vec::len);
        let mut layer = Layer::new(num_inputs, num_outputs, activation)?;
        layer.set_weights(weights)?;
        layer.set_biases(biases)?;
        Ok(layer)
    }

    /// Applies the layer without touching the cached output.
    pub fn compute(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.num_inputs {
            return Err(NetError::shape("layer forward", self.num_inputs, input.len()));
        }
        let output = self.weights.mul_vec(input)
            .into_iter()
            .zip(&self.biases)
            .map(|(z, b)| self.activation.function(z + b))
            .collect();
        Ok(output)
    }

    /// Applies the layer and caches the result for [`Layer::output`].
    pub fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        let output = self.compute(input)?;
        self.output = Some(output.clone());
        Ok(output)
    }

    /// Output of the most recent [`Layer::forward`] call.
    pub fn output(&self) -> Result<&[f64]> {
        self.output
            .as_deref()
            .ok_or(NetError::State("layer output read before any forward pass"))
    }

    pub fn set_weights(&mut self, weights: Vec<Vec<f64>>) -> Result<()> {
        self.weights = Matrix::from_rows(self.num_outputs, self.num_inputs, weights)?;
        Ok(())
    }

    pub fn set_biases(&mut self, biases: Vec<f64>) -> Result<()> {
        if biases.len() != self.num_outputs {
            return Err(NetError::shape("layer biases", self.num_outputs, biases.len()));
        }
        self.biases = biases;
        Ok(())
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn input_size(&self) -> usize {
        self.num_inputs
    }

    pub fn output_size(&self) -> usize {
        self.num_outputs
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Checks the parameters against the declared widths, for layers that
    /// bypassed the constructors (deserialized snapshots).
    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.num_inputs == 0 {
            return Err(NetError::shape("layer input width", 1, 0));
        }
        if self.num_outputs == 0 {
            return Err(NetError::shape("layer output width", 1, 0));
        }
        if self.weights.rows != self.num_outputs {
            return Err(NetError::shape("layer weight rows", self.num_outputs, self.weights.rows));
        }
        if self.weights.cols != self.num_inputs {
            return Err(NetError::shape("layer weight columns", self.num_inputs, self.weights.cols));
        }
        if self.weights.data.len() != self.num_outputs {
            return Err(NetError::shape("layer weight rows", self.num_outputs, self.weights.data.len()));
        }
        if let Some(row) = self.weights.data.iter().find(|row| row.len() != self.num_inputs) {
            return Err(NetError::shape("layer weight columns", self.num_inputs, row.len()));
        }
        if self.biases.len() != self.num_outputs {
            return Err(NetError::shape("layer biases", self.num_outputs, self.biases.len()));
        }
        Ok(())
    }

    pub(crate) fn set_deltas(&mut self, deltas: Vec<f64>) {
        self.deltas = deltas;
    }

    pub(crate) fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    /// Mutable view of the parameters for the weight update step.
    pub(crate) fn params_mut(&mut self) -> (&mut Matrix, &mut Vec<f64>) {
        (&mut self.weights, &mut self.biases)
    }
}
