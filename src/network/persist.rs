//! Whitespace-delimited text model format.
//!
//! ```text
//! numInputs numOutputs
//! inputWidth outputWidth activationTag   # repeated per layer
//! w00 w01 ...                            # outputWidth rows
//! b0 b1 ...
//! ```
//!
//! Floats are written in shortest round-trip form, so a reload is bit-exact.

use std::io::{Read, Write};
use std::str::{FromStr, SplitWhitespace};

use log::debug;

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    layers::dense::Layer,
    network::network::Network,
};

/// Cursor over the whitespace-separated tokens of a model file.
pub(crate) struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(text: &'a str) -> Tokens<'a> {
        Tokens { iter: text.split_whitespace() }
    }

    pub(crate) fn next_token(&mut self) -> Option<&'a str> {
        self.iter.next()
    }

    /// Parses the next token, failing on end of input.
    pub(crate) fn expect<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self
            .next_token()
            .ok_or_else(|| NetError::Format(format!("unexpected end of input reading {}", what)))?;
        parse_token(token, what)
    }
}

fn parse_token<T: FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| NetError::Format(format!("invalid {} '{}'", what, token)))
}

fn join(values: &[f64]) -> String {
    values.iter().map(f64::to_string).collect::<Vec<_>>().join(" ")
}

impl Network {
    /// Writes the network in the text model format.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{} {}", self.num_inputs(), self.num_outputs())?;
        for layer in self.layers() {
            writeln!(
                writer,
                "{} {} {}",
                layer.input_size(),
                layer.output_size(),
                layer.activation().tag()
            )?;
            for row in &layer.weights().data {
                writeln!(writer, "{}", join(row))?;
            }
            writeln!(writer, "{}", join(layer.biases()))?;
        }
        Ok(())
    }

    /// Reads a network written by [`Network::save`]. Momentum state starts empty.
    pub fn load<R: Read>(reader: &mut R) -> Result<Network> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Network::from_tokens(&mut Tokens::new(&text))
    }

    /// Replaces this network's layers with the ones read from `reader`.
    pub fn load_into<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        *self = Network::load(reader)?;
        Ok(())
    }

    /// Consumes the header and then layers until the tokens run out at a
    /// layer boundary.
    pub(crate) fn from_tokens(tokens: &mut Tokens<'_>) -> Result<Network> {
        let num_inputs = tokens.expect("network input width")?;
        let num_outputs = tokens.expect("network output width")?;

        let mut network = Network::new(num_inputs, num_outputs);

        while let Some(token) = tokens.next_token() {
            let layer_inputs: usize = parse_token(token, "layer input width")?;
            let layer_outputs: usize = tokens.expect("layer output width")?;
            if layer_inputs == 0 {
                return Err(NetError::shape("layer input width", 1, 0));
            }
            if layer_outputs == 0 {
                return Err(NetError::shape("layer output width", 1, 0));
            }
            let activation = ActivationFunction::from_tag(tokens.expect("activation tag")?)?;

            let mut weights = Vec::new();
            for _ in 0..layer_outputs {
                let row = (0..layer_inputs)
                    .map(|_| tokens.expect("weight"))
                    .collect::<Result<Vec<f64>>>()?;
                weights.push(row);
            }
            let biases = (0..layer_outputs)
                .map(|_| tokens.expect("bias"))
                .collect::<Result<Vec<f64>>>()?;

            let layer = Layer::with_params(weights, biases, activation)?;
            network.push_layer(layer)?;
        }

        debug!(
            "loaded network {} -> {} with {} layers",
            network.num_inputs(),
            network.num_outputs(),
            network.layers().len()
        );
        Ok(network)
    }
}
