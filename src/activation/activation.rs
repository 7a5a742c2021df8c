use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::error::{NetError, Result};

/// Element-wise activation applied after a layer's affine transform.
///
/// The numeric tag of each variant (its position, starting at 0) is what the
/// text model format stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Sigmoid,
    Tanh,
    Linear,
    /// Leaves the affine output untouched, same as `Linear`.
    None,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 5] = [
        ActivationFunction::ReLU,
        ActivationFunction::Sigmoid,
        ActivationFunction::Tanh,
        ActivationFunction::Linear,
        ActivationFunction::None,
    ];

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Linear | ActivationFunction::None => x,
        }
    }

    /// Derivative used by backpropagation.
    ///
    /// `v` is the layer's post-activation output, never the pre-activation
    /// sum: Sigmoid returns `f(v)·(1 − f(v))` and Tanh `1 − tanh(v)²`.
    pub fn derivative(&self, v: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if v > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fv = self.function(v);
                fv * (1.0 - fv)
            }
            ActivationFunction::Tanh => {
                let t = v.tanh();
                1.0 - t * t
            }
            ActivationFunction::Linear | ActivationFunction::None => 1.0,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            ActivationFunction::ReLU => 0,
            ActivationFunction::Sigmoid => 1,
            ActivationFunction::Tanh => 2,
            ActivationFunction::Linear => 3,
            ActivationFunction::None => 4,
        }
    }

    pub fn from_tag(tag: i64) -> Result<ActivationFunction> {
        usize::try_from(tag)
            .ok()
            .and_then(|i| ActivationFunction::ALL.get(i).copied())
            .ok_or_else(|| NetError::Config(format!("unknown activation tag {}", tag)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::ReLU => "ReLU",
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::Tanh => "Tanh",
            ActivationFunction::Linear => "Linear",
            ActivationFunction::None => "None",
        }
    }
}

impl FromStr for ActivationFunction {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        ActivationFunction::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| NetError::Config(format!("unknown activation '{}'", s)))
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
