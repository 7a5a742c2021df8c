use crate::data::bar::Bar;

/// One `(input, target)` pair fed to [`crate::Network::train`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

impl TrainingExample {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> Self {
        TrainingExample { input, target }
    }

    /// Input `[open, close, high, low]`, target `[close]`.
    pub fn from_bar(bar: &Bar) -> Self {
        TrainingExample {
            input: bar.to_array().to_vec(),
            target: vec![bar.close],
        }
    }

    pub fn from_bars(bars: &[Bar]) -> Vec<Self> {
        bars.iter().map(TrainingExample::from_bar).collect()
    }
}
