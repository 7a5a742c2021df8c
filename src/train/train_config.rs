/// Hyperparameters for a training run.
///
/// # Fields
/// - `epochs`: full passes over the examples, in order, no shuffling
/// - `learning_rate`: step size of the momentum update
///
/// The momentum coefficient is fixed (see [`crate::optim::MOMENTUM`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
}

impl TrainConfig {
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        TrainConfig { epochs, learning_rate }
    }
}

impl Default for TrainConfig {
    /// One epoch at learning rate 0.1.
    fn default() -> Self {
        TrainConfig { epochs: 1, learning_rate: 0.1 }
    }
}
