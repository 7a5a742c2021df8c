pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod loss;
pub mod optim;
pub mod train;
pub mod network;
pub mod data;
pub mod normalization;
pub mod pipeline;
pub mod context;

// Convenience re-exports
pub use error::{NetError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use loss::mse::MseLoss;
pub use train::{example::TrainingExample, train_config::TrainConfig};
pub use network::network::Network;
pub use data::{bar::Bar, loader::load_bars, storage::DataStorage};
pub use normalization::normalizer::{NormalizationKind, NormalizationState, Normalizer};
pub use pipeline::pipeline::{Mode, Pipeline};
pub use context::context::ModelContext;
