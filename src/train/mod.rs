pub mod example;
pub mod train_config;

pub use example::TrainingExample;
pub use train_config::TrainConfig;
