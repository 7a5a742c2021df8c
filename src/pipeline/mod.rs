pub mod pipeline;

pub use pipeline::{create_input_vector, Mode, Pipeline};
