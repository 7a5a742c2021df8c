pub mod context;
pub mod model_file;

pub use context::{ModelContext, DEFAULT_MODEL_VERSION};
pub use model_file::{load_model_file, read_model, save_model_file, write_model, ModelFile};
