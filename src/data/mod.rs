pub mod bar;
pub mod loader;
pub mod storage;

pub use bar::Bar;
pub use loader::load_bars;
pub use storage::DataStorage;
