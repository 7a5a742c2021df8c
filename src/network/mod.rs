pub mod network;
pub mod persist;

pub use network::{Network, OHLC_INPUTS};
