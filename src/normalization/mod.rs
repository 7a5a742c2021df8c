pub mod normalizer;

pub use normalizer::{NormalizationKind, NormalizationState, Normalizer};
