//! Raster image normalization.

mod normalizer;

pub use normalizer::{ImageNormalizer, NormalizedImage};
