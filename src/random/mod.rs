//! Генерация случайных длительностей

mod source;
mod variate;

pub use source::{RngSource, SequenceSource, UniformSource};
pub use variate::{LogNormal, VariateGenerator};
