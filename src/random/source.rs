//! Источники равномерных чисел на [0, 1)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Внедряемый источник равномерных чисел
pub trait UniformSource: Send {
    /// Значение из [0, 1)
    fn next_uniform(&mut self) -> f64;
}

/// Обёртка над любым генератором из `rand`
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl RngSource<StdRng> {
    /// Воспроизводимая последовательность
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Циклически отдаёт заданные значения. Для тестов и повторов.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    pos: usize,
}

impl SequenceSource {
    /// Значения вне [0, 1) прижимаются к границам
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() { vec![0.5] } else { values };
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0 - f64::EPSILON) } else { 0.5 })
            .collect();
        Self { values, pos: 0 }
    }
}

impl UniformSource for SequenceSource {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.pos % self.values.len()];
        self.pos = self.pos.wrapping_add(1);
        value
    }
}
