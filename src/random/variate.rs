//! Логнормальные длительности поверх внедрённого источника

use std::f64::consts::PI;
use tracing::trace;

use super::source::UniformSource;
use crate::config::{DistParams, SimConfig};
use crate::core::Duration;

/// Параметры нормального распределения логарифма
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormal {
    pub mu: f64,
    pub sigma: f64,
}

impl LogNormal {
    /// Подбор μ и σ по среднему и стандартному отклонению
    pub fn from_moments(mean: f64, std: f64) -> Self {
        let cv = std / mean;
        let spread = 1.0 + cv * cv;
        Self {
            mu: (mean / spread.sqrt()).ln(),
            sigma: spread.ln().sqrt(),
        }
    }

    pub fn at(&self, z: f64) -> f64 {
        (self.mu + self.sigma * z).exp()
    }
}

/// Стандартное нормальное отклонение по Боксу–Мюллеру
fn standard_normal(source: &mut dyn UniformSource) -> f64 {
    // 1 - u лежит в (0, 1], логарифм конечен
    let u1 = 1.0 - source.next_uniform();
    let u2 = source.next_uniform();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

pub struct VariateGenerator {
    source: Box<dyn UniformSource>,
    arrival: DistParams,
    service: DistParams,
    floor: f64,
}

impl VariateGenerator {
    pub fn new(
        source: Box<dyn UniformSource>,
        arrival: DistParams,
        service: DistParams,
        floor: f64,
    ) -> Self {
        Self {
            source,
            arrival,
            service,
            floor,
        }
    }

    pub fn from_config(config: &SimConfig, source: Box<dyn UniformSource>) -> Self {
        Self::new(source, config.arrival, config.service, config.min_duration)
    }

    /// Положительная выборка, не меньше нижней границы
    pub fn sample(&mut self, mean: f64, std: f64) -> f64 {
        if !(mean.is_finite() && mean > 0.0) {
            return self.floor;
        }
        let z = standard_normal(self.source.as_mut());
        let value = LogNormal::from_moments(mean, std.max(0.0)).at(z);
        if value.is_finite() {
            value.max(self.floor)
        } else {
            self.floor
        }
    }

    pub fn next_inter_arrival(&mut self) -> Duration {
        let DistParams { mean, std } = self.arrival;
        let gap = self.sample(mean, std);
        trace!("Интервал до прибытия: {:.3}", gap);
        Duration::from_seconds(gap)
    }

    pub fn next_service_time(&mut self) -> Duration {
        let DistParams { mean, std } = self.service;
        let service = self.sample(mean, std);
        trace!("Длительность обслуживания: {:.3}", service);
        Duration::from_seconds(service)
    }

    pub fn arrival(&self) -> DistParams {
        self.arrival
    }

    pub fn service(&self) -> DistParams {
        self.service
    }
}

impl std::fmt::Debug for VariateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariateGenerator")
            .field("arrival", &self.arrival)
            .field("service", &self.service)
            .field("floor", &self.floor)
            .finish_non_exhaustive()
    }
}
