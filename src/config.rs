//! Конфигурация модели

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::SimError;

/// Допустимый диапазон множителя скорости
pub const SPEED_RANGE: std::ops::RangeInclusive<f64> = 0.5..=5.0;

/// Параметры логнормального распределения (в модельных секундах)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistParams {
    pub mean: f64,
    pub std: f64,
}

impl DistParams {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    fn validate(&self, name: &str) -> Result<(), SimError> {
        if !(self.mean.is_finite() && self.mean > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "{}.mean must be positive, got {}",
                name, self.mean
            )));
        }
        if !(self.std.is_finite() && self.std >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "{}.std must be non-negative, got {}",
                name, self.std
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Интервалы между прибытиями
    pub arrival: DistParams,
    /// Длительность обслуживания
    pub service: DistParams,
    /// Нижняя граница любой вытянутой длительности
    pub min_duration: f64,
    pub speed: f64,
    /// Сколько завершённых клиентов хранить для средних
    pub history_capacity: usize,
    /// Начальное число серверов
    pub servers: usize,
    /// Без seed генератор инициализируется из энтропии
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arrival: DistParams::new(98.6, 127.02),
            service: DistParams::new(91.64, 43.76),
            min_duration: 0.5,
            speed: 1.0,
            history_capacity: 10_000,
            servers: 1,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_ron_str(s: &str) -> Result<Self, SimError> {
        let config: SimConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Формат выбирается по расширению: `.json` или RON для всего остального
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_ron_str(&content),
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.arrival.validate("arrival")?;
        self.service.validate("service")?;
        if !(self.min_duration.is_finite() && self.min_duration > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "min_duration must be positive, got {}",
                self.min_duration
            )));
        }
        if !SPEED_RANGE.contains(&self.speed) {
            return Err(SimError::InvalidConfig(format!(
                "speed must be within [0.5, 5], got {}",
                self.speed
            )));
        }
        if self.history_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.servers == 0 {
            return Err(SimError::InvalidConfig(
                "servers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = SimConfig::from_ron_str(
            "(service: (mean: 30.0, std: 5.0), servers: 3, seed: Some(7))",
        )
        .unwrap();
        assert_eq!(config.service, DistParams::new(30.0, 5.0));
        assert_eq!(config.servers, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.arrival, SimConfig::default().arrival);
    }

    #[test]
    fn rejects_out_of_range_speed() {
        let err = SimConfig::from_json_str(r#"{"speed": 9.0}"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_non_positive_mean() {
        let config = SimConfig {
            arrival: DistParams::new(0.0, 1.0),
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_by_extension() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"min_duration": 1.0}}"#).unwrap();
        assert_eq!(SimConfig::from_file(json.path()).unwrap().min_duration, 1.0);

        let mut ron = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        write!(ron, "(history_capacity: 5)").unwrap();
        assert_eq!(SimConfig::from_file(ron.path()).unwrap().history_capacity, 5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimConfig::from_file("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
