//! Типы ошибок для симуляции

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON config error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Driver error: {0}")]
    DriverError(String),
}
