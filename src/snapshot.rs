//! Снимок состояния после `tick()`

use serde::{Serialize, Deserialize};

use crate::core::{RunState, SimTime};
use crate::notify::Notification;
use crate::resources::{ClientId, ServerId};
use crate::stats::Metrics;
use crate::SimError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerView {
    pub id: ServerId,
    pub busy: bool,
    pub client_id: Option<ClientId>,
    pub remaining_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub simulated_time: SimTime,
    pub state: RunState,
    pub queue_length: usize,
    pub max_queue_length: usize,
    pub servers: Vec<ServerView>,
    pub arrived_count: u64,
    pub served_count: u64,
    pub metrics: Metrics,
    pub finished: bool,
    /// Оценка времени до опустошения очереди
    pub time_to_clear_queue: f64,
    /// Реальное время с момента `start()`; только для информации
    pub real_elapsed_secs: f64,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Результат одного `tick()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    pub snapshot: Snapshot,
    pub notifications: Vec<Notification>,
}
