//! Ресурсы симуляции: пул кассиров и очередь ожидания

mod queue;
mod server;

pub use queue::WaitQueue;
pub use server::{Assignment, RemoveRefusal, Server, ServerId, ServerPool};

use serde::{Serialize, Deserialize};

use crate::core::{Duration, SimTime};

/// Порядковый номер клиента (с 1)
pub type ClientId = u64;

/// Клиент, который ещё не обслужен
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub arrived_at: SimTime,
    /// Вытягивается один раз при входе в систему
    pub service_time: Duration,
}

impl Client {
    pub fn new(id: ClientId, arrived_at: SimTime, service_time: Duration) -> Self {
        Self {
            id,
            arrived_at,
            service_time,
        }
    }
}
