//! Уведомления для внешних подписчиков (отрисовка, журнал, анимация)

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::{Duration, SimTime};
use crate::resources::{ClientId, RemoveRefusal, ServerId};
use crate::stats::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Arrival,
    Queued,
    ServiceStart,
    ServiceEnd,
    Idle,
    ServerAdded,
    ServerRemoved,
    Rejected,
    Finished,
}

/// Причина отказа в операции
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum Rejection {
    RemoveServer { refusal: RemoveRefusal },
    SpeedOutOfRange { requested: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rejection::RemoveServer { refusal } => write!(f, "сервер не удалён: {}", refusal),
            Rejection::SpeedOutOfRange { requested } => {
                write!(f, "скорость {} вне диапазона [0.5, 5]", requested)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum Payload {
    Arrival { client: ClientId },
    Queued { client: ClientId, queue_length: usize },
    ServiceStart {
        client: ClientId,
        server: ServerId,
        service_time: Duration,
        waited: Duration,
    },
    ServiceEnd {
        client: ClientId,
        server: ServerId,
        service_time: Duration,
    },
    Idle { server: ServerId },
    ServerAdded { server: ServerId },
    ServerRemoved { server: ServerId },
    Rejected(Rejection),
    Finished(Summary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub simulated_time: SimTime,
    pub payload: Payload,
}

impl Notification {
    pub fn new(simulated_time: SimTime, payload: Payload) -> Self {
        let kind = match &payload {
            Payload::Arrival { .. } => NotificationKind::Arrival,
            Payload::Queued { .. } => NotificationKind::Queued,
            Payload::ServiceStart { .. } => NotificationKind::ServiceStart,
            Payload::ServiceEnd { .. } => NotificationKind::ServiceEnd,
            Payload::Idle { .. } => NotificationKind::Idle,
            Payload::ServerAdded { .. } => NotificationKind::ServerAdded,
            Payload::ServerRemoved { .. } => NotificationKind::ServerRemoved,
            Payload::Rejected(_) => NotificationKind::Rejected,
            Payload::Finished(_) => NotificationKind::Finished,
        };
        Self {
            kind,
            simulated_time,
            payload,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] ", self.simulated_time.minutes_display())?;
        match &self.payload {
            Payload::Arrival { client } => write!(f, "клиент {} прибыл", client),
            Payload::Queued { client, queue_length } => {
                write!(f, "клиент {} в очереди (длина: {})", client, queue_length)
            }
            Payload::ServiceStart { client, server, service_time, waited } => write!(
                f,
                "клиент {} обслуживается сервером {} ({}, ждал {})",
                client, server, service_time, waited
            ),
            Payload::ServiceEnd { client, server, .. } => {
                write!(f, "клиент {} покинул сервер {}", client, server)
            }
            Payload::Idle { server } => write!(f, "сервер {} свободен", server),
            Payload::ServerAdded { server } => write!(f, "сервер {} добавлен", server),
            Payload::ServerRemoved { server } => write!(f, "сервер {} удалён", server),
            Payload::Rejected(rejection) => write!(f, "отказ: {}", rejection),
            Payload::Finished(s) => write!(
                f,
                "завершено: прибыло {}, обслужено {}, макс. очередь {}, ср. ожидание {:.2}s, ср. время в системе {:.2}s, загрузка {:.2}%",
                s.arrived, s.served, s.max_queue_length, s.mean_wait, s.mean_system, s.rho
            ),
        }
    }
}
