//! Пул серверов со стабильными идентификаторами

use std::collections::HashMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use super::ClientId;
use crate::core::{Duration, SimTime};

/// Стабильный номер сервера, переживает изменение размера пула
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub u32);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Текущее обслуживание на сервере
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub client: ClientId,
    pub started_at: SimTime,
    pub completes_at: SimTime,
}

impl Assignment {
    pub fn service_time(&self) -> Duration {
        self.completes_at.since(self.started_at)
    }
}

/// Сервер: либо свободен, либо занят конкретным клиентом
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    id: ServerId,
    assignment: Option<Assignment>,
}

impl Server {
    fn new(id: ServerId) -> Self {
        Self { id, assignment: None }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.assignment.is_some()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn client(&self) -> Option<ClientId> {
        self.assignment.map(|a| a.client)
    }

    pub fn completes_at(&self) -> Option<SimTime> {
        self.assignment.map(|a| a.completes_at)
    }

    /// Остаток обслуживания относительно `now`
    pub fn remaining(&self, now: SimTime) -> Option<Duration> {
        self.assignment.map(|a| a.completes_at.since(now))
    }
}

/// Почему сервер не удалён
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveRefusal {
    /// В пуле остался один сервер
    LastServer,
    /// Все серверы заняты
    AllBusy,
}

impl fmt::Display for RemoveRefusal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RemoveRefusal::LastServer => write!(f, "нельзя удалить последний сервер"),
            RemoveRefusal::AllBusy => write!(f, "все серверы заняты"),
        }
    }
}

/// Арена серверов. Порядок в `servers` совпадает с порядком id.
#[derive(Debug, Clone)]
pub struct ServerPool {
    servers: Vec<Server>,
    slots: HashMap<ServerId, usize>,
    next_id: u32,
}

impl ServerPool {
    /// Пул из одного свободного сервера с id 1
    pub fn new() -> Self {
        Self::with_servers(1)
    }

    pub fn with_servers(count: usize) -> Self {
        let mut pool = Self {
            servers: Vec::new(),
            slots: HashMap::new(),
            next_id: 1,
        };
        for _ in 0..count.max(1) {
            pool.add();
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn busy_count(&self) -> usize {
        self.servers.iter().filter(|s| s.is_busy()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Server> {
        self.servers.iter()
    }

    pub fn get(&self, id: ServerId) -> Option<&Server> {
        self.slots.get(&id).map(|&slot| &self.servers[slot])
    }

    fn get_mut(&mut self, id: ServerId) -> Option<&mut Server> {
        match self.slots.get(&id) {
            Some(&slot) => self.servers.get_mut(slot),
            None => None,
        }
    }

    /// Добавляет свободный сервер со свежим id
    pub fn add(&mut self) -> ServerId {
        let id = ServerId(self.next_id);
        self.next_id += 1;
        self.slots.insert(id, self.servers.len());
        self.servers.push(Server::new(id));
        debug!("Добавлен сервер {}", id);
        id
    }

    /// Удаляет последний добавленный свободный сервер
    pub fn remove_idle(&mut self) -> Result<ServerId, RemoveRefusal> {
        if self.servers.len() <= 1 {
            return Err(RemoveRefusal::LastServer);
        }

        let slot = self
            .servers
            .iter()
            .rposition(|s| !s.is_busy())
            .ok_or(RemoveRefusal::AllBusy)?;

        let removed = self.servers.remove(slot);
        self.rebuild_slots();
        debug!("Удалён сервер {}", removed.id);
        Ok(removed.id)
    }

    fn rebuild_slots(&mut self) {
        self.slots = self
            .servers
            .iter()
            .enumerate()
            .map(|(slot, s)| (s.id, slot))
            .collect();
    }

    /// Первый свободный сервер в порядке id
    pub fn first_idle(&self) -> Option<ServerId> {
        self.servers.iter().find(|s| !s.is_busy()).map(|s| s.id)
    }

    /// Завершения обслуживания занятых серверов в порядке id
    pub fn completions(&self) -> impl Iterator<Item = (ServerId, SimTime)> + '_ {
        self.servers
            .iter()
            .filter_map(|s| s.completes_at().map(|t| (s.id, t)))
    }

    /// Ставит клиента на сервер. Возвращает `false`, если сервера нет.
    pub fn assign(
        &mut self,
        id: ServerId,
        client: ClientId,
        now: SimTime,
        service_time: Duration,
    ) -> bool {
        match self.get_mut(id) {
            Some(server) => {
                server.assignment = Some(Assignment {
                    client,
                    started_at: now,
                    completes_at: now + service_time,
                });
                true
            }
            None => false,
        }
    }

    /// Освобождает сервер, возвращая завершённое обслуживание
    pub fn release(&mut self, id: ServerId) -> Option<Assignment> {
        self.get_mut(id).and_then(|s| s.assignment.take())
    }

    /// Суммарный остаток обслуживания на занятых серверах
    pub fn remaining_work(&self, now: SimTime) -> Duration {
        self.servers
            .iter()
            .filter_map(|s| s.remaining(now))
            .fold(Duration::ZERO, |acc, d| acc + d)
    }
}

impl Default for ServerPool {
    fn default() -> Self {
        Self::new()
    }
}
