//! Очередь ожидания (FIFO)

use std::collections::VecDeque;

use super::Client;
use crate::core::Duration;

#[derive(Debug, Clone, Default)]
pub struct WaitQueue {
    clients: VecDeque<Client>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ставит клиента в хвост; возвращает новую длину
    pub fn push(&mut self, client: Client) -> usize {
        self.clients.push_back(client);
        self.clients.len()
    }

    pub fn pop(&mut self) -> Option<Client> {
        self.clients.pop_front()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    /// Сумма заранее вытянутых длительностей обслуживания
    pub fn pending_work(&self) -> Duration {
        self.clients
            .iter()
            .fold(Duration::ZERO, |acc, c| acc + c.service_time)
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }
}
