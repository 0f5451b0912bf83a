//! Накопитель статистики и производные метрики

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

use crate::core::Duration;
use crate::resources::ClientId;

/// Завершённое ожидание: клиент прошёл через очередь и начал обслуживание
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletedClient {
    pub id: ClientId,
    pub wait: f64,
    pub system: f64,
}

/// Метрики по закону Литтла
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(rename = "Lq")]
    pub lq: f64,
    #[serde(rename = "Wq")]
    pub wq: f64,
    #[serde(rename = "Ls")]
    pub ls: f64,
    #[serde(rename = "Ws")]
    pub ws: f64,
    /// Загрузка, %
    pub rho: f64,
    /// Доля простоя, %
    pub p0: f64,
}

/// Итог прогона
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub arrived: u64,
    pub served: u64,
    pub max_queue_length: usize,
    pub mean_wait: f64,
    pub mean_system: f64,
    pub rho: f64,
}

#[derive(Debug, Clone)]
pub struct StatisticsAccumulator {
    arrived: u64,
    served: u64,
    max_queue_length: usize,
    busy_time: f64,
    observed_time: f64,
    history: VecDeque<CompletedClient>,
    capacity: usize,
}

/// Ноль в знаменателе заменяется единицей
fn denominator(value: f64) -> f64 {
    if value > 0.0 { value } else { 1.0 }
}

impl StatisticsAccumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            arrived: 0,
            served: 0,
            max_queue_length: 0,
            busy_time: 0.0,
            observed_time: 0.0,
            history: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record_arrival(&mut self) -> ClientId {
        self.arrived += 1;
        self.arrived
    }

    pub fn record_queue_length(&mut self, len: usize) {
        self.max_queue_length = self.max_queue_length.max(len);
    }

    pub fn record_service_end(&mut self, service_time: Duration) {
        self.served += 1;
        self.busy_time += service_time.as_seconds().max(0.0);
    }

    pub fn record_completed(&mut self, record: CompletedClient) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn observe_until(&mut self, now: f64) {
        self.observed_time = now;
    }

    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    pub fn served(&self) -> u64 {
        self.served
    }

    pub fn max_queue_length(&self) -> usize {
        self.max_queue_length
    }

    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    pub fn observed_time(&self) -> f64 {
        self.observed_time
    }

    pub fn history(&self) -> impl Iterator<Item = &CompletedClient> {
        self.history.iter()
    }

    pub fn mean_wait(&self) -> f64 {
        let total: f64 = self.history.iter().map(|c| c.wait).sum();
        total / denominator(self.history.len() as f64)
    }

    pub fn mean_system(&self) -> f64 {
        let total: f64 = self.history.iter().map(|c| c.system).sum();
        total / denominator(self.history.len() as f64)
    }

    /// Загрузка в процентах, в пределах [0, 100]
    pub fn utilization(&self) -> f64 {
        let rho = 100.0 * self.busy_time / denominator(self.observed_time);
        if rho.is_finite() { rho.clamp(0.0, 100.0) } else { 0.0 }
    }

    pub fn metrics(&self, busy_servers: usize) -> Metrics {
        let arrived = self.arrived as f64;
        let observed = denominator(self.observed_time);
        let wq = self.mean_wait();
        let ws = self.mean_system();
        let rho = self.utilization();
        Metrics {
            lq: wq * arrived / observed,
            wq,
            ls: ws * arrived / observed + busy_servers as f64,
            ws,
            rho,
            p0: (100.0 - rho).max(0.0),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            arrived: self.arrived,
            served: self.served,
            max_queue_length: self.max_queue_length,
            mean_wait: self.mean_wait(),
            mean_system: self.mean_system(),
            rho: self.utilization(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(id: ClientId, wait: f64, system: f64) -> CompletedClient {
        CompletedClient { id, wait, system }
    }

    #[test]
    fn empty_accumulator_has_zero_metrics() {
        let stats = StatisticsAccumulator::new(10);
        let m = stats.metrics(0);
        assert_eq!(m, Metrics { p0: 100.0, ..Metrics::default() });
    }

    #[test]
    fn littles_law_estimates() {
        let mut stats = StatisticsAccumulator::new(10);
        for _ in 0..4 {
            stats.record_arrival();
        }
        stats.record_completed(done(1, 2.0, 6.0));
        stats.record_completed(done(2, 4.0, 10.0));
        stats.record_service_end(Duration::from_seconds(20.0));
        stats.observe_until(40.0);

        let m = stats.metrics(1);
        assert_eq!(m.wq, 3.0);
        assert_eq!(m.ws, 8.0);
        assert_eq!(m.lq, 3.0 * 4.0 / 40.0);
        assert_eq!(m.ls, 8.0 * 4.0 / 40.0 + 1.0);
        assert_eq!(m.rho, 50.0);
        assert_eq!(m.p0, 50.0);
    }

    #[test]
    fn utilization_is_clamped_for_parallel_servers() {
        let mut stats = StatisticsAccumulator::new(10);
        stats.record_service_end(Duration::from_seconds(30.0));
        stats.record_service_end(Duration::from_seconds(30.0));
        stats.observe_until(40.0);
        let m = stats.metrics(0);
        assert_eq!(m.rho, 100.0);
        assert_eq!(m.p0, 0.0);
    }

    #[test]
    fn history_is_bounded() {
        let mut stats = StatisticsAccumulator::new(2);
        stats.record_completed(done(1, 100.0, 100.0));
        stats.record_completed(done(2, 1.0, 2.0));
        stats.record_completed(done(3, 3.0, 4.0));
        let ids: Vec<_> = stats.history().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(stats.mean_wait(), 2.0);
    }

    #[test]
    fn max_queue_length_only_grows() {
        let mut stats = StatisticsAccumulator::new(1);
        stats.record_queue_length(3);
        stats.record_queue_length(1);
        assert_eq!(stats.max_queue_length(), 3);
    }

    #[test]
    fn metrics_use_queueing_notation_in_json() {
        let m = Metrics { lq: 0.5, wq: 3.0, ls: 1.5, ws: 8.0, rho: 50.0, p0: 50.0 };
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["Lq"], 0.5);
        assert_eq!(json["Wq"], 3.0);
        assert_eq!(json["Ls"], 1.5);
        assert_eq!(json["Ws"], 8.0);
        assert_eq!(json["rho"], 50.0);
        assert!(json.get("lq").is_none());
    }
}
