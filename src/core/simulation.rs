//! Контроллер G/G/c: часы, цикл событий, снимки и уведомления

use std::time::Instant;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use super::event::{next_event, EventKind};
use super::time::{Clock, Duration, SimTime};
use crate::config::{SimConfig, SPEED_RANGE};
use crate::notify::{Notification, Payload, Rejection};
use crate::random::{RngSource, UniformSource, VariateGenerator};
use crate::resources::{Client, ServerId, ServerPool, WaitQueue};
use crate::snapshot::{ServerView, Snapshot, TickOutput};
use crate::stats::{CompletedClient, Metrics, StatisticsAccumulator, Summary};
use crate::SimError;

/// Событий за один `tick()` при скорости 1x
const EVENTS_PER_SPEED_UNIT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Владеет всем состоянием одного прогона
#[derive(Debug)]
pub struct SimulationController {
    config: SimConfig,
    variates: VariateGenerator,
    clock: Clock,
    pool: ServerPool,
    queue: WaitQueue,
    stats: StatisticsAccumulator,
    state: RunState,
    speed: f64,
    epoch: u64,
    pending: Vec<Notification>,
    frozen_metrics: Option<Metrics>,
    started_at: Option<Instant>,
    frozen_elapsed: Option<f64>,
}

impl SimulationController {
    /// Источник случайности берётся из `config.seed` или из энтропии
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let source: Box<dyn UniformSource> = match config.seed {
            Some(seed) => Box::new(RngSource::seeded(seed)),
            None => Box::new(RngSource::from_entropy()),
        };
        Self::with_source(config, source)
    }

    pub fn with_source(config: SimConfig, source: Box<dyn UniformSource>) -> Result<Self, SimError> {
        config.validate()?;

        let mut variates = VariateGenerator::from_config(&config, source);
        let clock = Clock::new(variates.next_inter_arrival());

        Ok(Self {
            pool: ServerPool::with_servers(config.servers),
            queue: WaitQueue::new(),
            stats: StatisticsAccumulator::new(config.history_capacity),
            speed: config.speed,
            state: RunState::Idle,
            epoch: 0,
            pending: Vec::new(),
            frozen_metrics: None,
            started_at: None,
            frozen_elapsed: None,
            config,
            variates,
            clock,
        })
    }

    // ============ Управление ============

    pub fn start(&mut self, duration_secs: f64, stop_at_limit: bool) {
        if self.state == RunState::Running {
            return;
        }

        let duration = if duration_secs.is_finite() { duration_secs.max(0.0) } else { 0.0 };
        let end = if stop_at_limit && duration > 0.0 {
            Some(self.clock.now() + Duration::from_seconds(duration))
        } else {
            None
        };
        self.clock.set_end_time(end);

        self.frozen_metrics = None;
        self.frozen_elapsed = None;
        self.started_at = Some(Instant::now());
        self.state = RunState::Running;

        match end {
            Some(end) => info!(
                "Симуляция запущена до {} (скорость {}x)",
                end.minutes_display(),
                self.speed
            ),
            None => info!("Симуляция запущена без ограничения (скорость {}x)", self.speed),
        }
    }

    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
            info!("Симуляция приостановлена в {}", self.clock.now());
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            info!("Симуляция возобновлена в {}", self.clock.now());
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Idle | RunState::Finished => {}
        }
    }

    /// Сбрасывает прогон; продолжения со старой эпохой становятся устаревшими.
    /// Пул всегда возвращается к одному свободному серверу #1.
    pub fn reset(&mut self) {
        self.pool = ServerPool::new();
        self.queue.clear();
        self.stats = StatisticsAccumulator::new(self.config.history_capacity);
        self.clock = Clock::new(self.variates.next_inter_arrival());
        self.pending.clear();
        self.frozen_metrics = None;
        self.started_at = None;
        self.frozen_elapsed = None;
        self.state = RunState::Idle;
        self.epoch += 1;
        info!("Система сброшена (эпоха {})", self.epoch);
    }

    /// Принимает скорость из [0.5, 5]; иначе оставляет прежнюю
    pub fn set_speed(&mut self, multiplier: f64) -> bool {
        if SPEED_RANGE.contains(&multiplier) {
            self.speed = multiplier;
            info!("Скорость установлена: {}x", multiplier);
            true
        } else {
            warn!("Скорость {} вне диапазона, остаётся {}x", multiplier, self.speed);
            self.emit(Payload::Rejected(Rejection::SpeedOutOfRange { requested: multiplier }));
            false
        }
    }

    pub fn add_server(&mut self) -> ServerId {
        let id = self.pool.add();
        info!("Добавлен сервер {} (всего {})", id, self.pool.len());
        self.emit(Payload::ServerAdded { server: id });
        id
    }

    pub fn remove_server(&mut self) -> Option<ServerId> {
        match self.pool.remove_idle() {
            Ok(id) => {
                info!("Удалён сервер {} (всего {})", id, self.pool.len());
                self.emit(Payload::ServerRemoved { server: id });
                Some(id)
            }
            Err(refusal) => {
                warn!("Сервер не удалён: {}", refusal);
                self.emit(Payload::Rejected(Rejection::RemoveServer { refusal }));
                None
            }
        }
    }

    // ============ Цикл событий ============

    pub fn batch_size(&self) -> usize {
        ((self.speed * EVENTS_PER_SPEED_UNIT).floor() as usize).max(1)
    }

    /// Обрабатывает пачку событий и отдаёт снимок с новыми уведомлениями
    pub fn tick(&mut self) -> TickOutput {
        self.run_batch(self.batch_size())
    }

    /// Ровно одно событие по тем же правилам, что и `tick()`
    pub fn step(&mut self) -> TickOutput {
        self.run_batch(1)
    }

    fn run_batch(&mut self, events: usize) -> TickOutput {
        if self.state == RunState::Running {
            for _ in 0..events {
                if self.state != RunState::Running {
                    break;
                }
                self.process_next_event();
                if self.clock.reached_end() {
                    self.finish();
                    break;
                }
            }
        }

        TickOutput {
            snapshot: self.snapshot(),
            notifications: std::mem::take(&mut self.pending),
        }
    }

    fn process_next_event(&mut self) {
        let event = next_event(self.clock.next_arrival(), self.pool.completions());
        self.clock.advance_to(event.time);

        match event.kind {
            EventKind::Arrival => self.handle_arrival(),
            EventKind::Departure(server) => self.handle_departure(server),
        }
    }

    fn handle_arrival(&mut self) {
        let now = self.clock.now();
        let client = self.stats.record_arrival();
        let service_time = self.variates.next_service_time();

        debug!("Прибытие клиента {} в {}", client, now.minutes_display());
        self.emit(Payload::Arrival { client });

        match self.pool.first_idle() {
            Some(server) => {
                self.pool.assign(server, client, now, service_time);
                debug!("Клиент {} начинает обслуживание на {} ({})", client, server, service_time);
                self.emit(Payload::ServiceStart {
                    client,
                    server,
                    service_time,
                    waited: Duration::ZERO,
                });
            }
            None => {
                let queue_length = self.queue.push(Client::new(client, now, service_time));
                self.stats.record_queue_length(queue_length);
                debug!("Клиент {} встал в очередь (длина {})", client, queue_length);
                self.emit(Payload::Queued { client, queue_length });
            }
        }

        let gap = self.variates.next_inter_arrival();
        self.clock.schedule_arrival(gap);
    }

    fn handle_departure(&mut self, server: ServerId) {
        let now = self.clock.now();
        let Some(done) = self.pool.release(server) else {
            warn!("Окончание обслуживания на неизвестном сервере {}", server);
            return;
        };

        let service_time = done.service_time();
        self.stats.record_service_end(service_time);
        debug!("Клиент {} закончил обслуживание на {}", done.client, server);
        self.emit(Payload::ServiceEnd {
            client: done.client,
            server,
            service_time,
        });

        match self.queue.pop() {
            Some(next) => {
                let waited = now.since(next.arrived_at);
                self.stats.record_completed(CompletedClient {
                    id: next.id,
                    wait: waited.as_seconds(),
                    system: (waited + next.service_time).as_seconds(),
                });
                self.pool.assign(server, next.id, now, next.service_time);
                debug!("Клиент {} из очереди на {} (ждал {})", next.id, server, waited);
                self.emit(Payload::ServiceStart {
                    client: next.id,
                    server,
                    service_time: next.service_time,
                    waited,
                });
            }
            None => {
                debug!("Сервер {} простаивает", server);
                self.emit(Payload::Idle { server });
            }
        }

        self.stats.observe_until(now.as_seconds());
    }

    fn finish(&mut self) {
        self.state = RunState::Finished;
        self.frozen_metrics = Some(self.stats.metrics(self.pool.busy_count()));
        self.frozen_elapsed = Some(self.real_elapsed_secs());

        let summary = self.stats.summary();
        info!(
            "Время симуляции истекло в {}: прибыло {}, обслужено {}, макс. очередь {}, загрузка {:.2}%",
            self.clock.now().minutes_display(),
            summary.arrived,
            summary.served,
            summary.max_queue_length,
            summary.rho
        );
        self.emit(Payload::Finished(summary));
    }

    fn emit(&mut self, payload: Payload) {
        self.pending.push(Notification::new(self.clock.now(), payload));
    }

    // ============ Наблюдение ============

    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        Snapshot {
            simulated_time: now,
            state: self.state,
            queue_length: self.queue.len(),
            max_queue_length: self.stats.max_queue_length(),
            servers: self
                .pool
                .iter()
                .map(|s| ServerView {
                    id: s.id(),
                    busy: s.is_busy(),
                    client_id: s.client(),
                    remaining_time: s.remaining(now).map(|d| d.as_seconds()),
                })
                .collect(),
            arrived_count: self.stats.arrived(),
            served_count: self.stats.served(),
            metrics: self.metrics(),
            finished: self.state == RunState::Finished,
            time_to_clear_queue: self.time_to_clear_queue(),
            real_elapsed_secs: self.real_elapsed_secs(),
        }
    }

    /// После завершения возвращает метрики момента завершения
    pub fn metrics(&self) -> Metrics {
        self.frozen_metrics
            .unwrap_or_else(|| self.stats.metrics(self.pool.busy_count()))
    }

    pub fn summary(&self) -> Summary {
        self.stats.summary()
    }

    /// Грубая оценка модельного времени на `target_clients` клиентов
    pub fn estimated_time(&self, target_clients: u64) -> f64 {
        let per_client = self.variates.arrival().mean + self.variates.service().mean;
        target_clients as f64 * per_client / self.speed
    }

    /// Оставшаяся работа (на серверах и в очереди), делённая на число серверов
    pub fn time_to_clear_queue(&self) -> f64 {
        let now = self.clock.now();
        let work = self.pool.remaining_work(now) + self.queue.pending_work();
        work.as_seconds() / self.pool.len().max(1) as f64
    }

    pub fn real_elapsed_secs(&self) -> f64 {
        if let Some(frozen) = self.frozen_elapsed {
            return frozen;
        }
        self.started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    pub fn queue(&self) -> &WaitQueue {
        &self.queue
    }

    pub fn stats(&self) -> &StatisticsAccumulator {
        &self.stats
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
