//! Асинхронный драйвер: периодически вызывает `tick()` и принимает команды

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{info, debug};
use serde_json::json;

use crate::config::SimConfig;
use crate::core::{RunState, SimulationController};
use crate::snapshot::TickOutput;
use crate::stats::Summary;
use crate::SimError;

/// Команды от хоста (кнопки, ползунки и т.п.)
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start { duration_secs: f64, stop_at_limit: bool },
    Pause,
    Resume,
    TogglePause,
    Reset,
    AddServer,
    RemoveServer,
    SetSpeed(f64),
    Shutdown,
}

/// Пауза между пачками: max(16 мс, 100 мс / скорость)
pub fn pacing_delay(speed: f64) -> std::time::Duration {
    let millis = (100.0 / speed.max(f64::MIN_POSITIVE)).max(16.0);
    std::time::Duration::from_micros((millis * 1000.0).round() as u64)
}

/// Таймер пачек: первый срабатывает через одну паузу, пропуски не догоняются
fn pacer(speed: f64) -> Interval {
    let delay = pacing_delay(speed);
    let mut ticker = interval_at(Instant::now() + delay, delay);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[derive(Clone)]
pub struct Simulator {
    controller: Arc<Mutex<SimulationController>>,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        Ok(Self::from_controller(SimulationController::new(config)?))
    }

    pub fn from_controller(controller: SimulationController) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
        }
    }

    /// Общий доступ к контроллеру (например, для отрисовки)
    pub fn controller(&self) -> Arc<Mutex<SimulationController>> {
        self.controller.clone()
    }

    /// Применяет команду. `false` означает остановку драйвера.
    pub async fn apply(&self, command: Command) -> bool {
        let mut sim = self.controller.lock().await;
        debug!("Команда: {:?}", command);
        match command {
            Command::Start { duration_secs, stop_at_limit } => sim.start(duration_secs, stop_at_limit),
            Command::Pause => sim.pause(),
            Command::Resume => sim.resume(),
            Command::TogglePause => sim.toggle_pause(),
            Command::Reset => sim.reset(),
            Command::AddServer => {
                sim.add_server();
            }
            Command::RemoveServer => {
                sim.remove_server();
            }
            Command::SetSpeed(multiplier) => {
                sim.set_speed(multiplier);
            }
            Command::Shutdown => return false,
        }
        true
    }

    pub async fn tick(&self) -> TickOutput {
        self.controller.lock().await.tick()
    }

    /// Основной цикл: команды между пачками, пачка по таймеру.
    /// Команды не сдвигают таймер; он пересоздаётся только при смене скорости.
    /// Завершается по `Shutdown` или когда закрыт канал команд.
    pub async fn run(
        &self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        updates: mpsc::UnboundedSender<TickOutput>,
    ) -> Result<(), SimError> {
        info!("Драйвер симуляции запущен");

        let mut speed = self.controller.lock().await.speed();
        let mut ticker = pacer(speed);

        loop {
            let epoch = self.controller.lock().await.epoch();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => {
                        self.apply(command).await;
                        let current = self.controller.lock().await.speed();
                        if current != speed {
                            speed = current;
                            ticker = pacer(speed);
                        }
                    }
                },
                _ = ticker.tick() => {
                    let output = {
                        let mut sim = self.controller.lock().await;
                        if sim.epoch() != epoch {
                            debug!("Пропуск устаревшего продолжения (эпоха {} -> {})", epoch, sim.epoch());
                            continue;
                        }
                        sim.tick()
                    };

                    let active = output.snapshot.state == RunState::Running;
                    if active || !output.notifications.is_empty() {
                        updates.send(output).map_err(|_| {
                            SimError::DriverError("updates receiver dropped".to_string())
                        })?;
                    }
                }
            }
        }

        info!("Драйвер симуляции остановлен");
        Ok(())
    }

    /// Прогон без пауз до конца заданного модельного времени
    pub async fn run_headless(&self, duration_secs: f64) -> Result<Summary, SimError> {
        if !(duration_secs.is_finite() && duration_secs > 0.0) {
            return Err(SimError::DriverError(format!(
                "headless run needs a positive duration, got {}",
                duration_secs
            )));
        }

        {
            let mut sim = self.controller.lock().await;
            // Уже идущий прогон `start` не трогает: его граница остаётся прежней
            sim.start(duration_secs, true);
            if sim.clock().end_time().is_none() {
                return Err(SimError::DriverError(
                    "headless run attached to an unbounded run".to_string(),
                ));
            }
        }

        loop {
            let finished = {
                let mut sim = self.controller.lock().await;
                let output = sim.tick();
                match output.snapshot.state {
                    RunState::Finished => true,
                    RunState::Running => false,
                    state => {
                        return Err(SimError::DriverError(format!(
                            "headless run interrupted in state {:?}",
                            state
                        )))
                    }
                }
            };
            if finished {
                break;
            }
            // Даем возможность выполниться другим задачам
            tokio::task::yield_now().await;
        }

        let sim = self.controller.lock().await;
        info!("Прогон завершён в {}", sim.now().minutes_display());
        Ok(sim.summary())
    }

    pub async fn get_stats(&self) -> serde_json::Value {
        let sim = self.controller.lock().await;
        let snapshot = sim.snapshot();

        json!({
            "time": snapshot.simulated_time.as_seconds(),
            "state": snapshot.state,
            "servers": snapshot.servers.len(),
            "busy_servers": snapshot.servers.iter().filter(|s| s.busy).count(),
            "queue_length": snapshot.queue_length,
            "max_queue_length": snapshot.max_queue_length,
            "arrived": snapshot.arrived_count,
            "served": snapshot.served_count,
            "metrics": snapshot.metrics,
            "summary": sim.summary(),
        })
    }
}
