use std::time::Duration;

use ggc_sim::config::SimConfig;
use ggc_sim::core::RunState;
use ggc_sim::notify::NotificationKind;
use ggc_sim::{pacing_delay, Command, SimError, Simulator};
use tokio::sync::mpsc;

fn seeded() -> SimConfig {
    SimConfig {
        seed: Some(5),
        servers: 2,
        ..SimConfig::default()
    }
}

#[test]
fn pacing_follows_speed() {
    assert_eq!(pacing_delay(1.0), Duration::from_millis(100));
    assert_eq!(pacing_delay(2.0), Duration::from_millis(50));
    assert_eq!(pacing_delay(5.0), Duration::from_millis(20));
    assert_eq!(pacing_delay(0.5), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn driver_runs_until_end_time() {
    let sim = Simulator::new(seeded()).unwrap();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (upd_tx, mut upd_rx) = mpsc::unbounded_channel();

    let driver = sim.clone();
    let handle = tokio::spawn(async move { driver.run(cmd_rx, upd_tx).await });

    cmd_tx
        .send(Command::Start { duration_secs: 3_000.0, stop_at_limit: true })
        .unwrap();

    let mut finished = None;
    while let Some(output) = upd_rx.recv().await {
        assert!(output.snapshot.served_count <= output.snapshot.arrived_count);
        if output.snapshot.finished {
            finished = Some(output);
            break;
        }
    }

    let output = finished.expect("driver never finished");
    assert_eq!(
        output.notifications.last().map(|n| n.kind),
        Some(NotificationKind::Finished)
    );
    assert!(output.snapshot.simulated_time.as_seconds() >= 3_000.0);

    cmd_tx.send(Command::Shutdown).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn commands_reach_the_controller() {
    let sim = Simulator::new(seeded()).unwrap();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (upd_tx, mut upd_rx) = mpsc::unbounded_channel();

    let driver = sim.clone();
    let handle = tokio::spawn(async move { driver.run(cmd_rx, upd_tx).await });

    cmd_tx.send(Command::AddServer).unwrap();
    cmd_tx.send(Command::SetSpeed(42.0)).unwrap();

    let output = upd_rx.recv().await.unwrap();
    let kinds: Vec<_> = output.notifications.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::ServerAdded, NotificationKind::Rejected]);
    assert_eq!(output.snapshot.servers.len(), 3);

    cmd_tx.send(Command::Start { duration_secs: 0.0, stop_at_limit: false }).unwrap();
    cmd_tx.send(Command::Pause).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    {
        let ctl = sim.controller();
        assert_eq!(ctl.lock().await.state(), RunState::Paused);
    }

    cmd_tx.send(Command::Reset).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    {
        let ctl = sim.controller();
        let ctl = ctl.lock().await;
        assert_eq!(ctl.state(), RunState::Idle);
        assert_eq!(ctl.pool().len(), 1);
    }

    drop(cmd_tx);
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn driver_fails_when_updates_are_dropped() {
    let sim = Simulator::new(seeded()).unwrap();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (upd_tx, upd_rx) = mpsc::unbounded_channel();
    drop(upd_rx);

    cmd_tx
        .send(Command::Start { duration_secs: 0.0, stop_at_limit: false })
        .unwrap();
    let err = sim.run(cmd_rx, upd_tx).await.unwrap_err();
    assert!(matches!(err, SimError::DriverError(_)));
}

#[tokio::test]
async fn headless_run_returns_summary() {
    let sim = Simulator::new(seeded()).unwrap();
    let summary = sim.run_headless(10_000.0).await.unwrap();
    assert!(summary.arrived > 0);
    assert!(summary.served <= summary.arrived);
    assert!((0.0..=100.0).contains(&summary.rho));

    let stats = sim.get_stats().await;
    assert_eq!(stats["arrived"], summary.arrived);
    assert_eq!(stats["state"], "finished");
}

#[tokio::test]
async fn headless_run_needs_a_bound() {
    let sim = Simulator::new(seeded()).unwrap();
    assert!(sim.run_headless(0.0).await.is_err());
    assert!(sim.run_headless(f64::INFINITY).await.is_err());
}

#[tokio::test]
async fn headless_run_refuses_an_unbounded_run_in_progress() {
    let sim = Simulator::new(seeded()).unwrap();
    sim.controller().lock().await.start(0.0, false);

    let result = tokio::time::timeout(Duration::from_secs(3), sim.run_headless(100.0))
        .await
        .expect("headless run did not return");
    assert!(matches!(result, Err(SimError::DriverError(_))));

    let ctl = sim.controller();
    assert_eq!(ctl.lock().await.state(), RunState::Running);
}

#[tokio::test]
async fn headless_run_keeps_the_bound_of_a_run_in_progress() {
    let sim = Simulator::new(seeded()).unwrap();
    sim.controller().lock().await.start(500.0, true);

    let summary = sim.run_headless(1_000_000.0).await.unwrap();
    let ctl = sim.controller();
    let ctl = ctl.lock().await;
    assert_eq!(ctl.state(), RunState::Finished);
    assert!(ctl.now().as_seconds() < 1_000_000.0);
    assert_eq!(summary, ctl.summary());
}

#[tokio::test(start_paused = true)]
async fn reset_during_sleep_discards_the_pending_batch() {
    let sim = Simulator::new(seeded()).unwrap();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (upd_tx, mut upd_rx) = mpsc::unbounded_channel();

    let driver = sim.clone();
    let handle = tokio::spawn(async move { driver.run(cmd_rx, upd_tx).await });

    cmd_tx
        .send(Command::Start { duration_secs: 0.0, stop_at_limit: false })
        .unwrap();
    let first = upd_rx.recv().await.unwrap();
    assert!(first.snapshot.arrived_count > 0);
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }

    // Сброс и новый старт в обход канала команд, пока драйвер спит
    {
        let ctl = sim.controller();
        let mut ctl = ctl.lock().await;
        ctl.reset();
        ctl.start(0.0, false);
    }

    // Пробуждение со старой эпохой пропускается целиком
    tokio::time::sleep(Duration::from_millis(150)).await;
    {
        let ctl = sim.controller();
        let ctl = ctl.lock().await;
        assert_eq!(ctl.snapshot().arrived_count, 0);
        assert_eq!(ctl.now().as_seconds(), 0.0);
    }
    assert!(upd_rx.try_recv().is_err());

    let next = upd_rx.recv().await.unwrap();
    assert!(next.snapshot.arrived_count > 0);
    assert!(next.snapshot.simulated_time.as_seconds() > 0.0);

    cmd_tx.send(Command::Shutdown).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn steady_commands_do_not_starve_batches() {
    let sim = Simulator::new(seeded()).unwrap();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (upd_tx, mut upd_rx) = mpsc::unbounded_channel();

    let driver = sim.clone();
    let handle = tokio::spawn(async move { driver.run(cmd_rx, upd_tx).await });

    cmd_tx
        .send(Command::Start { duration_secs: 0.0, stop_at_limit: false })
        .unwrap();
    // Команда каждые 50 мс при паузе между пачками 100 мс
    for _ in 0..10 {
        cmd_tx.send(Command::Resume).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let mut batches = 0;
    while upd_rx.try_recv().is_ok() {
        batches += 1;
    }
    assert!(batches >= 3, "only {} batches ran", batches);

    drop(cmd_tx);
    handle.await.unwrap().unwrap();
}
