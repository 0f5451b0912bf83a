use ggc_sim::logging::init_logging;
use ggc_sim::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализируем логирование
    init_logging("info");

    println!("🏦 Симуляция банка (G/G/c)");
    println!("==========================\n");

    // Конфигурация из файла (RON или JSON), если передан путь
    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_file(&path)?,
        None => SimConfig {
            servers: 3,
            seed: Some(2024),
            ..SimConfig::default()
        },
    };
    let duration = std::env::args()
        .nth(2)
        .map(|s| s.parse::<f64>())
        .transpose()?
        .unwrap_or(8.0 * 3600.0);

    let sim = Simulator::new(config)?;
    {
        let ctl = sim.controller();
        let ctl = ctl.lock().await;
        println!(
            "Оценка времени на 100 клиентов: {}",
            SimTime::new(ctl.estimated_time(100)).minutes_display()
        );
    }

    let summary = sim.run_headless(duration).await?;

    let snapshot = sim.controller().lock().await.snapshot();
    println!("\n📊 Снимок состояния:");
    println!("{}", snapshot.to_json()?);

    println!("\n🧾 Итог:");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
