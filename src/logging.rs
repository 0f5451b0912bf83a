//! Настройка журналирования через `tracing-subscriber`
//!
//! Уровень задаётся аргументом, `RUST_LOG` имеет приоритет:
//! ```bash
//! RUST_LOG=ggc_sim=debug cargo run --example bank_queue
//! ```

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Повторная инициализация безвредна: второй подписчик просто не ставится
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Журналирование включено, уровень: {}", level);
    }
}
