//! ggc-sim - Дискретно-событийная модель очереди G/G/c на Rust

pub mod core;
pub mod resources;
pub mod random;
pub mod stats;
pub mod notify;
pub mod snapshot;
pub mod config;
pub mod logging;
pub mod error;

mod simulator;
pub use simulator::{pacing_delay, Command, Simulator};
pub use error::SimError;

pub mod prelude {
    pub use crate::config::{DistParams, SimConfig};
    pub use crate::core::{RunState, SimTime, SimulationController};
    pub use crate::notify::{Notification, NotificationKind, Payload};
    pub use crate::snapshot::{Snapshot, TickOutput};
    pub use crate::stats::{Metrics, Summary};
    pub use crate::{Command, Simulator};
    pub use crate::SimError;
}
