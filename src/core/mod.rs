//! Ядро симуляции

mod simulation;
mod event;
mod time;


pub use simulation::{RunState, SimulationController};
pub use event::{next_event, Event, EventKind, Priority};
pub use time::{Clock, SimTime, Duration};
