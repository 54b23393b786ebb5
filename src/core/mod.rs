//! Core simulation module
//!
//! Scenes, the fixed-step clock, configuration and the event queue

mod config;
mod events;
mod scene;
mod time;

pub use config::{ConfigError, SimConfig};
pub use events::{EventQueue, GameEvent};
pub use scene::Scene;
pub use time::Time;
