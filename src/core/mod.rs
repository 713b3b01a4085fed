//! Core module
//!
//! Configuration, the AI event queue and the agent pool

mod config;
mod events;
mod pool;

pub use config::{
    AiConfig, ConfigError, DroneConfig, EliteConfig, GridConfig, MonsterConfig, PropConfig,
    SimulationConfig,
};
pub use events::{AiEvent, EventQueue};
pub use pool::{Pool, PoolIndex, PoolRest};
