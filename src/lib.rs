//! Enemy and companion AI for a third-person shooter encounter
//!
//! This crate provides:
//! - A generic state machine with enter/execute/exit hooks and delayed tasks
//! - Melee monsters (idle, patrol, trace, attack, hit, death, link jumps)
//! - An elite monster with a telegraphed charge and dash
//! - Escort drones that scan, approach and fire hit-scan rounds
//! - Grid pathfinding behind a navigation port
//! - Spatial queries with rapier3d, bodies stored in a hecs world

pub mod ai;
pub mod combat;
pub mod core;
pub mod ecs;
pub mod physics;
pub mod sim;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        Drone, DroneState, GridNavigator, Monster, MonsterState, NavigationPort, StateMachine,
        Stateful,
    };
    pub use crate::combat::{Damage, Damageable, Stat};
    pub use crate::core::{AiConfig, AiEvent, ConfigError};
    pub use crate::ecs::{Transform, World};
    pub use crate::physics::{Layer, Physics};
    pub use crate::sim::{GameState, SimContext, Simulation};
    pub use glam::{Quat, Vec2, Vec3};
    pub use hecs::Entity;
}
