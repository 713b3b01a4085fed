//! Simulation module
//!
//! The context agents tick against, and the encounter that owns them.

mod context;
mod simulation;
#[cfg(test)]
pub(crate) mod testing;

pub use context::{GameState, SimContext};
pub use simulation::Simulation;
