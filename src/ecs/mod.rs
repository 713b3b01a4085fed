//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod world;

pub use components::{Body, BodyKind, Cover, Explosive, Impact, Name, Transform, Vitals};
pub use world::World;
